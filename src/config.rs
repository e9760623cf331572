//! Configuration loaded from `sqlforge.toml`.
//!
//! Lookup order: `./sqlforge.toml`, then `<config_dir>/sqlforge/config.toml`,
//! then defaults. `SQLFORGE_DATABASE_URL` overrides `database_url`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ForgeError, ForgeResult};
use crate::transpiler::{Dialect, SqlProvider};

pub const CONFIG_FILE: &str = "sqlforge.toml";
pub const DATABASE_URL_ENV: &str = "SQLFORGE_DATABASE_URL";

/// ```toml
/// dialect = "sqlserver"
/// database_url = "mysql://root@localhost/app"
/// no_lock = true
/// log_sql = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub dialect: Dialect,
    pub database_url: Option<String>,
    /// Add `WITH(NOLOCK)` to SQL Server reads by default
    pub no_lock: bool,
    /// Log every executed statement at info level
    pub log_sql: bool,
}

impl ForgeConfig {
    /// Load from the first config file found, falling back to defaults.
    pub fn load() -> ForgeResult<Self> {
        let mut config = match Self::locate() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.database_url = Some(url);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ForgeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Loading config from {}", path.display());
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ForgeResult<Self> {
        Ok(toml::from_str(content)?)
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("sqlforge").join("config.toml"))
            .filter(|p| p.is_file())
    }

    /// Provider for the configured dialect.
    pub fn provider(&self) -> Box<dyn SqlProvider> {
        self.dialect.provider()
    }

    pub fn database_url(&self) -> ForgeResult<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ForgeError::Config(format!("database_url is not set (or set {})", DATABASE_URL_ENV)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ForgeConfig::parse(
            r#"
            dialect = "mssql"
            database_url = "mysql://root@localhost/app"
            no_lock = true
            log_sql = true
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::SqlServer);
        assert_eq!(config.database_url().unwrap(), "mysql://root@localhost/app");
        assert!(config.no_lock);
        assert!(config.log_sql);
        assert_eq!(config.provider().dialect(), Dialect::SqlServer);
    }

    #[test]
    fn test_missing_fields_default() {
        let config = ForgeConfig::parse("dialect = \"oracle\"").unwrap();
        assert_eq!(config.dialect, Dialect::Oracle);
        assert!(!config.no_lock);
        assert!(config.database_url().is_err());
    }

    #[test]
    fn test_unknown_dialect_is_config_error() {
        let err = ForgeConfig::parse("dialect = \"sqlite\"").unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }
}
