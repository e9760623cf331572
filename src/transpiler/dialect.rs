use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForgeError;
use crate::transpiler::option::ProviderOption;
use crate::transpiler::sql::{MysqlProvider, OracleProvider, SqlServerProvider};
use crate::transpiler::traits::SqlProvider;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    #[serde(alias = "mssql")]
    SqlServer,
    Oracle,
}

impl Dialect {
    /// A fresh provider for one statement.
    pub fn provider(&self) -> Box<dyn SqlProvider> {
        match self {
            Dialect::MySql => Box::new(MysqlProvider::new()),
            Dialect::SqlServer => Box::new(SqlServerProvider::new()),
            Dialect::Oracle => Box::new(OracleProvider::new()),
        }
    }

    pub fn option(&self) -> ProviderOption {
        *self.provider().resolver().option()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Oracle => write!(f, "oracle"),
        }
    }
}

impl FromStr for Dialect {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            other => Err(ForgeError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}
