//! Dialect resolvers and providers.

pub mod mysql;
pub mod oracle;
pub mod sqlserver;

pub use mysql::{MysqlProvider, MysqlResolver};
pub use oracle::{OracleProvider, OracleResolver};
pub use sqlserver::{SqlServerProvider, SqlServerResolver};
