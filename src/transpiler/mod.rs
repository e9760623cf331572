//! Expression tree → dialect SQL.
//!
//! [`SqlProvider`] assembles complete statements from the fragments a
//! [`ResolveExpression`] produces; one provider per statement.

pub mod conditions;
pub mod dialect;
pub mod dml;
pub mod option;
pub mod params;
pub mod resolve;
pub mod sql;
pub mod traits;

#[cfg(test)]
pub(crate) mod tests;

use serde::Serialize;

pub use conditions::BuildContext;
pub use dialect::Dialect;
pub use option::ProviderOption;
pub use params::{Direction, Param, Params};
pub use resolve::{NAVIGATION_SEPARATOR, ResolveExpression};
pub use traits::{ProviderState, SqlProvider};

/// SQL text with its parameter bag, ready for an executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}
