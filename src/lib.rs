//! # sqlforge
//!
//! Typed expression trees in, dialect-correct SQL out.
//!
//! Entities describe their table mapping once; predicates, projections and
//! updates are built as expression trees and compiled by a per-dialect
//! [`SqlProvider`](transpiler::SqlProvider) into SQL plus a named parameter
//! bag for **MySQL**, **SQL Server** or **Oracle**.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sqlforge::prelude::*;
//!
//! let db = Database::new(SqlxExecutor::connect(url).await?, Dialect::MySql);
//! let users = db
//!     .query_set::<User>()
//!     .filter(col::<User>("age").gt(18))
//!     .order_by_desc(col::<User>("name"))
//!     .top(10)
//!     .to_list()
//!     .await?;
//! // SELECT users.`id`, users.`user_name` AS `name`, ... FROM `users` users
//! //   WHERE 1=1 AND users.`age` > @age ORDER BY users.`user_name` DESC LIMIT 10
//! ```
//!
//! ## Dialects
//!
//! | Dialect    | Quote   | Param | Paging                                  |
//! |------------|---------|-------|-----------------------------------------|
//! | MySQL      | `` ` `` | `@`   | `LIMIT size OFFSET skip`                |
//! | SQL Server | `[ ]`   | `@`   | `OFFSET skip ROWS FETCH NEXT size ...`  |
//! | Oracle     | `"`     | `:`   | `ROWNUM` window                         |

pub mod aop;
pub mod ast;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod set;
pub mod transpiler;

pub mod prelude {
    pub use crate::aop::{Aop, SqlLogger};
    pub use crate::ast::*;
    pub use crate::config::ForgeConfig;
    pub use crate::database::Database;
    pub use crate::engine::{Executor, Row, SqlxExecutor, from_row};
    pub use crate::error::*;
    pub use crate::metadata::{Entity, EntityDescriptor, EntityRecord, JoinKind, Navigation};
    pub use crate::set::{CommandSet, PageList, QuerySet, SetState};
    pub use crate::transpiler::{Dialect, Params, SqlProvider, Statement};
}
