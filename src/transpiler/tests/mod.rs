//! Transpiler test modules.
//!
//! - `fixtures`: mapped entities shared by the suites
//! - `mysql`, `sqlserver`, `oracle`: statement shapes per dialect
//! - `properties`: behavior every dialect must agree on

mod oracle;
mod properties;
