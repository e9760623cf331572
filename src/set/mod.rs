//! Fluent entry points.
//!
//! A set accumulates expression state; each terminal builds its statement
//! with a fresh provider and hands it to the database's executor.

pub mod command;
pub mod query;
pub mod state;

use serde_json::Value as JsonValue;

use crate::error::{ForgeError, ForgeResult};

pub use self::command::CommandSet;
pub use self::query::{PageList, QuerySet};
pub use self::state::SetState;

/// Read a count returned as a scalar.
pub(crate) fn scalar_to_u64(value: JsonValue) -> ForgeResult<u64> {
    match &value {
        JsonValue::Null => Ok(0),
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().and_then(|i| u64::try_from(i).ok()))
            .ok_or_else(|| ForgeError::Execution(format!("count is not a non-negative integer: {}", n))),
        JsonValue::String(s) => s
            .parse()
            .map_err(|_| ForgeError::Execution(format!("count is not an integer: {}", s))),
        other => Err(ForgeError::Execution(format!("unexpected count value: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_to_u64() {
        assert_eq!(scalar_to_u64(json!(12)).unwrap(), 12);
        assert_eq!(scalar_to_u64(json!("12")).unwrap(), 12);
        assert_eq!(scalar_to_u64(JsonValue::Null).unwrap(), 0);
        assert!(scalar_to_u64(json!(-1)).is_err());
    }
}
