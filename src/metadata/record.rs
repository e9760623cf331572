use serde_json::Map;

use super::entity::{Entity, EntityType};
use crate::ast::Value;
use crate::error::{ForgeError, ForgeResult};

/// An entity instance flattened to its serialized properties.
///
/// Providers are object-safe, so instances cross that boundary in this form.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub ty: EntityType,
    values: Map<String, serde_json::Value>,
}

impl EntityRecord {
    pub fn of<T: Entity>(entity: &T) -> ForgeResult<Self> {
        match serde_json::to_value(entity)? {
            serde_json::Value::Object(values) => Ok(Self {
                ty: EntityType::of::<T>(),
                values,
            }),
            other => Err(ForgeError::metadata(
                std::any::type_name::<T>(),
                format!("entity serialized to {} instead of an object", json_kind(&other)),
            )),
        }
    }

    /// Value of a property; absent properties read as NULL.
    pub fn value(&self, property: &str) -> Value {
        self.values
            .get(property)
            .map(Value::from_json)
            .unwrap_or(Value::Null)
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
