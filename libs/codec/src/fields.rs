//! Flat field maps
//!
//! A message crosses the wire as a map of field name to scalar value. Nested
//! arrays and objects are refused at encode time so that every collaborator
//! can rebuild a message from nothing but its type name and this map.

use crate::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Field name to scalar value
pub type FieldMap = Map<String, Value>;

/// Encode a message value into a flat field map.
///
/// Unit structs (and anything else serializing to `null`) become an empty map.
pub fn encode_fields<T: Serialize + ?Sized>(type_name: &str, value: &T) -> CodecResult<FieldMap> {
    let value = serde_json::to_value(value).map_err(|e| CodecError::json(type_name, e))?;

    let fields = match value {
        Value::Object(fields) => fields,
        Value::Null => return Ok(FieldMap::new()),
        other => {
            return Err(CodecError::NotAnObject {
                type_name: type_name.to_string(),
                found: kind_of(&other),
            })
        }
    };

    if let Some((field, _)) = fields.iter().find(|(_, v)| !is_scalar(v)) {
        return Err(CodecError::NestedField {
            type_name: type_name.to_string(),
            field: field.clone(),
        });
    }

    Ok(fields)
}

/// Rebuild a message value from its field map.
pub fn decode_fields<T: DeserializeOwned>(type_name: &str, fields: FieldMap) -> CodecResult<T> {
    if fields.is_empty() {
        // Unit structs only accept null
        if let Ok(value) = serde_json::from_value(Value::Null) {
            return Ok(value);
        }
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| CodecError::json(type_name, e))
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
