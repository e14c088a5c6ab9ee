use serde_json::{Map, Value};

use crate::codec::error::{shape_of, CodecError};
use crate::codec::fieldtable::{FieldKind, FieldTable};

/// A record type whose fields are mapped to JSON object keys.
///
/// `Default` supplies the instance decoding starts from, so a key missing
/// from the document leaves the field at its default.
pub trait Entity: Default + 'static {
    /// Register the mapped fields, in the order they are written.
    fn fields(table: FieldTable<Self>) -> FieldTable<Self>;
}

/// The complete field table of `T`, including embedded base records.
pub fn field_table<T: Entity>() -> FieldTable<T> {
    T::fields(FieldTable::new())
}

/// Encode an entity to JSON object text.
///
/// Keys follow field declaration order. Empty collections are written as
/// `null` rather than `[]`.
pub fn encode<T: Entity>(entity: &T) -> Result<String, CodecError> {
    Ok(encode_value(entity)?.to_string())
}

/// Encode an entity to a JSON object value.
pub fn encode_value<T: Entity>(entity: &T) -> Result<Value, CodecError> {
    encode_object(entity).map(Value::Object)
}

/// Decode JSON object text into a fresh `T`.
///
/// Only keys that are present are applied; anything else keeps its default.
/// The first failing field aborts the whole decode.
pub fn decode<T: Entity>(text: &str) -> Result<T, CodecError> {
    let document: Value = serde_json::from_str(text)?;
    decode_value(&document)
}

/// Decode an already parsed JSON value into a fresh `T`.
pub fn decode_value<T: Entity>(document: &Value) -> Result<T, CodecError> {
    match document {
        Value::Object(object) => decode_object(object),
        other => Err(CodecError::NotAnObject {
            found: shape_of(other),
        }),
    }
}

pub(crate) fn encode_object<T: Entity>(entity: &T) -> Result<Map<String, Value>, CodecError> {
    encode_with(&field_table::<T>(), entity)
}

pub(crate) fn decode_object<T: Entity>(object: &Map<String, Value>) -> Result<T, CodecError> {
    decode_with(&field_table::<T>(), object)
}

/// Encode with a table built by the caller, so a collection of entities
/// shares one table across its items.
pub(crate) fn encode_with<T: Entity>(
    table: &FieldTable<T>,
    entity: &T,
) -> Result<Map<String, Value>, CodecError> {
    let mut object = Map::new();
    for field in table.iter() {
        let value = match (field.kind(), field.read(entity)) {
            (FieldKind::Collection { .. }, Ok(Value::Array(items))) if items.is_empty() => {
                Value::Null
            }
            (_, value) => value.map_err(|e| e.at(field.key()))?,
        };
        object.insert(field.key().to_string(), value);
    }
    Ok(object)
}

pub(crate) fn decode_with<T: Entity>(
    table: &FieldTable<T>,
    object: &Map<String, Value>,
) -> Result<T, CodecError> {
    let mut entity = T::default();
    for field in table.iter() {
        let Some(value) = object.get(field.key()) else {
            continue;
        };

        let assign = match (field.kind(), value) {
            (_, Value::Null) => false,
            (FieldKind::Entity, Value::Object(_)) => true,
            (FieldKind::Entity, other) => {
                return Err(CodecError::NotAnObject {
                    found: shape_of(other),
                }
                .at(field.key()));
            }
            (FieldKind::Collection { .. }, Value::Array(_)) => true,
            (FieldKind::Collection { .. }, other) => {
                return Err(CodecError::TypeMismatch {
                    expected: "array",
                    found: shape_of(other),
                }
                .at(field.key()));
            }
            // Object-shaped data cannot become a scalar, date or enum.
            (_, Value::Object(_)) => false,
            _ => true,
        };

        if assign {
            field
                .write(&mut entity, value)
                .map_err(|e| e.at(field.key()))?;
        } else {
            field.reset(&mut entity);
        }
    }
    Ok(entity)
}
