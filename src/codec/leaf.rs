use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

use crate::codec::error::{shape_of, CodecError};
use crate::codec::fieldtable::{FieldKind, ScalarKind};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A field value that maps onto a single JSON scalar.
///
/// Implemented for the integer and floating point primitives, `bool`,
/// `String`, the chrono naive date/time types, and `Option` of any of them.
pub trait Leaf: Sized {
    /// Kind recorded in the field table when a field of this type is mapped.
    const KIND: FieldKind;

    /// True when `value` has a JSON shape this type can be decoded from.
    fn accepts(value: &Value) -> bool;

    /// Convert the value to its JSON form.
    fn to_json(&self) -> Result<Value, CodecError>;

    /// Convert a JSON value, coercing numbers to the width of `Self`.
    fn from_json(value: &Value) -> Result<Self, CodecError>;
}

fn expect_number(value: &Value) -> Result<&Number, CodecError> {
    match value {
        Value::Number(number) => Ok(number),
        other => Err(CodecError::TypeMismatch {
            expected: "number",
            found: shape_of(other),
        }),
    }
}

fn expect_str<'a>(value: &'a Value, expected: &'static str) -> Result<&'a str, CodecError> {
    value.as_str().ok_or(CodecError::TypeMismatch {
        expected,
        found: shape_of(value),
    })
}

fn finite(value: f64) -> Result<Value, CodecError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(CodecError::NonFiniteNumber(value))
}

// Integers truncate or wrap the JSON number the same way an `as` cast does.
macro_rules! integer_leaf {
    ($($ty:ty),* $(,)?) => {$(
        impl Leaf for $ty {
            const KIND: FieldKind = FieldKind::Scalar(ScalarKind::Integer);

            fn accepts(value: &Value) -> bool {
                value.is_number()
            }

            fn to_json(&self) -> Result<Value, CodecError> {
                Ok(Value::from(*self))
            }

            fn from_json(value: &Value) -> Result<Self, CodecError> {
                let number = expect_number(value)?;
                if let Some(signed) = number.as_i64() {
                    Ok(signed as $ty)
                } else if let Some(unsigned) = number.as_u64() {
                    Ok(unsigned as $ty)
                } else {
                    Ok(number.as_f64().unwrap_or_default() as $ty)
                }
            }
        }
    )*};
}

integer_leaf!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Leaf for f64 {
    const KIND: FieldKind = FieldKind::Scalar(ScalarKind::Float);

    fn accepts(value: &Value) -> bool {
        value.is_number()
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        finite(*self)
    }

    fn from_json(value: &Value) -> Result<Self, CodecError> {
        Ok(expect_number(value)?.as_f64().unwrap_or_default())
    }
}

impl Leaf for f32 {
    const KIND: FieldKind = FieldKind::Scalar(ScalarKind::Float);

    fn accepts(value: &Value) -> bool {
        value.is_number()
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        // Widen through the shortest decimal form so 0.1f32 is written as 0.1.
        let widened = self
            .to_string()
            .parse::<f64>()
            .unwrap_or_else(|_| f64::from(*self));
        finite(widened)
    }

    fn from_json(value: &Value) -> Result<Self, CodecError> {
        Ok(expect_number(value)?.as_f64().unwrap_or_default() as f32)
    }
}

impl Leaf for bool {
    const KIND: FieldKind = FieldKind::Scalar(ScalarKind::Boolean);

    fn accepts(value: &Value) -> bool {
        value.is_boolean()
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::Bool(*self))
    }

    fn from_json(value: &Value) -> Result<Self, CodecError> {
        value.as_bool().ok_or(CodecError::TypeMismatch {
            expected: "boolean",
            found: shape_of(value),
        })
    }
}

impl Leaf for String {
    const KIND: FieldKind = FieldKind::Scalar(ScalarKind::String);

    fn accepts(value: &Value) -> bool {
        value.is_string()
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::String(self.clone()))
    }

    fn from_json(value: &Value) -> Result<Self, CodecError> {
        expect_str(value, "string").map(str::to_string)
    }
}

macro_rules! temporal_leaf {
    ($ty:ty, $kind:expr, $format:expr) => {
        impl Leaf for $ty {
            const KIND: FieldKind = $kind;

            fn accepts(value: &Value) -> bool {
                value.is_string()
            }

            fn to_json(&self) -> Result<Value, CodecError> {
                Ok(Value::String(self.format($format).to_string()))
            }

            fn from_json(value: &Value) -> Result<Self, CodecError> {
                let text = expect_str(value, $format)?;
                <$ty>::parse_from_str(text, $format).map_err(|source| CodecError::Temporal {
                    value: text.to_string(),
                    format: $format,
                    source,
                })
            }
        }
    };
}

temporal_leaf!(NaiveDate, FieldKind::Date, DATE_FORMAT);
temporal_leaf!(NaiveTime, FieldKind::Time, TIME_FORMAT);
temporal_leaf!(NaiveDateTime, FieldKind::DateTime, DATE_TIME_FORMAT);

impl<L: Leaf> Leaf for Option<L> {
    const KIND: FieldKind = L::KIND;

    fn accepts(value: &Value) -> bool {
        value.is_null() || L::accepts(value)
    }

    fn to_json(&self) -> Result<Value, CodecError> {
        match self {
            Some(inner) => inner.to_json(),
            None => Ok(Value::Null),
        }
    }

    fn from_json(value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => L::from_json(other).map(Some),
        }
    }
}
