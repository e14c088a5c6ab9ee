use serde_json::Value;

use crate::codec::error::{shape_of, CodecError};

/// An enumeration mapped to JSON by its symbolic name.
///
/// Names are conventionally upper-case (`ACTIVE`). Encoding writes the
/// lower-cased name; decoding upper-cases both the JSON string and the
/// declared names before comparing, so a mixed-case name still resolves. The
/// [`enumeration!`](crate::enumeration) macro implements this for plain enums.
pub trait Enumeration: Clone + 'static {
    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// Every variant, in declaration order.
    fn variants() -> &'static [Self];

    /// Symbolic name of the variant, e.g. `ACTIVE`.
    fn name(&self) -> &'static str;
}

pub(crate) fn encode_enum<E: Enumeration>(value: &E) -> Value {
    Value::String(value.name().to_lowercase())
}

pub(crate) fn decode_enum<E: Enumeration>(value: &Value) -> Result<E, CodecError> {
    let text = value.as_str().ok_or(CodecError::TypeMismatch {
        expected: "string",
        found: shape_of(value),
    })?;
    let wanted = text.to_uppercase();
    E::variants()
        .iter()
        .find(|variant| variant.name().to_uppercase() == wanted)
        .cloned()
        .ok_or_else(|| CodecError::EnumResolution {
            value: text.to_string(),
            enumeration: E::NAME,
        })
}

/// Implement [`Enumeration`](crate::codec::Enumeration) for a fieldless enum.
///
/// ```
/// #[derive(Debug, Clone, Default, PartialEq)]
/// enum Status {
///     #[default]
///     Active,
///     Inactive,
/// }
///
/// entity_http_client::enumeration!(Status {
///     Active => "ACTIVE",
///     Inactive => "INACTIVE",
/// });
/// ```
#[macro_export]
macro_rules! enumeration {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $crate::codec::Enumeration for $ty {
            const NAME: &'static str = stringify!($ty);

            fn variants() -> &'static [Self] {
                &[$($ty::$variant),+]
            }

            fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }
    };
}
