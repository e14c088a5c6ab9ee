use serde_json::Value;

/// Errors raised while encoding or decoding an entity.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input text is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The document (or a nested entity value) is not a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// A JSON value has a shape the field cannot accept.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A string does not name any variant of the target enumeration.
    #[error("'{value}' is not a variant of {enumeration}")]
    EnumResolution {
        value: String,
        enumeration: &'static str,
    },

    /// An array was found where an entity collection element was expected.
    #[error("nested collections are not supported")]
    UnsupportedNestedCollection,

    /// A date or time string does not match its format.
    #[error("'{value}' does not match {format}: {source}")]
    Temporal {
        value: String,
        format: &'static str,
        source: chrono::ParseError,
    },

    /// NaN and infinities have no JSON representation.
    #[error("{0} cannot be represented in JSON")]
    NonFiniteNumber(f64),

    /// A failure inside a mapped field, with the path leading to it.
    #[error("field '{path}': {source}")]
    Field {
        path: String,
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Attach a path segment, merging with an inner field path if there is one.
    pub(crate) fn at(self, segment: &str) -> CodecError {
        match self {
            CodecError::Field { path, source } => {
                let joined = if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                CodecError::Field {
                    path: joined,
                    source,
                }
            }
            other => CodecError::Field {
                path: segment.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping any path wrappers.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Dotted path of the failing field, if the error came from one.
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::Field { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Short name for the JSON shape of a value, used in diagnostics.
pub(crate) fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
