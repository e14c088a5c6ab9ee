use crate::codec::CodecError;

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The connection could not be established or timed out.
    ConnectionTimeout,
    JsonEncode,
    JsonDecode,
    /// Transport, file, or server side failure.
    Io,
}

/// Failure of a single request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("connection failed: {0}")]
    ConnectionTimeout(String),

    #[error("JSON encode failed: {0}")]
    JsonEncode(#[source] CodecError),

    #[error("JSON decode failed: {0}")]
    JsonDecode(#[source] CodecError),

    #[error("I/O error: {0}")]
    Io(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// `exec` was called before `prepare` or after `release`.
    #[error("service is not prepared")]
    NotPrepared,

    #[error("request was cancelled")]
    Cancelled,
}

impl ApiError {
    /// Coarse kind of the failure, for callers that only branch on the
    /// four classic cases.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::ConnectionTimeout(_) | ApiError::Cancelled => ErrorKind::ConnectionTimeout,
            ApiError::JsonEncode(_) => ErrorKind::JsonEncode,
            ApiError::JsonDecode(_) => ErrorKind::JsonDecode,
            ApiError::Io(_) | ApiError::Status { .. } | ApiError::NotPrepared => ErrorKind::Io,
        }
    }

    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            ApiError::ConnectionTimeout(error.to_string())
        } else {
            ApiError::Io(error.to_string())
        }
    }
}
