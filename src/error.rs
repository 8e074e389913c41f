//! Typed errors: the wire error taxonomy and fatal contract violations.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error kinds the backend carries in every response envelope. Serialized
/// as integer codes on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Unknown,
    InvalidPagination,
    ResourceNotFound,
    ProfileNotValid,
    AlreadyReviewed,
    WatchlistAlreadyExists,
    ProfileAlreadyExists,
}

impl ErrorCode {
    pub fn as_int(self) -> u8 {
        match self {
            ErrorCode::Unknown => 0,
            ErrorCode::InvalidPagination => 1,
            ErrorCode::ResourceNotFound => 2,
            ErrorCode::ProfileNotValid => 3,
            ErrorCode::AlreadyReviewed => 4,
            ErrorCode::WatchlistAlreadyExists => 5,
            ErrorCode::ProfileAlreadyExists => 6,
        }
    }

    /// Codes this client does not know collapse to `Unknown`.
    pub fn from_int(code: u64) -> ErrorCode {
        match code {
            1 => ErrorCode::InvalidPagination,
            2 => ErrorCode::ResourceNotFound,
            3 => ErrorCode::ProfileNotValid,
            4 => ErrorCode::AlreadyReviewed,
            5 => ErrorCode::WatchlistAlreadyExists,
            6 => ErrorCode::ProfileAlreadyExists,
            _ => ErrorCode::Unknown,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_int())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = u64::deserialize(deserializer)?;
        Ok(ErrorCode::from_int(code))
    }
}

/// One application-level error from a response envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    /// The single entry every transport-level failure is downgraded to.
    pub fn unknown() -> ApiError {
        ApiError {
            code: ErrorCode::Unknown,
            message: "unknown error".into(),
        }
    }
}

/// Contract violations. These indicate a schema or programming mistake in
/// the consumer (or a server contract break), never a user-facing failure:
/// the operation stops instead of degrading.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("api root missing from response")]
    RootDocumentMissing,
    #[error("api root missing from session store")]
    RootStoreMissing,
    #[error("unresolved path parameter '<{0}>'")]
    UnresolvedPathParam(String),
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("schema validation: {0}")]
    Schema(String),
}
