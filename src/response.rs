//! Response envelope and listing page types.

use crate::error::{ApiError, ErrorCode};
use serde::{Deserialize, Serialize};

/// The uniform envelope every endpoint returns, success or failure.
/// `data` is absent on pure failures; `errors` is empty on pure success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "none")]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    /// Envelope for a failure that produced no structured response.
    pub fn unknown() -> ApiEnvelope<T> {
        ApiEnvelope {
            data: None,
            errors: vec![ApiError::unknown()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

/// Opaque pagination continuation tokens issued by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub next: String,
    pub previous: String,
}

/// One page of a listing. The cursor is absent once the query is
/// exhausted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    pub page: Vec<T>,
    #[serde(default = "none")]
    pub cursor: Option<Cursor>,
}

impl<T> Default for PageEnvelope<T> {
    fn default() -> PageEnvelope<T> {
        PageEnvelope {
            page: Vec::new(),
            cursor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn envelope_defaults_fill_absent_fields() {
        let envelope: ApiEnvelope<Value> = serde_json::from_str(r#"{"data": {"a": 1}}"#).unwrap();
        assert!(envelope.is_success());
        assert!(envelope.data.is_some());

        let envelope: ApiEnvelope<Value> =
            serde_json::from_str(r#"{"errors": [{"code": 1, "message": "bad cursor"}]}"#).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.has_error(ErrorCode::InvalidPagination));
    }

    #[test]
    fn page_envelope_tolerates_missing_cursor() {
        let page: PageEnvelope<Value> = serde_json::from_str(r#"{"page": []}"#).unwrap();
        assert!(page.cursor.is_none());
        assert!(page.page.is_empty());
    }
}
