//! Collaborators that reach the remote API.
//!
//! The fetcher and the CDB editor never talk HTTP themselves. They are handed a
//! [`Transport`] (paged reads) or a [`ListStore`] (list persistence). The
//! `http` feature provides [`HttpTransport`], which implements both over
//! `reqwest`; tests use in-memory fakes.
//!
//! Response bodies are parsed exactly once, here, into [`ApiEnvelope`]. Fields
//! the remote may omit are `Option`s so nothing downstream has to guard
//! against missing keys.

#[cfg(feature = "http")]
pub mod http;
pub mod redact;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use crate::error::{FetchError, TransportError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Ordered query parameters for a request.
pub type QueryParams = Vec<(String, String)>;

/// Read access to the remote API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a GET of `path` with `params` and returns the decoded body.
    ///
    /// A body carrying a non-zero `error` is still a successful transport
    /// call; interpreting it is left to [`ApiEnvelope`].
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, TransportError>;
}

/// Write access for CDB list files.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Stores `content` as `file_name` under `path`.
    async fn save(
        &self,
        file_name: &str,
        path: &str,
        content: &str,
    ) -> Result<SaveResponse, TransportError>;
}

/// Answer of the persistence endpoint. `error == 0` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SaveResponse {
    /// Remote error code.
    #[serde(default, deserialize_with = "error_code")]
    pub error: i64,
    /// Optional human readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Top level of every API response: `{ "error": 0, "message": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEnvelope {
    /// Remote error code, 0 on success.
    pub error: i64,
    /// Message accompanying an error, if any.
    pub message: Option<String>,
    /// Payload, absent on most errors.
    pub data: Option<Value>,
}

/// A page of a remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListData<T> {
    /// Records of this page, in server order.
    pub items: Vec<T>,
    /// Size of the whole collection for the current filters.
    pub total_items: usize,
}

#[derive(Deserialize)]
struct RawListData<T> {
    items: Vec<T>,
    #[serde(rename = "totalItems")]
    total_items: usize,
}

impl ApiEnvelope {
    /// Splits a response body into error code, message and payload.
    ///
    /// Some backends report errors as strings instead of numeric codes; those
    /// map to code `-1` with the string as message.
    pub fn parse(body: Value) -> Result<Self, FetchError> {
        let Value::Object(mut map) = body else {
            return Err(FetchError::Malformed("response is not an object".into()));
        };
        let mut message = map
            .remove("message")
            .and_then(|m| m.as_str().map(str::to_string));
        let error = match map.remove("error") {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
            Some(Value::Bool(b)) => i64::from(b),
            Some(Value::String(s)) => {
                message.get_or_insert(s);
                -1
            }
            Some(other) => {
                message.get_or_insert(other.to_string());
                -1
            }
        };
        Ok(Self {
            error,
            message,
            data: map.remove("data"),
        })
    }

    /// Returns the envelope unchanged when `error == 0`.
    pub fn check(self) -> Result<Self, FetchError> {
        if self.error == 0 {
            return Ok(self);
        }
        Err(FetchError::Remote {
            code: self.error,
            message: self
                .message
                .unwrap_or_else(|| "error from backend".to_string()),
        })
    }

    /// Decodes the payload as a page of `T`.
    pub fn into_list<T: DeserializeOwned>(self) -> Result<ListData<T>, FetchError> {
        let data = self
            .data
            .ok_or_else(|| FetchError::Malformed("missing data".into()))?;
        let raw: RawListData<T> =
            serde_json::from_value(data).map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(ListData {
            items: raw.items,
            total_items: raw.total_items,
        })
    }
}

fn error_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => 0,
        Value::Number(n) => n.as_i64().unwrap_or(-1),
        Value::Bool(b) => i64::from(b),
        _ => -1,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let env = ApiEnvelope::parse(json!({
            "error": 0,
            "data": { "items": [1, 2], "totalItems": 7 }
        }))
        .unwrap();
        let list: ListData<u32> = env.check().unwrap().into_list().unwrap();
        assert_eq!(list.items, vec![1, 2]);
        assert_eq!(list.total_items, 7);
    }

    #[test]
    fn test_envelope_remote_error() {
        let env = ApiEnvelope::parse(json!({ "error": 1701, "message": "Agent does not exist" }))
            .unwrap();
        match env.check() {
            Err(FetchError::Remote { code, message }) => {
                assert_eq!(code, 1701);
                assert_eq!(message, "Agent does not exist");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_string_error() {
        let env = ApiEnvelope::parse(json!({ "error": "Missing ID or endpoint." })).unwrap();
        assert_eq!(env.error, -1);
        assert_eq!(env.message.as_deref(), Some("Missing ID or endpoint."));
    }

    #[test]
    fn test_envelope_missing_fields() {
        assert!(matches!(
            ApiEnvelope::parse(json!([1, 2])),
            Err(FetchError::Malformed(_))
        ));
        let env = ApiEnvelope::parse(json!({ "data": { "items": [] } })).unwrap();
        assert_eq!(env.error, 0);
        assert!(matches!(
            env.into_list::<Value>(),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_save_response_decoding() {
        let ok: SaveResponse = serde_json::from_value(json!({ "error": 0 })).unwrap();
        assert_eq!(ok.error, 0);
        let failed: SaveResponse =
            serde_json::from_value(json!({ "error": "forbidden", "message": "admin" })).unwrap();
        assert_eq!(failed.error, -1);
        let empty: SaveResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.error, 0);
    }
}
