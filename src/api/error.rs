use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Shown when a request never produced a distinguishable server response.
pub const TRANSPORT_FALLBACK_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

/// Shown when a failure carries no usable message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

pub const GENERIC_SUCCESS_MESSAGE: &str = "Done";

/// Error returned by a submit action's transport layer.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
    /// The request never reached the server, or the response never arrived.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with a structured error.
    #[error("{message}")]
    Server {
        status: Option<u16>,
        message: String,
        field_errors: BTreeMap<String, String>,
    },
}

impl ApiError {
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport(detail.into())
    }

    pub fn server(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        Self::Server {
            status: status.into(),
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        if let Self::Server { field_errors, .. } = &mut self {
            field_errors.insert(field.into(), message.into());
        }
        self
    }
}

/// The one canonical failure shape the rest of the client consumes.
/// Every server payload variation is mapped into it here and nowhere else.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiFailure {
    pub message: String,
    pub status: Option<u16>,
    pub field_errors: BTreeMap<String, String>,
}

impl ApiFailure {
    pub fn generic() -> Self {
        Self {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            status: None,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn from_error(error: &ApiError) -> Self {
        match error {
            ApiError::Transport(detail) => {
                debug!(detail = %detail, "transport error normalized");
                Self {
                    message: TRANSPORT_FALLBACK_MESSAGE.to_string(),
                    status: None,
                    field_errors: BTreeMap::new(),
                }
            }
            ApiError::Server {
                status,
                message,
                field_errors,
            } => Self {
                message: if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message.clone()
                },
                status: *status,
                field_errors: field_errors.clone(),
            },
        }
    }

    /// A fulfilled payload carrying an explicit `"success": false` is still
    /// a failure. Returns `None` for anything else.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        if payload.get("success") != Some(&Value::Bool(false)) {
            return None;
        }
        let message = extract_message(payload).unwrap_or_else(|| {
            warn!("failure payload carried no message; using generic fallback");
            GENERIC_FAILURE_MESSAGE.to_string()
        });
        Some(Self {
            message,
            status: payload
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|status| u16::try_from(status).ok()),
            field_errors: extract_field_errors(payload),
        })
    }
}

impl From<ApiError> for ApiFailure {
    fn from(error: ApiError) -> Self {
        Self::from_error(&error)
    }
}

/// Successful submit payload plus its extracted display message.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitResponse {
    pub message: Option<String>,
    pub payload: Value,
}

impl SubmitResponse {
    pub fn from_payload(payload: Value) -> Self {
        Self {
            message: extract_message(&payload),
            payload,
        }
    }

    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or(GENERIC_SUCCESS_MESSAGE)
    }
}

// The server's error contract is not strongly typed: messages arrive as
// `.message`, `.error`, or nested `.data.message` depending on the route.
fn extract_message(payload: &Value) -> Option<String> {
    payload
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| payload.get("error").and_then(Value::as_str))
        .or_else(|| {
            payload
                .get("data")
                .and_then(|data| data.get("message"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
        .filter(|message| !message.trim().is_empty())
}

// `errors` arrives either as a map of field -> message or field -> [messages].
fn extract_field_errors(payload: &Value) -> BTreeMap<String, String> {
    let Some(entries) = payload.get("errors").and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(field, value)| {
            let message = match value {
                Value::String(message) => Some(message.clone()),
                Value::Array(messages) => messages
                    .first()
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            };
            message.map(|message| (field.clone(), message))
        })
        .collect()
}
