use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlPlaneError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        body: Value,
    },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Control plane configuration error: {0}")]
    Config(String),
}

impl ControlPlaneError {
    pub fn decode(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// HTTP status, when the control plane answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Error text shown to the assistant: status, message and response body
    pub fn to_tool_text(&self) -> String {
        let status = self
            .status()
            .map(|s| s.as_u16().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let data = match self {
            Self::Status { body, .. } if !body.is_null() => body.clone(),
            _ => Value::Object(Default::default()),
        };
        let data = serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string());
        format!("Status: {}\nMessage: {}\nData:\n{}", status, self, data)
    }
}
