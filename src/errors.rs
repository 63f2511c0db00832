// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Network Error: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the server's `error` string when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Transport(err.to_string())
    }
}

impl DashboardError {
    /// Whether the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, DashboardError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_server_message_verbatim() {
        let err = DashboardError::Api {
            status: 400,
            message: "Missing required field: problem_text".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required field: problem_text");
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_error_is_flagged() {
        let err = DashboardError::Transport("connection refused".to_string());
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Network Error: connection refused");
    }
}
