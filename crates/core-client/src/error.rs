use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("not signed in")]
    Unauthorized,
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Short human-facing form used on the transient status line.
    pub fn summary(&self) -> String {
        match self {
            ClientError::Unauthorized => "not signed in".to_string(),
            ClientError::Http { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Http { status, .. } => format!("HTTP {status}"),
            ClientError::Transport(_) => "could not reach server".to_string(),
            ClientError::Decode(_) => "unexpected response".to_string(),
        }
    }

    /// Build an error from a non-success status and its raw body, preferring the
    /// `{"error": "..."}` message when the body carries one.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return ClientError::Unauthorized;
        }
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());
        ClientError::Http { status, message }
    }
}
