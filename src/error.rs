//! Error types for the Drive MCP server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

/// Errors from the upstream HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the Drive API (429 response)
    #[error("Rate limited (429): {message}")]
    RateLimited {
        /// Error message from the API
        message: String,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited { message: message.into() }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this error is a rate-limit signal worth retrying.
    ///
    /// The activity loop retries iff the error is a 429 or its message
    /// carries the Drive `rateLimitExceeded` reason.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            other => {
                let message = other.to_string();
                message.contains("429") || message.contains("rateLimitExceeded")
            }
        }
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Error from the Drive API client
    #[error("Drive API error: {0}")]
    Client(#[from] ClientError),

    /// Input validation failed
    #[error("Invalid input for '{field}': {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Operation not supported for the target file (e.g. raw download of a
    /// Workspace file); the message points the caller at the right tool.
    #[error("{0}")]
    Unsupported(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal tool logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create an unsupported-operation error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(ClientError::rate_limited("quota exceeded").is_rate_limit());
        assert!(ClientError::server(403, "rateLimitExceeded").is_rate_limit());
        assert!(ClientError::bad_request("status 429 returned").is_rate_limit());

        assert!(!ClientError::not_found("file abc").is_rate_limit());
        assert!(!ClientError::server(500, "backend error").is_rate_limit());
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ToolError::validation("newName", "must not be empty");
        let message = err.to_string();
        assert!(message.contains("newName"));
        assert!(message.contains("must not be empty"));
    }

    #[test]
    fn test_unsupported_message_is_bare() {
        let err = ToolError::unsupported("use drive_export_url instead");
        assert_eq!(err.to_string(), "use drive_export_url instead");
    }
}
