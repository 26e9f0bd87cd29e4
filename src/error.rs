use thiserror::Error;

/// Type alias for Result with DeleterError
pub type Result<T> = std::result::Result<T, DeleterError>;

/// Error types for the message deleter
#[derive(Error, Debug)]
pub enum DeleterError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication or credential setup failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Gmail API rejected the access token mid-session (401)
    #[error("Gmail API rejected the credentials: {0}")]
    Unauthorized(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Response was missing a field we rely on
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A label named on the command line does not exist in the account
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// User cancelled operation
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// Interactive prompt could not be rendered
    #[error("Prompt error: {0}")]
    PromptError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DeleterError {
    /// Whether the error came back from the Gmail API (or the transport in front of it)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DeleterError::ApiError(_)
                | DeleterError::RateLimitExceeded(_)
                | DeleterError::Unauthorized(_)
                | DeleterError::NetworkError(_)
                | DeleterError::ServerError { .. }
                | DeleterError::NotFound(_)
                | DeleterError::BadRequest(_)
                | DeleterError::Forbidden(_)
                | DeleterError::InvalidResponse(_)
        )
    }

    /// Check if the error is transient and likely to clear up on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DeleterError::RateLimitExceeded(_)
                | DeleterError::ServerError { .. }
                | DeleterError::NetworkError(_)
        )
    }

    /// Classify an unsuccessful HTTP status from the Gmail API
    pub fn from_status(status: hyper::StatusCode) -> Self {
        let status_code = status.as_u16();
        let message = format!(
            "HTTP {}: {}",
            status_code,
            status.canonical_reason().unwrap_or("Unknown")
        );

        match status_code {
            429 => DeleterError::RateLimitExceeded(message),
            404 => DeleterError::NotFound(message),
            400 => DeleterError::BadRequest(message),
            401 => DeleterError::Unauthorized(message),
            403 => DeleterError::Forbidden(message),
            500..=599 => DeleterError::ServerError {
                status: status_code,
                message,
            },
            _ => DeleterError::ApiError(message),
        }
    }
}

impl From<google_gmail1::Error> for DeleterError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => Self::from_status(response.status()),
            google_gmail1::Error::BadRequest(ref err) => DeleterError::BadRequest(format!("{}", err)),
            google_gmail1::Error::HttpError(ref err) => {
                DeleterError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => DeleterError::NetworkError(err.to_string()),
            google_gmail1::Error::MissingToken(ref err) => {
                DeleterError::Unauthorized(format!("Missing token: {}", err))
            }
            _ => DeleterError::ApiError(error.to_string()),
        }
    }
}
