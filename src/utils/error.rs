use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Endpoint {url} unavailable ({status})")]
    EndpointUnavailable { url: String, status: u16 },

    #[error("API error: {status} {reason} from {url}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("Upload failed ({status}): {detail}")]
    UploadFailed { status: u16, detail: String },

    #[error("No candidate endpoint accepted the request ({attempted} tried): {last_error}")]
    CandidatesExhausted { attempted: usize, last_error: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Protocol,
    Payload,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl TriageError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TriageError::ApiError(_) | TriageError::CandidatesExhausted { .. } => {
                ErrorCategory::Network
            }
            TriageError::EndpointUnavailable { .. }
            | TriageError::UnexpectedStatus { .. }
            | TriageError::UploadFailed { .. } => ErrorCategory::Protocol,
            TriageError::SerializationError(_) | TriageError::MalformedResponse { .. } => {
                ErrorCategory::Payload
            }
            TriageError::ConfigError { .. }
            | TriageError::ConfigValidationError { .. }
            | TriageError::InvalidConfigValueError { .. }
            | TriageError::MissingConfigError { .. } => ErrorCategory::Configuration,
            TriageError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Protocol | ErrorCategory::Payload => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether the failover walk should move on to the next candidate.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TriageError::ApiError(_) | TriageError::EndpointUnavailable { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the scoring backend is running and reachable, or use --offline"
            }
            ErrorCategory::Protocol => {
                "Verify the backend version exposes /api/predict, /api/parse-emr and /api/model-status"
            }
            ErrorCategory::Payload => "Inspect the backend response body; the payload did not match the expected shape",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags and try again",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TriageError::UploadFailed { status, detail } => {
                format!("The document could not be processed (HTTP {}): {}", status, detail)
            }
            TriageError::CandidatesExhausted { attempted, .. } => format!(
                "None of the {} configured backend addresses could handle the request",
                attempted
            ),
            TriageError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
