use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Input format error: {message}")]
    FormatError { message: String },

    #[error("Remote conflict: {message}")]
    RemoteConflict { message: String },

    #[error("Remote service unavailable (HTTP {status}): {message}")]
    RemoteTransient {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Remote service rejected the request (HTTP {status}): {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("Authentication failed (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("List '{name}' could not be resolved: {message}")]
    ListResolution { name: String, message: String },
}

/// 錯誤分類，用於日誌與退出碼判斷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Remote,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UploadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UploadError::ConfigError { .. }
            | UploadError::InvalidConfigValueError { .. }
            | UploadError::Unauthorized { .. } => ErrorCategory::Configuration,
            UploadError::FormatError { .. } | UploadError::CsvError(_) => ErrorCategory::Input,
            UploadError::ApiError(_) | UploadError::RemoteTransient { .. } => {
                ErrorCategory::Network
            }
            UploadError::RemoteConflict { .. }
            | UploadError::RemoteRejected { .. }
            | UploadError::UnexpectedResponse { .. }
            | UploadError::ListResolution { .. }
            | UploadError::SerializationError(_) => ErrorCategory::Remote,
            UploadError::IoError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            UploadError::RemoteConflict { .. } => ErrorSeverity::Low,
            UploadError::RemoteTransient { .. } | UploadError::ApiError(_) => ErrorSeverity::Medium,
            UploadError::IoError(_) | UploadError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    /// 是否為可重試的暫時性錯誤（限流、5xx、逾時、連線失敗）
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::RemoteTransient { .. } => true,
            UploadError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// 伺服器透過 Retry-After 要求的等待時間
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            UploadError::RemoteTransient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            UploadError::ConfigError { .. } => {
                "Pass --api-key or set APOLLO_API_KEY, and check that the input file exists"
            }
            UploadError::InvalidConfigValueError { .. } => {
                "Fix the highlighted value in the command line or settings file"
            }
            UploadError::Unauthorized { .. } => "Check that your APOLLO_API_KEY is valid",
            UploadError::FormatError { .. } | UploadError::CsvError(_) => {
                "Make sure the input file has a header row and an email column with values"
            }
            UploadError::RemoteTransient { .. } | UploadError::ApiError(_) => {
                "The service is busy or unreachable; rerun later, uploads are deduplicated"
            }
            UploadError::ListResolution { .. } => {
                "Check the list name and that the API key may create lists"
            }
            UploadError::RemoteConflict { .. }
            | UploadError::RemoteRejected { .. }
            | UploadError::UnexpectedResponse { .. }
            | UploadError::SerializationError(_) => {
                "Inspect the logged response and the affected record"
            }
            UploadError::IoError(_) => "Check file permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Input file problem: {}", self),
            ErrorCategory::Network => format!("Could not reach the service: {}", self),
            ErrorCategory::Remote => format!("The service refused the operation: {}", self),
            ErrorCategory::Storage => format!("File system problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
