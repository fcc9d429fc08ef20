use crate::fit::FitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("FIT decode error: {0}")]
    FitError(#[from] FitError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Model '{model}' request failed: {message}")]
    LlmError { model: String, message: String },

    #[error("Graph database error: {message}")]
    GraphError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Io,
    Data,
    Model,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 對應 CLI 的退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl LabError {
    pub fn processing(message: impl Into<String>) -> Self {
        LabError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LabError::HttpError(_) => ErrorCategory::Network,
            LabError::IoError(_) | LabError::ZipError(_) => ErrorCategory::Io,
            LabError::CsvError(_)
            | LabError::SerializationError(_)
            | LabError::ParquetError(_)
            | LabError::ArrowError(_)
            | LabError::FitError(_)
            | LabError::ProcessingError { .. } => ErrorCategory::Data,
            LabError::ConfigError { .. }
            | LabError::MissingConfigError { .. }
            | LabError::InvalidConfigValueError { .. }
            | LabError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LabError::LlmError { .. } => ErrorCategory::Model,
            LabError::GraphError { .. } => ErrorCategory::Graph,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Model | ErrorCategory::Graph => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line flags or the TOML config for typos and unsupported values"
            }
            ErrorCategory::Network => "Check that the target service is running and reachable",
            ErrorCategory::Io => "Check that the paths exist and are readable/writable",
            ErrorCategory::Data => {
                "The input files may be corrupt or truncated; re-export them and retry"
            }
            ErrorCategory::Model => {
                "Make sure Ollama is running (`ollama serve`) and the model is pulled (`ollama pull <model>`)"
            }
            ErrorCategory::Graph => "Verify NEO4J_URI, NEO4J_USER and NEO4J_PASS in your .env",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LabError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            LabError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            LabError::HttpError(e) if e.is_connect() => {
                "Could not connect to the service".to_string()
            }
            LabError::HttpError(e) if e.is_timeout() => "The request timed out".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;
