use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data not found: {message}")]
    DataNotFoundError { message: String },

    #[error("Insufficient data: {message}")]
    InsufficientDataError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Model error: {message}")]
    ModelError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::ApiError(_) | PipelineError::HttpStatusError { .. } => {
                ErrorCategory::Network
            }
            PipelineError::ConfigValidationError { .. }
            | PipelineError::InvalidConfigValueError { .. }
            | PipelineError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PipelineError::CsvError(_)
            | PipelineError::SerializationError(_)
            | PipelineError::DataNotFoundError { .. }
            | PipelineError::InsufficientDataError { .. }
            | PipelineError::ProcessingError { .. } => ErrorCategory::Data,
            PipelineError::ZipError(_) | PipelineError::IoError(_) => ErrorCategory::Storage,
            PipelineError::ModelError { .. } => ErrorCategory::Model,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Model => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 網路錯誤可重試
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            PipelineError::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PipelineError::ApiError(_) => {
                "Check network connectivity; the data services may be rate limiting, raise sources.retry_delay_seconds".to_string()
            }
            PipelineError::HttpStatusError { status, .. } if *status == 429 => {
                "Rate limited: increase collection.timeline_delay_ms / collection.fetch_delay_ms".to_string()
            }
            PipelineError::HttpStatusError { .. } => {
                "Verify the endpoint URLs in the [sources] section".to_string()
            }
            PipelineError::ConfigValidationError { field, .. }
            | PipelineError::InvalidConfigValueError { field, .. }
            | PipelineError::MissingConfigError { field } => {
                format!("Fix '{}' in the configuration file", field)
            }
            PipelineError::DataNotFoundError { .. } => {
                "Run the previous stage first (download_data → run_pipeline → train_model)".to_string()
            }
            PipelineError::InsufficientDataError { .. } => {
                "Widen the debut year range or lower collection.min_career_pa".to_string()
            }
            PipelineError::ModelError { .. } => {
                "Increase model.alpha or drop constant features from model.features".to_string()
            }
            PipelineError::CsvError(_) | PipelineError::SerializationError(_) => {
                "Stored files may be corrupt; delete them and re-run the stage".to_string()
            }
            PipelineError::ProcessingError { .. } => "Re-run with --verbose for details".to_string(),
            PipelineError::ZipError(_) => {
                "The player register archive could not be read; check sources.register_endpoint"
                    .to_string()
            }
            PipelineError::IoError(_) => {
                "Check permissions and free space under paths.data_dir".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Model => format!("Model problem: {}", self),
        }
    }

    /// 依嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
