use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Data store rejected the request (HTTP {status}): {message}")]
    StoreError { status: u16, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

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

    #[error("Validation error in '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("No row with id {id} in table '{table}'")]
    NotFound { table: String, id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Store,
    Configuration,
    Data,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 程序結束碼；Low 只是警告，不視為失敗
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl AdminError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::StoreError { .. } | Self::NotFound { .. } => ErrorCategory::Store,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } => ErrorSeverity::Low,
            Self::ApiError(_) => ErrorSeverity::Medium,
            // 5xx 可重試，4xx 代表請求本身有問題
            Self::StoreError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            Self::StoreError { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ValidationError { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(_) => "Could not reach the data store".to_string(),
            Self::StoreError { status, message } => {
                format!("The data store refused the request ({}): {}", status, message)
            }
            Self::NotFound { table, id } => format!("Nothing found in {} with id {}", table, id),
            Self::ValidationError { field, message } => {
                format!("Invalid input for {}: {}", field, message)
            }
            Self::MissingConfigError { field } => {
                format!("Missing configuration value: {}", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value {} is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection and the store URL, then retry",
            ErrorCategory::Store => match self {
                Self::StoreError { status: 401, .. } | Self::StoreError { status: 403, .. } => {
                    "Check that the API key is valid and has access to the table"
                }
                Self::NotFound { .. } => "List the table to find a valid id",
                _ => "Inspect the store response and the submitted values",
            },
            ErrorCategory::Configuration => {
                "Review chargepark.toml and the CHARGEPARK_* environment variables"
            }
            ErrorCategory::Data => "Correct the input values and submit again",
            ErrorCategory::Io => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
