use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("PDF rendering error: {message}")]
    PdfError { message: String },

    #[error("Form submission rejected (HTTP {status}): {message}")]
    FormSubmissionError { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Rendering,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EstimatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EstimatorError::ConfigError { .. }
            | EstimatorError::MissingConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. }
            | EstimatorError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EstimatorError::UrlParseError(_) | EstimatorError::ValidationError { .. } => {
                ErrorCategory::Input
            }
            EstimatorError::ApiError(_) | EstimatorError::FormSubmissionError { .. } => {
                ErrorCategory::Network
            }
            EstimatorError::CsvError(_)
            | EstimatorError::SerializationError(_)
            | EstimatorError::ProcessingError { .. }
            | EstimatorError::PdfError { .. } => ErrorCategory::Rendering,
            EstimatorError::ZipError(_) | EstimatorError::IoError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 表單提交失敗不影響已產生的估價檔案
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Rendering => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EstimatorError::UrlParseError(_) => {
                "Pass a full estimator URL (https://...) or a bare query string such as 'cameras=50&software=both'"
            }
            EstimatorError::ValidationError { .. } => {
                "Cameras must be a whole number between 1 and 10,000 and costs between $1 and $10,000"
            }
            EstimatorError::MissingConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. }
            | EstimatorError::ConfigValidationError { .. }
            | EstimatorError::ConfigError { .. } => {
                "Check the configuration file or command line flags"
            }
            EstimatorError::ApiError(_) => "Check network connectivity and the HubSpot API base URL",
            EstimatorError::FormSubmissionError { status, .. } if *status < 500 => {
                "Check the HubSpot portal id, form id and field names"
            }
            EstimatorError::FormSubmissionError { .. } => "HubSpot is unavailable, retry later",
            EstimatorError::PdfError { .. } => "Retry without the pdf output format",
            EstimatorError::IoError(_) | EstimatorError::ZipError(_) => {
                "Check that the output path exists and is writable"
            }
            EstimatorError::CsvError(_)
            | EstimatorError::SerializationError(_)
            | EstimatorError::ProcessingError { .. } => "Re-run with --verbose and report the log",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Invalid estimate input: {}", self),
            ErrorCategory::Network => format!("Could not send the estimate: {}", self),
            ErrorCategory::Rendering => format!("Could not render the estimate: {}", self),
            ErrorCategory::Storage => format!("Could not save the estimate: {}", self),
        }
    }

    /// 對應 CLI 的結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_input_category() {
        let err = EstimatorError::ValidationError {
            message: "cameras out of range".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().starts_with("Invalid estimate input"));
    }

    #[test]
    fn test_form_submission_suggestion_depends_on_status() {
        let client_side = EstimatorError::FormSubmissionError {
            status: 400,
            message: "bad field".to_string(),
        };
        let server_side = EstimatorError::FormSubmissionError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_ne!(
            client_side.recovery_suggestion(),
            server_side.recovery_suggestion()
        );
        assert_eq!(server_side.exit_code(), 2);
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: EstimatorError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
