use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("Usage error: {message}")]
    UsageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field '{field}' cannot be rendered: {reason}")]
    FormattingError { field: String, reason: String },

    #[error("Rendering error: {message}")]
    RenderingError { message: String },

    #[error("Cannot access artifact {}: {source}", .path.display())]
    FileAccessError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SMTP authentication rejected: {message}")]
    AuthenticationError { message: String },

    #[error("Delivery error: {message}")]
    DeliveryError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Configuration,
    Document,
    Filesystem,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReceiptError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::UsageError {
            message: message.into(),
        }
    }

    pub fn rendering(message: impl Into<String>) -> Self {
        Self::RenderingError {
            message: message.into(),
        }
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::DeliveryError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UsageError { .. } => ErrorCategory::Usage,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::FormattingError { .. } | Self::RenderingError { .. } => ErrorCategory::Document,
            Self::FileAccessError { .. } => ErrorCategory::Filesystem,
            Self::AuthenticationError { .. } | Self::DeliveryError { .. } => ErrorCategory::Network,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UsageError { .. } | Self::FormattingError { .. } => ErrorSeverity::Medium,
            Self::DeliveryError { .. } => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::AuthenticationError { .. } => ErrorSeverity::High,
            Self::RenderingError { .. } | Self::FileAccessError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 每種錯誤對應一個獨立的退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UsageError { .. } => 2,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => 3,
            Self::FormattingError { .. } => 4,
            Self::RenderingError { .. } => 5,
            Self::FileAccessError { .. } => 6,
            Self::AuthenticationError { .. } => 7,
            Self::DeliveryError { .. } => 8,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UsageError { message } => format!("Invalid invocation: {}", message),
            Self::ConfigError { message } => format!("Settings could not be loaded: {}", message),
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' is not configured", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::FormattingError { field, reason } => {
                format!("The {} cannot be printed on the receipt: {}", field, reason)
            }
            Self::RenderingError { message } => format!("Receipt could not be produced: {}", message),
            Self::FileAccessError { path, .. } => {
                format!("Receipt file {} could not be read", path.display())
            }
            Self::AuthenticationError { .. } => {
                "The mail relay rejected the sender credentials".to_string()
            }
            Self::DeliveryError { message } => format!("Receipt email was not delivered: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::UsageError { .. } => {
                "Pass exactly nine non-empty arguments: appointment id, patient name, patient email, total amount, payment method, date, time, doctor name, service type"
            }
            Self::ConfigError { .. } => "Check that the settings file exists and is valid TOML",
            Self::MissingConfigError { .. } => {
                "Set HMS_SENDER_EMAIL and HMS_SENDER_PASSWORD, or provide them in the [smtp] table of the settings file"
            }
            Self::InvalidConfigValueError { .. } => "Correct the value in the settings file",
            Self::FormattingError { .. } => {
                "Use characters from the Western European (WinAnsi) character set"
            }
            Self::RenderingError { .. } => {
                "Check that the output directory exists, is writable and has free space"
            }
            Self::FileAccessError { .. } => "Check that the receipt file was not moved or locked",
            Self::AuthenticationError { .. } => {
                "Verify the sender address and password (an app password may be required)"
            }
            Self::DeliveryError { .. } => {
                "Check the recipient address and network connectivity, then run again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ReceiptError>;
