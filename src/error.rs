//! # Application Error Handling
//!
//! Rich error type for the `sws` application layer. Engine errors from
//! `sws-core` ([`ConfigError`], [`ScaleError`], [`NotSupported`]) are
//! wrapped together with an [`ErrorContext`] that records when and during
//! which operation the failure happened, how severe it is and what the user
//! can do about it.
//!
//! ## Error Classification
//!
//! - `HasSeverity`: severity level carried in the context
//! - `HasRecoverySuggestion`: human readable next step
//! - `Recoverable`: whether a different configuration can fix the failure
//!
//! ## Usage
//!
//! ```rust
//! use sws::error::{HasRecoverySuggestion, SwsError};
//!
//! let error = SwsError::validation("band_rows", "0", "must be positive")
//!     .with_operation("validate config")
//!     .with_recovery_suggestion("Pass --band-rows 16 or larger");
//! assert_eq!(error.recovery_suggestion(), Some("Pass --band-rows 16 or larger"));
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

use sws_core::{ConfigError, NotSupported, ScaleError};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    /// Affects the current job but the process can continue
    Error,
    /// Caller contract violated; the job cannot continue as configured
    Critical,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    pub context: Option<String>,
    pub recovery_suggestion: Option<String>,
    pub severity: ErrorSeverity,
    pub recoverable: bool,
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            recoverable: false,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn recoverable(mut self) -> Self {
        self.recoverable = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Base error type for the `sws` application
#[derive(Debug)]
pub enum SwsError {
    /// The engine rejected a format/size/filter combination
    Config {
        source: ConfigError,
        context: ErrorContext,
    },
    /// A configuration field failed validation before reaching the engine
    Validation {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// A scale call violated its buffer contract
    Scale {
        source: ScaleError,
        context: ErrorContext,
    },
    /// Registry or table lookup miss
    NotSupported {
        source: NotSupported,
        context: ErrorContext,
    },
    Io {
        operation: String,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// Failure reported by a third-party library (image encoding, JSON)
    External {
        library: String,
        message: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl SwsError {
    pub fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new()
                .with_severity(ErrorSeverity::Warning)
                .recoverable(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    pub fn external(
        library: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn StdError + Send + Sync>,
    ) -> Self {
        Self::External {
            library: library.into(),
            message: message.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. }
            | Self::Validation { context, .. }
            | Self::Scale { context, .. }
            | Self::NotSupported { context, .. }
            | Self::Io { context, .. }
            | Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. }
            | Self::Validation { context, .. }
            | Self::Scale { context, .. }
            | Self::NotSupported { context, .. }
            | Self::Io { context, .. }
            | Self::External { context, .. } => context,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Scale { .. } => "scale",
            Self::NotSupported { .. } => "not_supported",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }
}

impl fmt::Display for SwsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwsError::Config { source, .. } => write!(f, "Configuration error: {}", source)?,
            SwsError::Validation {
                field,
                value,
                reason,
                ..
            } => write!(
                f,
                "Validation error in '{}': {} (value: {})",
                field, reason, value
            )?,
            SwsError::Scale { source, .. } => write!(f, "Scale error: {}", source)?,
            SwsError::NotSupported { source, .. } => write!(f, "{}", source)?,
            SwsError::Io {
                operation, source, ..
            } => write!(f, "I/O error during {}: {}", operation, source)?,
            SwsError::External {
                library, message, ..
            } => write!(f, "{} error: {}", library, message)?,
        }

        let ctx = self.context();
        if let Some(operation) = &ctx.operation {
            write!(f, " [operation: {}]", operation)?;
        }
        if let Some(context) = &ctx.context {
            write!(f, " [context: {}]", context)?;
        }
        Ok(())
    }
}

impl StdError for SwsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Config { source, .. } => Some(source),
            Self::Scale { source, .. } => Some(source),
            Self::NotSupported { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            Self::Validation { .. } => None,
        }
    }
}

/// Result type alias using [`SwsError`]
pub type SwsResult<T> = Result<T, SwsError>;

/// Trait for errors that can be recovered from with a different setup
pub trait Recoverable {
    fn is_recoverable(&self) -> bool;

    fn recovery_strategies(&self) -> Vec<RecoveryStrategy>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Use a fallback format or filter
    Fallback { description: String },
    /// Rebuild the conversion context
    Reinitialize { component: String },
    /// Skip the current frame
    Skip { reason: String },
}

impl Recoverable for SwsError {
    fn is_recoverable(&self) -> bool {
        self.context().recoverable
            || matches!(
                self,
                Self::Config { .. } | Self::NotSupported { .. } | Self::Validation { .. }
            )
    }

    fn recovery_strategies(&self) -> Vec<RecoveryStrategy> {
        match self {
            Self::Config { .. } | Self::NotSupported { .. } => vec![RecoveryStrategy::Fallback {
                description: "Pick a registered format pair (see `sws formats`)".to_string(),
            }],
            Self::Validation { field, .. } => vec![RecoveryStrategy::Fallback {
                description: format!("Use the default value for '{}'", field),
            }],
            Self::Scale {
                source: ScaleError::SliceOrder { .. },
                ..
            } => vec![RecoveryStrategy::Reinitialize {
                component: "frame".to_string(),
            }],
            Self::Scale { .. } => vec![RecoveryStrategy::Skip {
                reason: "Skip the malformed frame".to_string(),
            }],
            _ => vec![],
        }
    }
}

pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for SwsError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for SwsError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

impl From<ConfigError> for SwsError {
    fn from(source: ConfigError) -> Self {
        let suggestion = match &source {
            ConfigError::UnsupportedInputFormat(_) | ConfigError::UnsupportedOutputFormat(_) => {
                "Run `sws formats` to list supported input and output formats"
            }
            ConfigError::UnsupportedFilter(_) => "Select exactly one filter",
            ConfigError::InvalidDimension { .. } => "Use dimensions between 1 and 16384",
            ConfigError::NotSupported(_) => "Check the requested format or colorspace name",
        };
        Self::Config {
            source,
            context: ErrorContext::new().with_recovery_suggestion(suggestion),
        }
    }
}

impl From<ScaleError> for SwsError {
    fn from(source: ScaleError) -> Self {
        Self::Scale {
            source,
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }
}

impl From<NotSupported> for SwsError {
    fn from(source: NotSupported) -> Self {
        Self::NotSupported {
            source,
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }
}

impl From<std::io::Error> for SwsError {
    fn from(error: std::io::Error) -> Self {
        Self::io("file operation", error)
    }
}

impl From<serde_json::Error> for SwsError {
    fn from(error: serde_json::Error) -> Self {
        let message = error.to_string();
        Self::external("serde_json", message, Box::new(error))
    }
}

impl From<image::ImageError> for SwsError {
    fn from(error: image::ImageError) -> Self {
        let message = error.to_string();
        Self::external("image", message, Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sws_core::PixelFormat;

    #[test]
    fn test_config_error_carries_suggestion() {
        let err: SwsError = ConfigError::UnsupportedOutputFormat(PixelFormat::PAL8).into();
        assert_eq!(err.category(), "config");
        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().unwrap().contains("sws formats"));
        assert!(err.to_string().contains("pal8"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_scale_error_is_critical() {
        let err: SwsError = ScaleError::OutOfBounds {
            start: 8,
            rows: 4,
            height: 10,
        }
        .into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.recovery_strategies(),
            vec![RecoveryStrategy::Skip {
                reason: "Skip the malformed frame".to_string()
            }]
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = SwsError::validation("src_size", "0x0", "dimensions must be positive")
            .with_operation("validate")
            .with_context("cli arguments")
            .with_metadata("flag", "--src-size");
        let text = err.to_string();
        assert!(text.contains("src_size"));
        assert!(text.contains("[operation: validate]"));
        assert!(text.contains("[context: cli arguments]"));
        assert_eq!(err.context().metadata.get("flag").map(String::as_str), Some("--src-size"));
    }

    #[test]
    fn test_io_conversion() {
        let err: SwsError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.category(), "io");
        assert!(err.to_string().contains("missing"));
    }
}
