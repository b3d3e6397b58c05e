use thiserror::Error;

use super::issues::IssueSink;

/// Errors that abort a conversion.
///
/// Recoverable tax anomalies are never raised through this type; they are
/// recorded as [`ConversionIssue`](super::ConversionIssue)s in an
/// [`IssueSink`] and processing continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// A required identifier or amount is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// XML reading or writing failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Conversion settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(String),

    /// Strict mode refused a document carrying error-level issues.
    #[error(
        "conversion rejected: {} error-level issue(s), first: {}",
        .issues.count(super::Severity::Error),
        .issues.first_error().map(|i| i.to_string()).unwrap_or_default()
    )]
    Rejected {
        /// Every issue collected for the rejected document.
        issues: IssueSink,
    },
}

impl ConversionError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Prefix an `InvalidInput` message with a document locator.
    pub(crate) fn in_context(self, context: &str) -> Self {
        match self {
            Self::InvalidInput(message) => Self::InvalidInput(format!("{context}: {message}")),
            other => other,
        }
    }
}
