//! Operation Result
//!
//! The uniform outcome of one action on one resource.

use std::fmt;

/// Why an action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or empty resource handle, detected before any provider call
    InvalidInput,
    /// Provider answered 403
    PermissionDenied,
    /// Provider answered 404
    NotFound,
    /// Any other provider-reported failure
    Provider,
    /// Transport errors, panics, anything not reported by the provider
    Unexpected,
    /// Batch was cancelled before this item started
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid-input",
            Self::PermissionDenied => "permission-denied",
            Self::NotFound => "not-found",
            Self::Provider => "provider-error",
            Self::Unexpected => "unexpected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single action invocation.
///
/// Built complete and never mutated afterwards. A failure always carries the
/// reason as its message; a success carries a confirmation for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success { message: String },
    Failure { kind: FailureKind, message: String },
}

impl OperationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::Failure { message, .. } => message,
        }
    }

    /// Failure kind, `None` on success
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Status icon used by console output
    pub fn icon(&self) -> &'static str {
        if self.is_success() {
            "✓"
        } else {
            "✗"
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.message())
    }
}
