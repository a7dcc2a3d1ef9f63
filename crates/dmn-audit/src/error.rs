//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur while recording or reading a decision audit.
///
/// Everything except [`AuditError::SerializationError`],
/// [`AuditError::InvalidAudit`] and [`AuditError::UnknownHitPolicy`] is a
/// protocol error: the evaluator called the recorder out of order. Protocol
/// errors are not recoverable and should abort the evaluation.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The rule number was opened twice.
    #[error("rule {rule_number} is already open in this audit")]
    DuplicateRule { rule_number: u32 },

    /// An event targeted a rule that was never opened.
    #[error("rule {rule_number} was never opened")]
    UnknownRule { rule_number: u32 },

    /// Rule numbers are 1-based.
    #[error("rule number must be at least 1, got {rule_number}")]
    InvalidRuleNumber { rule_number: u32 },

    /// The rule was closed twice.
    #[error("rule {rule_number} is already closed")]
    RuleAlreadyClosed { rule_number: u32 },

    /// A condition result for this input column already exists.
    #[error("condition for input column {column} of rule {rule_number} is already recorded")]
    DuplicateCondition { rule_number: u32, column: u32 },

    /// A conclusion result for this output column already exists.
    #[error("conclusion for output column {column} of rule {rule_number} is already recorded")]
    DuplicateConclusion { rule_number: u32, column: u32 },

    /// A conclusion was recorded for a rule that has not been marked valid.
    #[error("rule {rule_number} is not valid; conclusions are only recorded for valid rules")]
    ConclusionForInvalidRule { rule_number: u32 },

    /// A mutating operation was called after `stop_audit`.
    #[error("audit is closed: '{operation}' is not allowed after stop_audit")]
    AuditClosed { operation: &'static str },

    /// Hit-policy validation is enabled and the tag is not canonical.
    #[error(transparent)]
    UnknownHitPolicy(#[from] dmn_core::UnknownHitPolicy),

    /// A parsed audit does not hold together.
    #[error("invalid audit: {reason}")]
    InvalidAudit { reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AuditError {
    /// Whether the error reports a lifecycle violation by the caller.
    pub fn is_protocol_error(&self) -> bool {
        !matches!(
            self,
            Self::SerializationError(_) | Self::InvalidAudit { .. } | Self::UnknownHitPolicy(_)
        )
    }
}
