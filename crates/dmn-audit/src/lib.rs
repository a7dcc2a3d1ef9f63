//! # dmn-audit
//!
//! Decision execution audit trail for rule-table evaluation.
//!
//! This crate records exactly what happened during one evaluation of one
//! decision:
//! - which rules were considered and which of them matched
//! - the result of every condition and conclusion cell, including failures
//! - a typed, independent snapshot of the input variables
//! - whether the decision as a whole failed
//!
//! ## Lifecycle
//!
//! | State | Legal operations |
//! |-------|------------------|
//! | `Open` | everything |
//! | `Closed` | `attach_deployment_id` only |
//!
//! ## Input snapshots
//!
//! Inputs are copied when the audit begins. Values outside the portable set
//! (null, booleans, integers, floats, instants, text) are stored as text, so
//! structured inputs lose their structure. See [`value`] for the exact rules.
//!
//! ## Example Usage
//!
//! ```rust
//! use dmn_audit::{AuditRecorder, InputValue, VariableType};
//! use std::collections::HashMap;
//!
//! # fn example() -> Result<(), dmn_audit::AuditError> {
//! let mut inputs = HashMap::new();
//! inputs.insert("amount".to_string(), InputValue::from(100));
//! inputs.insert("customer".to_string(), InputValue::from("ACME"));
//!
//! let mut recorder = AuditRecorder::begin("loanApproval", "Loan approval", "UNIQUE", true, &inputs);
//! recorder.open_rule(1)?;
//! recorder.record_condition(1, 1, "c1", true, None)?;
//! recorder.mark_rule_valid(1)?;
//! recorder.record_conclusion(1, 1, "o1", "APPROVE", None)?;
//! recorder.close_rule(1)?;
//! let audit = recorder.finish()?;
//!
//! assert_eq!(audit.input_variable_types()["amount"], Some(VariableType::Number));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod audit;
pub mod error;
pub mod recorder;
pub mod value;

pub use audit::{DecisionAudit, ExpressionExecution, RuleAudit};
pub use error::AuditError;
pub use recorder::{AuditRecorder, AuditState};
pub use value::{InputValue, SnapshotValue, VariableType};
