//! Audit recorder.
//!
//! The evaluator drives one [`AuditRecorder`] per decision evaluation:
//!
//! 1. [`AuditRecorder::begin`] once, with the decision metadata and inputs
//! 2. [`open_rule`](AuditRecorder::open_rule) / [`close_rule`](AuditRecorder::close_rule)
//!    around every visited rule, with any number of condition results
//! 3. [`mark_rule_valid`](AuditRecorder::mark_rule_valid) for matching rules,
//!    followed by their conclusion results
//! 4. optionally [`mark_failed`](AuditRecorder::mark_failed)
//! 5. [`stop_audit`](AuditRecorder::stop_audit) once
//!
//! Events are stored in the order they arrive. Lifecycle violations return
//! an [`AuditError`] immediately and leave the audit unchanged.

use chrono::Utc;
use dmn_core::{AuditConfig, HitPolicy};
use std::collections::{BTreeMap, HashMap};

use crate::audit::{DecisionAudit, ExpressionExecution, RuleAudit};
use crate::error::AuditError;
use crate::value::InputValue;

/// Lifecycle state of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    /// Evaluation in progress; every operation is legal.
    Open,
    /// `stop_audit` was called; only the deployment id may still change.
    Closed,
}

/// Records the events of a single decision evaluation.
///
/// Not shared across threads: the evaluator is the only writer. Once closed,
/// the audit is handed off by value with [`AuditRecorder::into_audit`].
#[derive(Debug)]
pub struct AuditRecorder {
    audit: DecisionAudit,
    state: AuditState,
}

impl AuditRecorder {
    /// Start the audit of one decision evaluation.
    ///
    /// Stamps the start time, tags every input with its
    /// [`VariableType`](crate::VariableType) and stores an independent
    /// snapshot of each value. Later changes to `input_variables` are not
    /// observed. The hit-policy tag is stored verbatim.
    pub fn begin(
        decision_key: impl Into<String>,
        decision_name: impl Into<String>,
        hit_policy: impl Into<String>,
        strict_mode: bool,
        input_variables: &HashMap<String, InputValue>,
    ) -> Self {
        let mut variables = BTreeMap::new();
        let mut types = BTreeMap::new();
        for (name, value) in input_variables {
            types.insert(name.clone(), value.variable_type());
            variables.insert(name.clone(), value.snapshot());
        }

        let audit = DecisionAudit {
            decision_key: decision_key.into(),
            decision_name: decision_name.into(),
            hit_policy: hit_policy.into(),
            deployment_id: None,
            start_time: Utc::now(),
            end_time: None,
            input_variables: variables,
            input_variable_types: types,
            rule_executions: BTreeMap::new(),
            failed: false,
            exception_message: None,
            strict_mode,
        };

        tracing::debug!(
            decision_key = %audit.decision_key,
            hit_policy = %audit.hit_policy,
            strict_mode,
            inputs = audit.input_variables.len(),
            "Decision audit started"
        );

        Self {
            audit,
            state: AuditState::Open,
        }
    }

    /// Like [`AuditRecorder::begin`], honouring the audit configuration.
    ///
    /// With `validate_hit_policy` set, a tag that is not a canonical
    /// [`HitPolicy`] name is rejected.
    pub fn begin_with_config(
        config: &AuditConfig,
        decision_key: impl Into<String>,
        decision_name: impl Into<String>,
        hit_policy: impl Into<String>,
        strict_mode: bool,
        input_variables: &HashMap<String, InputValue>,
    ) -> Result<Self, AuditError> {
        let hit_policy = hit_policy.into();
        if config.validate_hit_policy {
            hit_policy.parse::<HitPolicy>()?;
        }

        Ok(Self::begin(
            decision_key,
            decision_name,
            hit_policy,
            strict_mode,
            input_variables,
        ))
    }

    pub fn state(&self) -> AuditState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == AuditState::Closed
    }

    /// Read access to the audit in its current state.
    pub fn audit(&self) -> &DecisionAudit {
        &self.audit
    }

    /// Hand off the audit. A recorder that was never stopped yields a
    /// partial audit without an end time.
    pub fn into_audit(self) -> DecisionAudit {
        self.audit
    }

    /// Register a rule. Rule numbers are 1-based; opening the same rule
    /// number twice is an error.
    pub fn open_rule(&mut self, rule_number: u32) -> Result<(), AuditError> {
        self.ensure_open("open_rule")?;

        if rule_number == 0 {
            return Err(AuditError::InvalidRuleNumber { rule_number });
        }

        if self.audit.rule_executions.contains_key(&rule_number) {
            return Err(AuditError::DuplicateRule { rule_number });
        }
        self.audit
            .rule_executions
            .insert(rule_number, RuleAudit::new(rule_number));
        Ok(())
    }

    /// Stamp the end time of a rule.
    pub fn close_rule(&mut self, rule_number: u32) -> Result<(), AuditError> {
        self.ensure_open("close_rule")?;

        let rule = self.rule_mut(rule_number)?;
        if rule.is_closed() {
            return Err(AuditError::RuleAlreadyClosed { rule_number });
        }
        let now = Utc::now();
        rule.end_time = Some(now.max(rule.start_time));
        Ok(())
    }

    /// Mark a rule as matched. Idempotent.
    pub fn mark_rule_valid(&mut self, rule_number: u32) -> Result<(), AuditError> {
        self.ensure_open("mark_rule_valid")?;

        self.rule_mut(rule_number)?.valid = true;
        Ok(())
    }

    /// Record the result of a condition cell under its input column.
    ///
    /// A failed cell keeps `result` next to its `exception_message`; the
    /// audit as a whole is not marked failed.
    pub fn record_condition(
        &mut self,
        rule_number: u32,
        input_column: u32,
        cell_id: impl Into<String>,
        result: bool,
        exception_message: Option<&str>,
    ) -> Result<(), AuditError> {
        self.ensure_open("record_condition")?;

        let rule = self.rule_mut(rule_number)?;
        if rule.condition_results.contains_key(&input_column) {
            return Err(AuditError::DuplicateCondition {
                rule_number,
                column: input_column,
            });
        }
        rule.condition_results.insert(
            input_column,
            execution(cell_id, serde_json::Value::Bool(result), exception_message),
        );
        Ok(())
    }

    /// Record the value produced by a conclusion cell under its output column.
    ///
    /// The rule must already be marked valid.
    pub fn record_conclusion(
        &mut self,
        rule_number: u32,
        output_column: u32,
        cell_id: impl Into<String>,
        value: impl Into<serde_json::Value>,
        exception_message: Option<&str>,
    ) -> Result<(), AuditError> {
        self.ensure_open("record_conclusion")?;

        let rule = self.rule_mut(rule_number)?;
        if !rule.valid {
            return Err(AuditError::ConclusionForInvalidRule { rule_number });
        }
        if rule.conclusion_results.contains_key(&output_column) {
            return Err(AuditError::DuplicateConclusion {
                rule_number,
                column: output_column,
            });
        }
        rule.conclusion_results.insert(
            output_column,
            execution(cell_id, value.into(), exception_message),
        );
        Ok(())
    }

    /// Mark the whole decision as failed.
    ///
    /// A second call replaces the earlier message. Not allowed after
    /// `stop_audit`.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), AuditError> {
        self.ensure_open("mark_failed")?;

        let message = message.into();
        if self.audit.failed {
            tracing::warn!(
                decision_key = %self.audit.decision_key,
                previous = ?self.audit.exception_message,
                replacement = %message,
                "Decision audit already failed; replacing exception message"
            );
        }
        self.audit.failed = true;
        self.audit.exception_message = Some(message);
        Ok(())
    }

    /// Attach the deployment id. Legal in both states.
    pub fn attach_deployment_id(&mut self, deployment_id: impl Into<String>) {
        self.audit.set_deployment_id(deployment_id);
    }

    /// Stamp the end time and close the audit.
    pub fn stop_audit(&mut self) -> Result<(), AuditError> {
        self.ensure_open("stop_audit")?;

        // Wall clock may step backwards; end never precedes start.
        let now = Utc::now();
        self.audit.end_time = Some(now.max(self.audit.start_time));
        self.state = AuditState::Closed;

        tracing::debug!(
            decision_key = %self.audit.decision_key,
            rules = self.audit.rule_executions.len(),
            failed = self.audit.failed,
            "Decision audit stopped"
        );
        Ok(())
    }

    /// Stop the audit and hand it off.
    pub fn finish(mut self) -> Result<DecisionAudit, AuditError> {
        self.stop_audit()?;
        Ok(self.audit)
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), AuditError> {
        match self.state {
            AuditState::Open => Ok(()),
            AuditState::Closed => Err(AuditError::AuditClosed { operation }),
        }
    }

    fn rule_mut(&mut self, rule_number: u32) -> Result<&mut RuleAudit, AuditError> {
        self.audit
            .rule_executions
            .get_mut(&rule_number)
            .ok_or(AuditError::UnknownRule { rule_number })
    }
}

fn execution(
    cell_id: impl Into<String>,
    result: serde_json::Value,
    exception_message: Option<&str>,
) -> ExpressionExecution {
    match exception_message {
        Some(msg) => ExpressionExecution::failed(cell_id, msg, result),
        None => ExpressionExecution::new(cell_id, result),
    }
}
