//! `dmn record` command implementation.
//!
//! Replays an evaluation trace through the [`AuditRecorder`] and writes the
//! resulting audit as JSON. A trace looks like:
//!
//! ```json
//! {
//!   "decision_key": "loanApproval",
//!   "hit_policy": "UNIQUE",
//!   "strict_mode": true,
//!   "inputs": { "amount": 100, "when": "2024-03-01T12:00:00Z" },
//!   "date_inputs": ["when"],
//!   "events": [
//!     { "event": "open_rule", "rule": 1 },
//!     { "event": "condition", "rule": 1, "column": 1, "cell": "c1", "result": true },
//!     { "event": "rule_valid", "rule": 1 },
//!     { "event": "conclusion", "rule": 1, "column": 1, "cell": "o1", "value": "APPROVE" },
//!     { "event": "close_rule", "rule": 1 }
//!   ]
//! }
//! ```
//!
//! JSON has no date type, so inputs listed in `date_inputs` are parsed as
//! RFC 3339 instants. The audit is stopped after the last event.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use dmn_audit::{AuditRecorder, DecisionAudit, InputValue};
use dmn_core::DmnConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Recorded evaluation of one decision.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationTrace {
    pub decision_key: String,
    #[serde(default)]
    pub decision_name: String,
    pub hit_policy: String,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub date_inputs: Vec<String>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

/// One evaluator event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    OpenRule {
        rule: u32,
    },
    CloseRule {
        rule: u32,
    },
    RuleValid {
        rule: u32,
    },
    Condition {
        rule: u32,
        column: u32,
        cell: String,
        result: bool,
        #[serde(default)]
        error: Option<String>,
    },
    Conclusion {
        rule: u32,
        column: u32,
        cell: String,
        #[serde(default)]
        value: serde_json::Value,
        #[serde(default)]
        error: Option<String>,
    },
    Failed {
        message: String,
    },
}

fn input_variables(trace: &EvaluationTrace) -> Result<HashMap<String, InputValue>> {
    let mut inputs = HashMap::new();
    for (name, value) in &trace.inputs {
        let value = if trace.date_inputs.contains(name) {
            match value.as_str() {
                Some(s) => InputValue::Instant(
                    s.parse::<DateTime<Utc>>()
                        .with_context(|| format!("input '{}' is not an RFC 3339 instant", name))?,
                ),
                None if value.is_null() => InputValue::Null,
                None => bail!("input '{}' is listed in date_inputs but is not a string", name),
            }
        } else {
            InputValue::from(value.clone())
        };
        inputs.insert(name.clone(), value);
    }
    Ok(inputs)
}

/// Replay a trace. Returns `None` when auditing is disabled.
pub fn replay(config: &DmnConfig, trace: &EvaluationTrace) -> Result<Option<DecisionAudit>> {
    if !config.audit.enabled {
        tracing::info!(decision_key = %trace.decision_key, "Auditing disabled; nothing recorded");
        return Ok(None);
    }

    let inputs = input_variables(trace)?;
    let mut recorder = AuditRecorder::begin_with_config(
        &config.audit,
        trace.decision_key.as_str(),
        trace.decision_name.as_str(),
        trace.hit_policy.as_str(),
        trace.strict_mode,
        &inputs,
    )?;

    for (idx, event) in trace.events.iter().enumerate() {
        let applied = match event {
            TraceEvent::OpenRule { rule } => recorder.open_rule(*rule),
            TraceEvent::CloseRule { rule } => recorder.close_rule(*rule),
            TraceEvent::RuleValid { rule } => recorder.mark_rule_valid(*rule),
            TraceEvent::Condition {
                rule,
                column,
                cell,
                result,
                error,
            } => recorder.record_condition(*rule, *column, cell.as_str(), *result, error.as_deref()),
            TraceEvent::Conclusion {
                rule,
                column,
                cell,
                value,
                error,
            } => recorder.record_conclusion(
                *rule,
                *column,
                cell.as_str(),
                value.clone(),
                error.as_deref(),
            ),
            TraceEvent::Failed { message } => recorder.mark_failed(message.as_str()),
        };
        applied.with_context(|| format!("event {} ({:?}) rejected", idx + 1, event))?;
    }

    if let Some(ref deployment_id) = trace.deployment_id {
        recorder.attach_deployment_id(deployment_id.as_str());
    }
    Ok(Some(recorder.finish()?))
}

pub fn run(config: &DmnConfig, path: &Path, output: Option<&Path>, pretty: bool) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read trace {}", path.display()))?;
    let trace: EvaluationTrace = serde_json::from_str(&content)
        .with_context(|| format!("invalid trace JSON in {}", path.display()))?;

    let Some(audit) = replay(config, &trace)? else {
        return Ok(());
    };

    let json = if pretty {
        audit.to_json_pretty()?
    } else {
        audit.to_json()?
    };

    match output {
        Some(output) => {
            fs::write(output, json + "\n")
                .with_context(|| format!("cannot write audit {}", output.display()))?;
            tracing::info!(path = %output.display(), "Decision audit written");
        }
        None => println!("{}", json),
    }
    Ok(())
}
