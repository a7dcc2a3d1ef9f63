//! Decision audit data model.
//!
//! A [`DecisionAudit`] is the record of one decision evaluation. It holds one
//! [`RuleAudit`] per visited rule, and each rule holds one
//! [`ExpressionExecution`] per evaluated condition or conclusion cell.
//!
//! The audit is built by [`crate::AuditRecorder`]. Consumers only get shared
//! access; the deployment id is the one field that can be set afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AuditError;
use crate::value::{SnapshotValue, VariableType};

/// Result of evaluating one cell of a decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionExecution {
    /// Identifier of the cell in the decision definition.
    pub expression_id: String,

    /// Boolean for conditions, the produced value for conclusions.
    pub result: serde_json::Value,

    /// Set when the cell failed to evaluate. `result` is kept regardless.
    pub exception_message: Option<String>,
}

impl ExpressionExecution {
    pub fn new(expression_id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            expression_id: expression_id.into(),
            result,
            exception_message: None,
        }
    }

    pub fn failed(
        expression_id: impl Into<String>,
        exception_message: impl Into<String>,
        result: serde_json::Value,
    ) -> Self {
        Self {
            expression_id: expression_id.into(),
            result,
            exception_message: Some(exception_message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.exception_message.is_some()
    }
}

/// Audit of one rule (table row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAudit {
    /// 1-based rule number as assigned by the decision definition.
    pub rule_number: u32,

    pub start_time: DateTime<Utc>,

    /// Unset until the evaluator closes the rule.
    pub end_time: Option<DateTime<Utc>>,

    /// The rule matched and produced output.
    pub valid: bool,

    /// Keyed by input column number.
    pub condition_results: BTreeMap<u32, ExpressionExecution>,

    /// Keyed by output column number.
    pub conclusion_results: BTreeMap<u32, ExpressionExecution>,
}

impl RuleAudit {
    pub(crate) fn new(rule_number: u32) -> Self {
        Self {
            rule_number,
            start_time: Utc::now(),
            end_time: None,
            valid: false,
            condition_results: BTreeMap::new(),
            conclusion_results: BTreeMap::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Format the rule as a human-readable log line.
    ///
    /// Format: `rule=N valid=... conditions=[col:result,...] conclusions=[...]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "rule={} valid={} conditions=[{}]",
            self.rule_number,
            self.valid,
            format_results(&self.condition_results)
        );

        if !self.conclusion_results.is_empty() {
            line.push_str(&format!(
                " conclusions=[{}]",
                format_results(&self.conclusion_results)
            ));
        }

        let errors: Vec<String> = self
            .condition_results
            .values()
            .chain(self.conclusion_results.values())
            .filter_map(|e| {
                e.exception_message
                    .as_ref()
                    .map(|msg| format!("{}:\"{}\"", e.expression_id, msg.replace('"', "'")))
            })
            .collect();
        if !errors.is_empty() {
            line.push_str(&format!(" errors=[{}]", errors.join(",")));
        }

        line
    }
}

fn format_results(results: &BTreeMap<u32, ExpressionExecution>) -> String {
    results
        .iter()
        .map(|(column, e)| format!("{}:{}", column, e.result))
        .collect::<Vec<_>>()
        .join(",")
}

/// Audit of one decision evaluation.
///
/// Serialized field names are a stable contract: `decisionKey`,
/// `decisionName`, `hitPolicy`, `dmnDeploymentId`, `startTime`, `endTime`,
/// `inputVariables`, `inputVariableTypes`, `ruleExecutions`, `failed`,
/// `exceptionMessage`, `strictMode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionAudit {
    pub(crate) decision_key: String,
    pub(crate) decision_name: String,
    pub(crate) hit_policy: String,
    #[serde(rename = "dmnDeploymentId")]
    pub(crate) deployment_id: Option<String>,
    pub(crate) start_time: DateTime<Utc>,
    pub(crate) end_time: Option<DateTime<Utc>>,
    pub(crate) input_variables: BTreeMap<String, SnapshotValue>,
    pub(crate) input_variable_types: BTreeMap<String, Option<VariableType>>,
    pub(crate) rule_executions: BTreeMap<u32, RuleAudit>,
    pub(crate) failed: bool,
    pub(crate) exception_message: Option<String>,
    pub(crate) strict_mode: bool,
}

impl DecisionAudit {
    pub fn decision_key(&self) -> &str {
        &self.decision_key
    }

    pub fn decision_name(&self) -> &str {
        &self.decision_name
    }

    /// Hit-policy tag as supplied by the evaluator.
    pub fn hit_policy(&self) -> &str {
        &self.hit_policy
    }

    pub fn deployment_id(&self) -> Option<&str> {
        self.deployment_id.as_deref()
    }

    /// Attach the deployment id. Allowed at any time, including after the
    /// audit was stopped and handed off.
    pub fn set_deployment_id(&mut self, deployment_id: impl Into<String>) {
        self.deployment_id = Some(deployment_id.into());
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Wall-clock duration of the evaluation, once stopped.
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn input_variables(&self) -> &BTreeMap<String, SnapshotValue> {
        &self.input_variables
    }

    pub fn input_variable_types(&self) -> &BTreeMap<String, Option<VariableType>> {
        &self.input_variable_types
    }

    pub fn rule_executions(&self) -> &BTreeMap<u32, RuleAudit> {
        &self.rule_executions
    }

    pub fn rule(&self, rule_number: u32) -> Option<&RuleAudit> {
        self.rule_executions.get(&rule_number)
    }

    /// Rules that matched, in rule-number order.
    pub fn valid_rules(&self) -> impl Iterator<Item = &RuleAudit> {
        self.rule_executions.values().filter(|r| r.valid)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn exception_message(&self) -> Option<&str> {
        self.exception_message.as_deref()
    }

    pub fn is_strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Whether `stop_audit` has stamped the end time.
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a serialized audit.
    ///
    /// Inputs tagged `date` come back from JSON as text; they are restored to
    /// instants here. Integer and float widths are not recoverable and read
    /// back as 64-bit.
    ///
    /// The parsed audit must satisfy the same invariants the recorder keeps,
    /// otherwise [`AuditError::InvalidAudit`] is returned.
    pub fn from_json(json: &str) -> Result<Self, AuditError> {
        let mut audit: DecisionAudit = serde_json::from_str(json)?;
        audit.restore_instants();
        audit.validate()?;
        Ok(audit)
    }

    fn validate(&self) -> Result<(), AuditError> {
        if !self.input_variables.keys().eq(self.input_variable_types.keys()) {
            return Err(invalid(
                "inputVariables and inputVariableTypes have different keys",
            ));
        }

        if self.end_time.is_some_and(|end| end < self.start_time) {
            return Err(invalid("endTime precedes startTime"));
        }

        for (&key, rule) in &self.rule_executions {
            if key != rule.rule_number {
                return Err(invalid(format!(
                    "ruleExecutions key {} holds ruleNumber {}",
                    key, rule.rule_number
                )));
            }
            if key == 0 {
                return Err(invalid("rule numbers start at 1"));
            }
            if rule.end_time.is_some_and(|end| end < rule.start_time) {
                return Err(invalid(format!("rule {} ends before it starts", key)));
            }
            if !rule.valid && !rule.conclusion_results.is_empty() {
                return Err(invalid(format!(
                    "rule {} has conclusions but is not valid",
                    key
                )));
            }
        }

        Ok(())
    }

    fn restore_instants(&mut self) {
        for (name, tag) in &self.input_variable_types {
            if *tag != Some(VariableType::Date) {
                continue;
            }
            if let Some(value) = self.input_variables.get_mut(name) {
                let parsed = value
                    .as_text()
                    .and_then(|s| s.parse::<DateTime<Utc>>().ok());
                if let Some(instant) = parsed {
                    *value = SnapshotValue::Instant(instant);
                }
            }
        }
    }

    /// Format the audit as a human-readable log line.
    ///
    /// Format: `[start] DECISION key=... policy=... rules=N valid=[..] [failed error=...]`
    pub fn to_log_line(&self) -> String {
        let valid: Vec<String> = self
            .valid_rules()
            .map(|r| r.rule_number.to_string())
            .collect();

        let mut line = format!(
            "[{}] DECISION key={} policy=\"{}\" strict={} rules={} valid=[{}]",
            self.start_time.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.decision_key,
            self.hit_policy,
            self.strict_mode,
            self.rule_executions.len(),
            valid.join(","),
        );

        if !self.decision_name.is_empty() {
            line.push_str(&format!(" name=\"{}\"", self.decision_name));
        }

        if let Some(ref deployment_id) = self.deployment_id {
            line.push_str(&format!(" deployment={}", deployment_id));
        }

        if let Some(duration) = self.duration() {
            line.push_str(&format!(" duration_ms={}", duration.num_milliseconds()));
        }

        if self.failed {
            line.push_str(" failed=true");
            if let Some(ref msg) = self.exception_message {
                line.push_str(&format!(" error=\"{}\"", msg.replace('"', "'")));
            }
        }

        line
    }
}

fn invalid(reason: impl Into<String>) -> AuditError {
    AuditError::InvalidAudit {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::AuditRecorder;
    use crate::value::InputValue;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;

    fn sample_audit() -> DecisionAudit {
        let mut inputs = HashMap::new();
        inputs.insert("amount".to_string(), InputValue::Int(100));
        inputs.insert("customer".to_string(), InputValue::from("ACME"));
        inputs.insert(
            "when".to_string(),
            InputValue::from(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        );
        inputs.insert("note".to_string(), InputValue::Null);

        let mut recorder =
            AuditRecorder::begin("loanApproval", "Loan approval", "UNIQUE", true, &inputs);
        recorder.open_rule(1).unwrap();
        recorder.record_condition(1, 1, "c1", true, None).unwrap();
        recorder
            .record_condition(1, 2, "c2", false, Some("div by zero"))
            .unwrap();
        recorder.close_rule(1).unwrap();
        recorder.open_rule(2).unwrap();
        recorder.record_condition(2, 1, "c3", true, None).unwrap();
        recorder.mark_rule_valid(2).unwrap();
        recorder.close_rule(2).unwrap();
        recorder
            .record_conclusion(2, 1, "o1", json!("APPROVE"), None)
            .unwrap();
        recorder.stop_audit().unwrap();
        recorder.attach_deployment_id("dep-1");
        recorder.into_audit()
    }

    #[test]
    fn test_contract_field_names() {
        let value = serde_json::to_value(sample_audit()).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "decisionKey",
                "decisionName",
                "dmnDeploymentId",
                "endTime",
                "exceptionMessage",
                "failed",
                "hitPolicy",
                "inputVariableTypes",
                "inputVariables",
                "ruleExecutions",
                "startTime",
                "strictMode",
            ]
        );

        let rule = &value["ruleExecutions"]["1"];
        assert_eq!(rule["ruleNumber"], json!(1));
        assert_eq!(rule["conditionResults"]["2"]["expressionId"], json!("c2"));
        assert_eq!(
            rule["conditionResults"]["2"]["exceptionMessage"],
            json!("div by zero")
        );
        assert_eq!(value["inputVariableTypes"]["note"], json!(null));
        assert_eq!(value["inputVariables"]["when"], json!("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_json_round_trip_restores_instants() {
        let audit = sample_audit();
        let parsed = DecisionAudit::from_json(&audit.to_json().unwrap()).unwrap();

        assert_eq!(
            parsed.input_variables()["when"].as_instant(),
            audit.input_variables()["when"].as_instant()
        );
        assert_eq!(parsed.input_variables()["amount"], SnapshotValue::Long(100));
        assert_eq!(parsed.rule_executions(), audit.rule_executions());
        assert_eq!(parsed.deployment_id(), Some("dep-1"));
    }

    #[test]
    fn test_text_that_looks_like_a_date_stays_text() {
        let mut inputs = HashMap::new();
        inputs.insert("code".to_string(), InputValue::from("2024-01-02T03:04:05Z"));
        let mut recorder = AuditRecorder::begin("d", "", "FIRST", false, &inputs);
        recorder.stop_audit().unwrap();

        let json = recorder.audit().to_json().unwrap();
        let parsed = DecisionAudit::from_json(&json).unwrap();
        assert_eq!(
            parsed.input_variables()["code"].as_text(),
            Some("2024-01-02T03:04:05Z")
        );
    }

    #[test]
    fn test_non_finite_inputs_survive_round_trip() {
        let mut inputs = HashMap::new();
        inputs.insert("x".to_string(), InputValue::Double(f64::NAN));
        inputs.insert("y".to_string(), InputValue::Float(f32::INFINITY));
        let recorder = AuditRecorder::begin("d", "", "FIRST", false, &inputs);
        let audit = recorder.finish().unwrap();

        let parsed = DecisionAudit::from_json(&audit.to_json().unwrap()).unwrap();
        assert_eq!(parsed.input_variables()["x"].as_text(), Some("NaN"));
        assert_eq!(parsed.input_variables()["y"].as_text(), Some("inf"));
        assert_eq!(parsed.input_variable_types()["x"], Some(VariableType::Number));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = DecisionAudit::from_json("{\"decisionKey\": 1}").unwrap_err();
        assert!(matches!(err, AuditError::SerializationError(_)));
        assert!(!err.is_protocol_error());
    }

    fn sample_json() -> serde_json::Value {
        serde_json::to_value(sample_audit()).unwrap()
    }

    fn parse(value: serde_json::Value) -> Result<DecisionAudit, AuditError> {
        DecisionAudit::from_json(&value.to_string())
    }

    #[test]
    fn test_from_json_accepts_recorded_audit() {
        assert!(parse(sample_json()).is_ok());
    }

    #[test]
    fn test_from_json_rejects_mismatched_rule_key() {
        let mut value = sample_json();
        value["ruleExecutions"]["1"]["ruleNumber"] = json!(7);

        let err = parse(value).unwrap_err();
        assert!(matches!(err, AuditError::InvalidAudit { .. }));
        assert!(!err.is_protocol_error());
    }

    #[test]
    fn test_from_json_rejects_rule_zero() {
        let mut value = sample_json();
        let mut rule = value["ruleExecutions"]["1"].clone();
        rule["ruleNumber"] = json!(0);
        value["ruleExecutions"]["0"] = rule;

        assert!(matches!(parse(value), Err(AuditError::InvalidAudit { .. })));
    }

    #[test]
    fn test_from_json_rejects_mismatched_input_keys() {
        let mut value = sample_json();
        value["inputVariables"]["extra"] = json!("x");

        assert!(matches!(parse(value), Err(AuditError::InvalidAudit { .. })));
    }

    #[test]
    fn test_from_json_rejects_end_before_start() {
        let mut value = sample_json();
        let start: DateTime<Utc> =
            serde_json::from_value(value["startTime"].clone()).unwrap();
        value["endTime"] = json!(start - Duration::days(1));

        let err = parse(value).unwrap_err();
        assert!(err.to_string().contains("endTime precedes startTime"));
    }

    #[test]
    fn test_from_json_rejects_rule_end_before_start() {
        let mut value = sample_json();
        let start: DateTime<Utc> =
            serde_json::from_value(value["ruleExecutions"]["2"]["startTime"].clone()).unwrap();
        value["ruleExecutions"]["2"]["endTime"] = json!(start - Duration::seconds(5));

        assert!(matches!(parse(value), Err(AuditError::InvalidAudit { .. })));
    }

    #[test]
    fn test_from_json_rejects_conclusion_on_invalid_rule() {
        let mut value = sample_json();
        value["ruleExecutions"]["1"]["conclusionResults"]["1"] = json!({
            "expressionId": "o1",
            "result": "DECLINE",
            "exceptionMessage": null
        });

        assert!(matches!(parse(value), Err(AuditError::InvalidAudit { .. })));
    }

    #[test]
    fn test_to_log_line() {
        let line = sample_audit().to_log_line();
        assert!(line.contains("DECISION key=loanApproval"));
        assert!(line.contains("policy=\"UNIQUE\""));
        assert!(line.contains("rules=2 valid=[2]"));
        assert!(line.contains("deployment=dep-1"));
        assert!(!line.contains("failed=true"));
    }

    #[test]
    fn test_rule_log_line() {
        let audit = sample_audit();
        let line = audit.rule(1).unwrap().to_log_line();
        assert_eq!(
            line,
            "rule=1 valid=false conditions=[1:true,2:false] errors=[c2:\"div by zero\"]"
        );

        let line = audit.rule(2).unwrap().to_log_line();
        assert_eq!(line, "rule=2 valid=true conditions=[1:true] conclusions=[1:\"APPROVE\"]");
    }

    #[test]
    fn test_serialized_audit_validates_against_schema() {
        let instance = serde_json::to_value(sample_audit()).expect("audit must serialize");
        let schema: serde_json::Value =
            serde_json::from_str(include_str!("../../../schemas/DecisionAudit.schema.json"))
                .expect("schema must parse");

        let validator = jsonschema::draft202012::options()
            .build(&schema)
            .expect("schema must compile");

        if !validator.is_valid(&instance) {
            let mut msgs = Vec::new();
            for (idx, err) in validator.iter_errors(&instance).take(20).enumerate() {
                msgs.push(format!("{}: {}", idx + 1, err));
            }
            panic!("decision audit did not validate: {}", msgs.join("; "));
        }
    }
}
