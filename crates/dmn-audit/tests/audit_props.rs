//! Property tests for audit invariants.

use chrono::{DateTime, TimeZone, Utc};
use dmn_audit::{AuditRecorder, InputValue, SnapshotValue, VariableType};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn input_value_strategy() -> impl Strategy<Value = InputValue> {
    prop_oneof![
        Just(InputValue::Null),
        "[a-zA-Z0-9 ]{0,12}".prop_map(InputValue::Text),
        any::<bool>().prop_map(InputValue::Bool),
        any::<i16>().prop_map(InputValue::Short),
        any::<i32>().prop_map(InputValue::Int),
        any::<i64>().prop_map(InputValue::Long),
        (-1.0e6f32..1.0e6).prop_map(InputValue::Float),
        (-1.0e12f64..1.0e12).prop_map(InputValue::Double),
        instant_strategy().prop_map(InputValue::Instant),
        instant_strategy().prop_map(|t| InputValue::LocalDateTime(t.naive_utc())),
    ]
}

fn inputs_strategy() -> impl Strategy<Value = HashMap<String, InputValue>> {
    prop::collection::hash_map("[a-z]{1,8}", input_value_strategy(), 0..10)
}

fn expected_type(value: &InputValue) -> Option<VariableType> {
    match value {
        InputValue::Null | InputValue::Json(_) => None,
        InputValue::Text(_) => Some(VariableType::String),
        InputValue::Bool(_) => Some(VariableType::Boolean),
        InputValue::Instant(_) | InputValue::Zoned(_) | InputValue::LocalDateTime(_) => {
            Some(VariableType::Date)
        }
        _ => Some(VariableType::Number),
    }
}

proptest! {
    /// Inputs, snapshots and type tags share one key set.
    #[test]
    fn input_key_sets_match(inputs in inputs_strategy()) {
        let recorder = AuditRecorder::begin("d", "", "UNIQUE", false, &inputs);
        let audit = recorder.audit();

        let input_keys: BTreeSet<&String> = inputs.keys().collect();
        let snapshot_keys: BTreeSet<&String> = audit.input_variables().keys().collect();
        let type_keys: BTreeSet<&String> = audit.input_variable_types().keys().collect();

        prop_assert_eq!(&input_keys, &snapshot_keys);
        prop_assert_eq!(&input_keys, &type_keys);
    }

    /// Every scalar classifies to its expected tag; temporal values tag as date.
    #[test]
    fn classification_matches_category(value in input_value_strategy()) {
        prop_assert_eq!(value.variable_type(), expected_type(&value));
    }

    /// Overwriting every caller input after begin leaves the audit untouched.
    #[test]
    fn caller_mutation_is_not_observed(inputs in inputs_strategy()) {
        let mut inputs = inputs;
        let expected: BTreeMap<String, SnapshotValue> = inputs
            .iter()
            .map(|(name, value)| (name.clone(), value.snapshot()))
            .collect();
        let recorder = AuditRecorder::begin("d", "", "FIRST", false, &inputs);

        for value in inputs.values_mut() {
            *value = InputValue::Json(serde_json::json!({"mutated": true}));
        }
        inputs.insert("added".to_string(), InputValue::Null);

        prop_assert_eq!(recorder.audit().input_variables(), &expected);
    }

    /// Rule map keys equal rule numbers, condition counts equal calls, and
    /// start never follows end.
    #[test]
    fn rule_structure_invariants(
        rules in prop::collection::btree_map(1u32..50, 0u32..6, 0..8),
    ) {
        let mut recorder = AuditRecorder::begin("d", "", "RULE ORDER", false, &HashMap::new());
        for (&rule, &conditions) in &rules {
            recorder.open_rule(rule).unwrap();
            for column in 1..=conditions {
                recorder
                    .record_condition(rule, column, format!("r{rule}c{column}"), column % 2 == 0, None)
                    .unwrap();
            }
            recorder.close_rule(rule).unwrap();
        }
        let audit = recorder.finish().unwrap();

        prop_assert!(audit.start_time() <= audit.end_time().unwrap());
        prop_assert_eq!(audit.rule_executions().len(), rules.len());
        for (key, rule) in audit.rule_executions() {
            prop_assert_eq!(*key, rule.rule_number);
            prop_assert_eq!(rule.condition_results.len() as u32, rules[key]);
            prop_assert!(rule.start_time <= rule.end_time.unwrap());
        }
    }
}
