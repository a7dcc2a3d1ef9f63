//! Input variable values and their audit representation.
//!
//! The evaluator hands the recorder a map of [`InputValue`]s taken from the
//! caller's environment. The recorder keeps two things per variable:
//!
//! - a [`VariableType`] tag (`string`, `date`, `number`, `boolean`, or none)
//! - an independent [`SnapshotValue`] copy
//!
//! ## Snapshot degradation
//!
//! Snapshots are restricted to a small portable set: null, booleans,
//! integers and floats of the original width, UTC instants, and text.
//! Anything outside that set is stored as its textual form:
//!
//! | Input | Snapshot |
//! |-------|----------|
//! | `Zoned` / `LocalDateTime` | `Instant` (local date-times are read as UTC) |
//! | `Json` (arrays, objects, nested values) | `Text` holding the compact JSON |
//! | non-finite `Float` / `Double` | `Text` (`NaN`, `inf`, `-inf`); the tag stays `number` |
//!
//! Structure and precision beyond that set are lost. Consumers that need the
//! original value must keep it themselves.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Runtime value of one input variable as provided by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Text(String),
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Absolute instant.
    Instant(DateTime<Utc>),
    /// Date-time with a fixed UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// Date-time without zone information.
    LocalDateTime(NaiveDateTime),
    /// Structured domain value.
    Json(serde_json::Value),
}

impl InputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Instant(_) | Self::Zoned(_) | Self::LocalDateTime(_)
        )
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Short(_) | Self::Int(_) | Self::Long(_) | Self::Float(_) | Self::Double(_)
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Classify this value into its audit type tag.
    ///
    /// Checks run in priority order: null, text, temporal, numeric, boolean.
    /// Temporal values are tested before numeric ones so a date-time always
    /// tags as `date`. Anything else is unclassified (`None`).
    pub fn variable_type(&self) -> Option<VariableType> {
        if self.is_null() {
            None
        } else if self.is_text() {
            Some(VariableType::String)
        } else if self.is_temporal() {
            Some(VariableType::Date)
        } else if self.is_number() {
            Some(VariableType::Number)
        } else if self.is_bool() {
            Some(VariableType::Boolean)
        } else {
            None
        }
    }

    /// Take an independent copy suitable for the audit.
    ///
    /// See the module docs for how values outside the portable set degrade.
    pub fn snapshot(&self) -> SnapshotValue {
        match self {
            Self::Null => SnapshotValue::Null,
            Self::Bool(b) => SnapshotValue::Bool(*b),
            Self::Short(n) => SnapshotValue::Short(*n),
            Self::Int(n) => SnapshotValue::Int(*n),
            Self::Long(n) => SnapshotValue::Long(*n),
            // JSON has no NaN or infinity.
            Self::Float(n) if !n.is_finite() => SnapshotValue::Text(n.to_string()),
            Self::Double(n) if !n.is_finite() => SnapshotValue::Text(n.to_string()),
            Self::Float(n) => SnapshotValue::Float(*n),
            Self::Double(n) => SnapshotValue::Double(*n),
            Self::Instant(t) => SnapshotValue::Instant(*t),
            Self::Zoned(t) => SnapshotValue::Instant(t.with_timezone(&Utc)),
            Self::LocalDateTime(t) => SnapshotValue::Instant(t.and_utc()),
            Self::Text(s) => SnapshotValue::Text(s.clone()),
            Self::Json(v) => SnapshotValue::Text(v.to_string()),
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "{}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Short(n) => write!(f, "{}", n),
            Self::Int(n) => write!(f, "{}", n),
            Self::Long(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Double(n) => write!(f, "{}", n),
            Self::Instant(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Zoned(t) => write!(f, "{}", t.to_rfc3339()),
            Self::LocalDateTime(t) => write!(f, "{}", t),
            Self::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i16> for InputValue {
    fn from(value: i16) -> Self {
        Self::Short(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for InputValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<DateTime<Utc>> for InputValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<DateTime<FixedOffset>> for InputValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Zoned(value)
    }
}

impl From<NaiveDateTime> for InputValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::LocalDateTime(value)
    }
}

impl<T: Into<InputValue>> From<Option<T>> for InputValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Scalars map onto their native variants; arrays and objects stay structured.
impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::String(s) => Self::Text(s),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Long(i),
                (None, Some(f)) => Self::Double(f),
                (None, None) => Self::Json(Value::Number(n)),
            },
            other => Self::Json(other),
        }
    }
}

/// Type tag recorded for each input variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Date,
    Number,
    Boolean,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Date => "date",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent copy of an input value as stored in the audit.
///
/// Serialized untagged: `null`, a boolean, a number, an RFC 3339 string for
/// instants, or a string. Deserialization cannot tell instants from text or
/// recover integer widths; [`crate::DecisionAudit::from_json`] restores
/// instants from the recorded type tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Null,
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Instant(DateTime<Utc>),
    Text(String),
}

impl SnapshotValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Instant(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SnapshotValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde_json::Value;

        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Long(i),
                (None, Some(f)) => Self::Double(f),
                (None, None) => Self::Text(n.to_string()),
            },
            Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        })
    }
}
