//! Dynamically-typed metric field values.

use std::fmt;

/// A single metric field value.
///
/// Mirrors the primitive types a metrics pipeline accepts: booleans,
/// signed integers, floats and strings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// Boolean field.
    Bool(bool),
    /// Integer field, rendered with the `i` suffix in line protocol.
    Int(i64),
    /// Floating point field.
    Float(f64),
    /// String field.
    String(String),
}

impl FieldValue {
    /// Renders the value as an InfluxDB line protocol field value.
    pub fn to_line_value(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(i) => format!("{}i", i),
            FieldValue::Float(f) => format_float(*f),
            FieldValue::String(s) => {
                let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
        }
    }
}

// Line protocol has no literal for NaN or infinity.
fn format_float(f: f64) -> String {
    if f.is_finite() {
        format!("{}", f)
    } else {
        "0".to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_values() {
        assert_eq!(FieldValue::Int(12).to_line_value(), "12i");
        assert_eq!(FieldValue::Float(1.5).to_line_value(), "1.5");
        assert_eq!(FieldValue::Float(3.0).to_line_value(), "3");
        assert_eq!(FieldValue::Bool(true).to_line_value(), "true");
        assert_eq!(
            FieldValue::from(r#"say "hi"\"#).to_line_value(),
            r#""say \"hi\"\\""#
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_untagged() {
        let json = serde_json::to_string(&FieldValue::Int(4)).unwrap();
        assert_eq!(json, "4");
        let json = serde_json::to_string(&FieldValue::from("ok")).unwrap();
        assert_eq!(json, "\"ok\"");
    }
}
