//! The mgd status document and checked accessors over its entries.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use mgdwatch_types::FieldValue;

use crate::AdapterError;

/// The four entry lists of a status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Inverse streams.
    Inversestream,
    /// Upstream connections.
    Upstream,
    /// Downstream applications.
    Downstream,
    /// Front streams.
    Frontstream,
}

impl Section {
    /// Sections in mapping order.
    pub const ALL: [Section; 4] = [
        Section::Inversestream,
        Section::Upstream,
        Section::Downstream,
        Section::Frontstream,
    ];

    /// The key this section uses in the status document.
    pub fn key(self) -> &'static str {
        match self {
            Section::Inversestream => "inversestream",
            Section::Upstream => "upstream",
            Section::Downstream => "downsteram",
            Section::Frontstream => "frontstream",
        }
    }

    /// Measurement name of the primary emission for entries of this section.
    ///
    /// `downsteram` is the name existing dashboards query, misspelling included.
    pub fn measurement(self) -> &'static str {
        match self {
            Section::Inversestream => "inversestream",
            Section::Upstream => "upstream",
            Section::Downstream => "downsteram",
            Section::Frontstream => "frontstream",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Identity block reported by the mgd server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "start-at")]
    pub start_at: i64,
}

/// A decoded mgd status document.
///
/// Sections that are absent or `null` decode as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusDocument {
    #[serde(default)]
    pub server: Option<ServerStatus>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub inversestream: Vec<SectionEntry>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub upstream: Vec<SectionEntry>,

    #[serde(
        default,
        rename = "downsteram",
        alias = "downstream",
        deserialize_with = "nullable_list"
    )]
    pub downstream: Vec<SectionEntry>,

    #[serde(default, deserialize_with = "nullable_list")]
    pub frontstream: Vec<SectionEntry>,
}

impl StatusDocument {
    /// Decode a status document from a raw response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, AdapterError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Entries of one section.
    pub fn section(&self, section: Section) -> &[SectionEntry] {
        match section {
            Section::Inversestream => &self.inversestream,
            Section::Upstream => &self.upstream,
            Section::Downstream => &self.downstream,
            Section::Frontstream => &self.frontstream,
        }
    }

    /// Total number of entries across all sections.
    pub fn entry_count(&self) -> usize {
        Section::ALL.iter().map(|s| self.section(*s).len()).sum()
    }
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<SectionEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SectionEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One record of a section: an untyped JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SectionEntry(Map<String, Value>);

impl SectionEntry {
    /// Wrap a JSON object.
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Iterate over every key/value pair in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// A required string value.
    pub fn str_field(&self, section: Section, key: &str) -> Result<&str, AdapterError> {
        self.get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::shape(section.key(), key, "a string"))
    }

    /// A required number, truncated toward zero.
    pub fn minute_field(&self, section: Section, key: &str) -> Result<i64, AdapterError> {
        self.get(key)
            .and_then(Value::as_f64)
            .map(|v| v.trunc() as i64)
            .ok_or_else(|| AdapterError::shape(section.key(), key, "a number"))
    }

    /// A required nested object.
    pub fn object_field(
        &self,
        section: Section,
        key: &str,
    ) -> Result<&Map<String, Value>, AdapterError> {
        self.get(key)
            .and_then(Value::as_object)
            .ok_or_else(|| AdapterError::shape(section.key(), key, "an object"))
    }

    /// An optional primitive value. Absent, `null` and composite values yield `None`.
    pub fn plain_field(&self, key: &str) -> Option<FieldValue> {
        self.get(key).and_then(to_field_value)
    }
}

impl From<Map<String, Value>> for SectionEntry {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Convert a JSON value to a metric field.
///
/// Numbers become floats; lists, objects and `null` have no field form.
pub fn to_field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(FieldValue::Float),
        Value::String(s) => Some(FieldValue::String(s.clone())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn entry(value: Value) -> SectionEntry {
        match value {
            Value::Object(map) => SectionEntry::new(map),
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_decode_sections() {
        let body = br#"{
            "server": {"name": "mgd-1", "start-at": 1700000000},
            "inversestream": [{"name": "a"}],
            "upstream": [],
            "downsteram": [{"name": "b"}, {"name": "c"}],
            "frontstream": null
        }"#;

        let doc = StatusDocument::from_slice(body).unwrap();
        assert_eq!(doc.server.as_ref().unwrap().name, "mgd-1");
        assert_eq!(doc.server.as_ref().unwrap().start_at, 1700000000);
        assert_eq!(doc.inversestream.len(), 1);
        assert!(doc.upstream.is_empty());
        assert_eq!(doc.section(Section::Downstream).len(), 2);
        assert!(doc.frontstream.is_empty());
        assert_eq!(doc.entry_count(), 3);
    }

    #[test]
    fn test_decode_downstream_alias() {
        let doc = StatusDocument::from_slice(br#"{"downstream": [{"name": "x"}]}"#).unwrap();
        assert_eq!(doc.downstream.len(), 1);
    }

    #[test]
    fn test_decode_missing_sections() {
        let doc = StatusDocument::from_slice(b"{}").unwrap();
        assert_eq!(doc.entry_count(), 0);
        assert!(doc.server.is_none());
    }

    #[test]
    fn test_decode_errors() {
        let truncated = StatusDocument::from_slice(br#"{"upstream": ["#).unwrap_err();
        assert_eq!(truncated.kind(), ErrorKind::Decode);

        let not_a_list = StatusDocument::from_slice(br#"{"upstream": {"name": "a"}}"#).unwrap_err();
        assert_eq!(not_a_list.kind(), ErrorKind::Decode);

        let not_an_object = StatusDocument::from_slice(br#"{"upstream": [1, 2]}"#).unwrap_err();
        assert_eq!(not_an_object.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_minute_field_truncates() {
        let e = entry(json!({"one-minute": 12.9, "five-minute": -3.7, "bad": "12"}));
        assert_eq!(e.minute_field(Section::Upstream, "one-minute").unwrap(), 12);
        assert_eq!(e.minute_field(Section::Upstream, "five-minute").unwrap(), -3);

        let err = e.minute_field(Section::Upstream, "bad").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
        let err = e.minute_field(Section::Upstream, "missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_str_field() {
        let e = entry(json!({"name": "orders", "src": 4}));
        assert_eq!(e.str_field(Section::Upstream, "name").unwrap(), "orders");
        match e.str_field(Section::Upstream, "src").unwrap_err() {
            AdapterError::Shape { section, key, .. } => {
                assert_eq!(section, "upstream");
                assert_eq!(key, "src");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_plain_field() {
        let e = entry(json!({"ok": true, "jobs": 3, "tag": "x", "gone": null, "list": [1]}));
        assert_eq!(e.plain_field("ok"), Some(FieldValue::Bool(true)));
        assert_eq!(e.plain_field("jobs"), Some(FieldValue::Float(3.0)));
        assert_eq!(e.plain_field("tag"), Some(FieldValue::from("x")));
        assert_eq!(e.plain_field("gone"), None);
        assert_eq!(e.plain_field("list"), None);
        assert_eq!(e.plain_field("absent"), None);
    }
}
