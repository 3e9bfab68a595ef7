//! Metric emissions - one measurement with its tags and fields.

use std::collections::BTreeMap;

use crate::FieldValue;

/// Tag set attached to an emission, keyed by tag name.
pub type Tags = BTreeMap<String, String>;

/// Field set carried by an emission, keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single metric record: measurement name, tags and fields.
///
/// Emissions own their maps. Two emissions never share a tag map, so
/// mutating one emission's tags leaves every other emission untouched.
///
/// # Example
///
/// ```rust
/// use mgdwatch_types::MetricEmission;
///
/// let emission = MetricEmission::builder("dsc")
///     .tag("server", "mgd-1:50000")
///     .tag("code", "404")
///     .field("count", 3.0)
///     .build();
///
/// assert_eq!(
///     emission.to_line_protocol(None),
///     "dsc,code=404,server=mgd-1:50000 count=3"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricEmission {
    /// Measurement name (e.g. "upstream", "dsc").
    pub measurement: String,

    /// Tags identifying the series.
    pub tags: Tags,

    /// Field values for this record.
    pub fields: Fields,
}

impl MetricEmission {
    /// Create an emission from its parts.
    pub fn new(measurement: impl Into<String>, fields: Fields, tags: Tags) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
            fields,
        }
    }

    /// Create a builder for an emission with the given measurement name.
    pub fn builder(measurement: impl Into<String>) -> MetricEmissionBuilder {
        MetricEmissionBuilder::new(measurement)
    }

    /// Get a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Get a field value.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Render this emission as a single InfluxDB line protocol line.
    ///
    /// Tags and fields are written in key order. The timestamp, if given,
    /// is in nanoseconds since the Unix epoch.
    pub fn to_line_protocol(&self, timestamp_ns: Option<u64>) -> String {
        let mut line = escape_measurement(&self.measurement);

        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", escape_key(key), value.to_line_value()))
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));

        if let Some(ts) = timestamp_ns {
            line.push(' ');
            line.push_str(&ts.to_string());
        }

        line
    }
}

/// Builder for constructing `MetricEmission` instances.
#[derive(Debug)]
pub struct MetricEmissionBuilder {
    measurement: String,
    tags: Tags,
    fields: Fields,
}

impl MetricEmissionBuilder {
    /// Create a new builder.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Tags::new(),
            fields: Fields::new(),
        }
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Copy every tag from an existing tag set.
    pub fn tags(mut self, tags: &Tags) -> Self {
        self.tags
            .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add a field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build the emission.
    pub fn build(self) -> MetricEmission {
        MetricEmission {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
        }
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let emission = MetricEmission::builder("upstream")
            .tag("name", "orders")
            .field("jobs", 2.0)
            .field("one-minute", 5_i64)
            .build();

        assert_eq!(emission.measurement, "upstream");
        assert_eq!(emission.tag("name"), Some("orders"));
        assert_eq!(emission.field("one-minute"), Some(&FieldValue::Int(5)));
        assert!(emission.field("missing").is_none());
    }

    #[test]
    fn test_builder_copies_tags() {
        let mut base = Tags::new();
        base.insert("server".to_string(), "a:1".to_string());

        let emission = MetricEmission::builder("fbs")
            .tags(&base)
            .tag("fbs", "main")
            .field("ok", true)
            .build();

        base.insert("server".to_string(), "changed".to_string());
        assert_eq!(emission.tag("server"), Some("a:1"));
        assert_eq!(emission.tags.len(), 2);
    }

    #[test]
    fn test_line_protocol_escaping() {
        let emission = MetricEmission::builder("down stream")
            .tag("name", "a,b=c")
            .tag("empty", "")
            .field("tr max", 1.25)
            .field("label", "x")
            .build();

        assert_eq!(
            emission.to_line_protocol(Some(1_700_000_000_000_000_000)),
            "down\\ stream,name=a\\,b\\=c label=\"x\",tr\\ max=1.25 1700000000000000000"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_shape() {
        let emission = MetricEmission::builder("inversestream")
            .tag("name", "job")
            .field("sw", 4_i64)
            .build();

        let json = serde_json::to_value(&emission).unwrap();
        assert_eq!(json["measurement"], "inversestream");
        assert_eq!(json["tags"]["name"], "job");
        assert_eq!(json["fields"]["sw"], 4);
    }
}
