//! The sink side of a gather pass.

use crate::{Fields, MetricEmission, Tags};

/// A sink that receives metric emissions.
///
/// Adapters call [`add_fields`](Accumulator::add_fields) once per emission.
/// Implementations must record every call; nothing is deduplicated, so two
/// structurally identical emissions produce two entries.
pub trait Accumulator {
    /// Record one emission.
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: Tags);

    /// Record an already-built emission.
    fn add_emission(&mut self, emission: MetricEmission) {
        let MetricEmission {
            measurement,
            tags,
            fields,
        } = emission;
        self.add_fields(&measurement, fields, tags);
    }
}

impl Accumulator for Vec<MetricEmission> {
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: Tags) {
        self.push(MetricEmission::new(measurement, fields, tags));
    }
}

/// An in-memory accumulator that keeps emissions in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBuffer {
    emissions: Vec<MetricEmission>,
}

impl MetricBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded emissions.
    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    /// Iterate over recorded emissions in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricEmission> {
        self.emissions.iter()
    }

    /// Iterate over emissions for one measurement.
    pub fn measurement<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MetricEmission> + 'a {
        self.emissions.iter().filter(move |e| e.measurement == name)
    }

    /// Take every recorded emission, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<MetricEmission> {
        std::mem::take(&mut self.emissions)
    }

    /// Consume the buffer and return its emissions.
    pub fn into_inner(self) -> Vec<MetricEmission> {
        self.emissions
    }
}

impl Accumulator for MetricBuffer {
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: Tags) {
        self.emissions
            .push(MetricEmission::new(measurement, fields, tags));
    }
}

impl IntoIterator for MetricBuffer {
    type Item = MetricEmission;
    type IntoIter = std::vec::IntoIter<MetricEmission>;

    fn into_iter(self) -> Self::IntoIter {
        self.emissions.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;

    fn sample() -> MetricEmission {
        MetricEmission::builder("frontstream")
            .tag("name", "web")
            .field("ok", 1.0)
            .build()
    }

    #[test]
    fn test_buffer_records_duplicates() {
        let mut buffer = MetricBuffer::new();
        buffer.add_emission(sample());
        buffer.add_emission(sample());

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.measurement("frontstream").count(), 2);
        assert_eq!(buffer.measurement("upstream").count(), 0);
    }

    #[test]
    fn test_buffer_drain() {
        let mut buffer = MetricBuffer::new();
        buffer.add_emission(sample());

        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert!(buffer.is_empty());
        assert_eq!(drained[0].field("ok"), Some(&FieldValue::Float(1.0)));
    }

    #[test]
    fn test_vec_accumulator() {
        let mut out: Vec<MetricEmission> = Vec::new();
        let mut tags = Tags::new();
        tags.insert("server".to_string(), "a:1".to_string());
        out.add_fields("upstream", Fields::new(), tags);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag("server"), Some("a:1"));
    }
}
