//! Flattens a status document into metric emissions.
//!
//! Every entry produces one primary emission whose measurement is tied to
//! its section. Downstream entries may also carry dynamically-named
//! sub-objects (`code-404`, `fbs-main`) that become secondary emissions,
//! driven by an ordered list of [`PrefixRule`]s.

use mgdwatch_types::{Fields, MetricEmission, Tags};

use super::status::{to_field_value, Section, SectionEntry, StatusDocument};
use crate::AdapterError;

/// Latency percentiles looked up under `tr-percentiles`, in emission order.
pub const PERCENTILES: [&str; 5] = ["50", "75", "95", "99", "999"];

/// Fields extracted from one section's entries.
struct EntryShape {
    section: Section,
    /// Required string keys copied into tags.
    tags: &'static [&'static str],
    /// Copied as-is when present.
    plain: &'static [&'static str],
    /// Required numbers, truncated to integers.
    minutes: &'static [&'static str],
    /// Whether `tr-percentiles` is required.
    percentiles: bool,
}

const INVERSESTREAM: EntryShape = EntryShape {
    section: Section::Inversestream,
    tags: &["name"],
    plain: &["ok", "jobs"],
    minutes: &[
        "one-minute",
        "five-minute",
        "fifteen-minute",
        "sw-one-minute",
        "sw-five-minute",
        "sw-fifteen-minute",
    ],
    percentiles: false,
};

const UPSTREAM: EntryShape = EntryShape {
    section: Section::Upstream,
    tags: &["name", "src"],
    plain: &[
        "ok", "jobs", "fail", "idling", "success", "current", "tr-min", "tr-max",
    ],
    minutes: &["one-minute", "five-minute", "fifteen-minute"],
    percentiles: true,
};

const DOWNSTREAM: EntryShape = EntryShape {
    section: Section::Downstream,
    tags: &["name", "app"],
    plain: &["ok", "jobs", "fail", "success", "current", "tr-min", "tr-max"],
    minutes: &["one-minute", "five-minute", "fifteen-minute"],
    percentiles: true,
};

const FRONTSTREAM: EntryShape = EntryShape {
    section: Section::Frontstream,
    tags: &["name"],
    plain: &["ok", "jobs", "fail"],
    minutes: &["one-minute", "five-minute", "fifteen-minute"],
    percentiles: false,
};

/// Routes a dynamically-named Downstream key to a secondary emission.
///
/// A key `"<prefix><suffix>"` whose value is an object becomes an emission
/// named `measurement`, tagged `tag = suffix` on top of the entry's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    pub prefix: String,
    pub tag: String,
    pub measurement: String,
}

impl PrefixRule {
    /// Create a rule.
    pub fn new(
        prefix: impl Into<String>,
        tag: impl Into<String>,
        measurement: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            tag: tag.into(),
            measurement: measurement.into(),
        }
    }

    /// The suffix of `key` if this rule's prefix matches.
    pub fn strip<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.prefix.as_str())
    }
}

/// Maps status documents to emissions. Holds no per-document state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMapper {
    rules: Vec<PrefixRule>,
}

impl Default for StatusMapper {
    fn default() -> Self {
        Self {
            rules: vec![
                PrefixRule::new("code-", "code", "dsc"),
                PrefixRule::new("fbs-", "fbs", "fbs"),
            ],
        }
    }
}

impl StatusMapper {
    /// A mapper with the `code-` and `fbs-` rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapper with no secondary-emission rules.
    pub fn without_rules() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a prefix rule. Earlier rules win when several prefixes match.
    pub fn with_rule(mut self, rule: PrefixRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The active prefix rules, in evaluation order.
    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    /// Map a document to emissions.
    ///
    /// Sections are processed in the order inversestream, upstream,
    /// downstream, frontstream. Any shape error aborts the whole document.
    pub fn map(
        &self,
        document: &StatusDocument,
        base_tags: &Tags,
    ) -> Result<Vec<MetricEmission>, AdapterError> {
        let mut out = Vec::with_capacity(document.entry_count());

        for entry in &document.inversestream {
            let mut emission = primary(&INVERSESTREAM, entry, base_tags)?;
            // sw mirrors fifteen-minute.
            if let Some(fifteen) = emission.fields.get("fifteen-minute").cloned() {
                emission.fields.insert("sw".to_string(), fifteen);
            }
            out.push(emission);
        }

        for entry in &document.upstream {
            out.push(primary(&UPSTREAM, entry, base_tags)?);
        }

        for entry in &document.downstream {
            let emission = primary(&DOWNSTREAM, entry, base_tags)?;
            self.secondaries(entry, &emission.tags, &mut out)?;
            out.push(emission);
        }

        for entry in &document.frontstream {
            out.push(primary(&FRONTSTREAM, entry, base_tags)?);
        }

        Ok(out)
    }

    fn secondaries(
        &self,
        entry: &SectionEntry,
        tags: &Tags,
        out: &mut Vec<MetricEmission>,
    ) -> Result<(), AdapterError> {
        for (key, value) in entry.iter() {
            let Some((rule, suffix)) = self
                .rules
                .iter()
                .find_map(|rule| rule.strip(key).map(|suffix| (rule, suffix)))
            else {
                continue;
            };

            let object = value
                .as_object()
                .ok_or_else(|| AdapterError::shape(Section::Downstream.key(), key, "an object"))?;

            let fields: Fields = object
                .iter()
                .filter_map(|(k, v)| to_field_value(v).map(|f| (k.clone(), f)))
                .collect();
            if fields.is_empty() {
                continue;
            }

            let mut secondary_tags = tags.clone();
            secondary_tags.insert(rule.tag.clone(), suffix.to_string());

            out.push(MetricEmission::new(
                rule.measurement.as_str(),
                fields,
                secondary_tags,
            ));
        }
        Ok(())
    }
}

/// Map a document with the default rules.
pub fn map(
    document: &StatusDocument,
    base_tags: &Tags,
) -> Result<Vec<MetricEmission>, AdapterError> {
    StatusMapper::default().map(document, base_tags)
}

fn primary(
    shape: &EntryShape,
    entry: &SectionEntry,
    base_tags: &Tags,
) -> Result<MetricEmission, AdapterError> {
    let section = shape.section;

    let mut tags = base_tags.clone();
    for key in shape.tags {
        tags.insert(key.to_string(), entry.str_field(section, key)?.to_string());
    }

    let mut fields = Fields::new();
    for key in shape.plain {
        if let Some(value) = entry.plain_field(key) {
            fields.insert(key.to_string(), value);
        }
    }
    for key in shape.minutes {
        fields.insert(key.to_string(), entry.minute_field(section, key)?.into());
    }

    if shape.percentiles {
        let percentiles = entry.object_field(section, "tr-percentiles")?;
        for p in PERCENTILES {
            if let Some(value) = percentiles.get(p).and_then(to_field_value) {
                fields.insert(format!("tr-{}", p), value);
            }
        }
    }

    Ok(MetricEmission::new(section.measurement(), fields, tags))
}
