use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::OrderRecord;

/// Filter value standing for "every period" / "every channel".
pub const ALL_SENTINEL: &str = "all";

/// A period or channel filter: either the unfiltered sentinel or one concrete label.
///
/// Serialized as a bare string, with `"all"` meaning [`Selector::All`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

pub type PeriodSelector = Selector;
pub type ChannelSelector = Selector;

impl Selector {
    pub fn only(label: impl Into<String>) -> Self {
        Self::Only(label.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(label) => Some(label),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(label) => label == value,
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        if value == ALL_SENTINEL {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        if value == ALL_SENTINEL {
            Self::All
        } else {
            Self::Only(value)
        }
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        match value {
            Selector::All => ALL_SENTINEL.to_string(),
            Selector::Only(label) => label,
        }
    }
}

impl JsonSchema for Selector {
    fn schema_name() -> String {
        "Selector".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_SENTINEL),
            Self::Only(label) => f.write_str(label),
        }
    }
}

/// Lowercases with Turkish casing rules: `I` becomes `ı` and `İ` becomes `i`.
pub fn turkish_lowercase(text: &str) -> String {
    let mut lowered = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'I' => lowered.push('ı'),
            'İ' => lowered.push('i'),
            other => lowered.extend(other.to_lowercase()),
        }
    }
    lowered
}

/// Period, channel and product search state of a screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordFilter {
    #[serde(default)]
    pub period: PeriodSelector,
    #[serde(default)]
    pub channel: ChannelSelector,
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn new(period: PeriodSelector, channel: ChannelSelector) -> Self {
        Self {
            period,
            channel,
            search: None,
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Applies the filter lazily, preserving input order.
    pub fn apply<'a>(
        &'a self,
        records: &'a [OrderRecord],
    ) -> impl Iterator<Item = &'a OrderRecord> + 'a {
        let query = self.search_query();
        records
            .iter()
            .filter(move |r| self.period.matches(&r.period) && self.channel.matches(&r.platform))
            .filter(move |r| query.as_deref().map_or(true, |q| matches_search(r, q)))
    }

    pub fn matches(&self, record: &OrderRecord) -> bool {
        self.period.matches(&record.period)
            && self.channel.matches(&record.platform)
            && self
                .search_query()
                .as_deref()
                .map_or(true, |q| matches_search(record, q))
    }

    /// The lowercased query, or `None` when the term is blank.
    fn search_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|term| !term.trim().is_empty())
            .map(turkish_lowercase)
    }
}

fn matches_search(record: &OrderRecord, lowered_query: &str) -> bool {
    turkish_lowercase(&record.product_code).contains(lowered_query)
        || turkish_lowercase(&record.product_description).contains(lowered_query)
}
