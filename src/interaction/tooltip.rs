use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metric name -> formatted value contributed by one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTooltip {
    pub group: String,
    pub entries: IndexMap<String, String>,
}

impl SeriesTooltip {
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            entries: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, metric: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(metric.into(), value.into());
        self
    }
}

/// One tooltip section after merging every series of the same group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipSection {
    pub group: String,
    pub entries: IndexMap<String, String>,
}

/// Merges contributions by group, keeping groups and metrics in first-seen
/// order. A repeated metric takes the later value.
pub fn merge_tooltips<I>(contributions: I) -> Vec<TooltipSection>
where
    I: IntoIterator<Item = SeriesTooltip>,
{
    let mut sections: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
    for contribution in contributions {
        sections
            .entry(contribution.group)
            .or_default()
            .extend(contribution.entries);
    }
    sections
        .into_iter()
        .map(|(group, entries)| TooltipSection { group, entries })
        .collect()
}
