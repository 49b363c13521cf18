//! Totals and kind-grouping over a cargo list

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::types::{CargoRecord, CargoType};

/// Per-type tally: `places` counts units, `count` counts distinct kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TypeTally {
    pub(crate) count: usize,
    pub(crate) places: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Totals {
    pub(crate) total_places: usize,
    pub(crate) total_weight: f64,
    pub(crate) total_volume: f64,
    pub(crate) by_type: BTreeMap<CargoType, TypeTally>,
}

impl Totals {
    pub(crate) fn is_empty(&self) -> bool {
        self.total_places == 0
    }
}

/// Fold the list into totals. Sums are unrounded.
pub(crate) fn aggregate(records: &[CargoRecord]) -> Totals {
    let mut totals = Totals::default();
    let mut kinds: HashSet<&str> = HashSet::new();

    for record in records {
        totals.total_places += 1;
        totals.total_weight += record.weight;
        totals.total_volume += record.volume;

        let tally = totals.by_type.entry(record.cargo_type).or_default();
        tally.places += 1;
        if kinds.insert(record.group_key.as_str()) {
            tally.count += 1;
        }
    }

    totals
}

/// Records sharing one group key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupSummary {
    pub(crate) group_key: String,
    pub(crate) count: usize,
    pub(crate) total_weight: f64,
    pub(crate) total_volume: f64,
    /// First record seen with this key
    pub(crate) representative: CargoRecord,
}

/// Group by key, in order of each key's first appearance
pub(crate) fn group_by_key(records: &[CargoRecord]) -> Vec<GroupSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupSummary> = Vec::new();

    for record in records {
        let slot = *index.entry(record.group_key.as_str()).or_insert_with(|| {
            groups.push(GroupSummary {
                group_key: record.group_key.clone(),
                count: 0,
                total_weight: 0.0,
                total_volume: 0.0,
                representative: record.clone(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.count += 1;
        group.total_weight += record.weight;
        group.total_volume += record.volume;
    }

    groups
}
