//! The fixed geographic scope of the load: taxi zones inside the Bronx.

use std::collections::HashSet;

use once_cell::sync::Lazy;

pub const BRONX_ZONE_IDS: [i64; 43] = [
    3, 18, 20, 31, 32, 46, 47, 51, 58, 59, 60, 69, 78, 81, 94, 119, 126, 136, 147, 159, 167, 168,
    169, 174, 182, 183, 184, 185, 199, 200, 208, 212, 213, 220, 235, 240, 241, 242, 247, 248, 250,
    254, 259,
];

static BRONX: Lazy<ZoneFilter> = Lazy::new(|| ZoneFilter::new(BRONX_ZONE_IDS));

/// Immutable set of zone ids a trip must start and end in to be retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneFilter {
    zones: HashSet<i64>,
}

impl ZoneFilter {
    pub fn new(zones: impl IntoIterator<Item = i64>) -> Self {
        Self {
            zones: zones.into_iter().collect(),
        }
    }

    pub fn bronx() -> &'static ZoneFilter {
        &BRONX
    }

    pub fn contains(&self, zone_id: i64) -> bool {
        self.zones.contains(&zone_id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
