//! Cycle metadata: the cached snapshot of the remote cycle list and the
//! selector resolution logic layered on top of it.

mod cache;
mod resolve;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cache::{boundary_crossed, CacheError, CacheStore, CycleCache, FileCacheStore, DEFAULT_CYCLE_TTL};
pub use resolve::{find_cycle, CycleError, CycleSelector};

/// One cycle as returned by the remote list query. The relative-position
/// flags are point-in-time: they describe where the cycle stood when the
/// snapshot was fetched, not where it stands now.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    pub id: String,
    pub number: u32,
    pub name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub is_previous: bool,
}

/// The cached payload: the full cycle list plus the instant it was fetched.
/// Replaced wholesale on refresh, never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub cycles: Vec<CycleRecord>,
}

/// Exactly one cycle, resolved from a selector; feeds both the remote
/// filter and the display header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCycle {
    pub id: String,
    pub number: u32,
    pub name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ResolvedCycle {
    /// Human header line shown above issue listings scoped to this cycle.
    pub fn display_label(&self) -> String {
        let window = format!(
            "{} - {}",
            self.starts_at.format("%b %-d"),
            self.ends_at.format("%b %-d")
        );
        match self.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => format!("Cycle {}: {} ({})", self.number, name, window),
            None => format!("Cycle {} ({})", self.number, window),
        }
    }
}

impl From<&CycleRecord> for ResolvedCycle {
    fn from(record: &CycleRecord) -> Self {
        Self {
            id: record.id.clone(),
            number: record.number,
            name: record.name.clone(),
            starts_at: record.starts_at,
            ends_at: record.ends_at,
        }
    }
}
