use chrono::{DateTime, Utc};

use crate::cycle::{find_cycle, CycleCache, CycleError, CycleRecord, CycleSelector, CycleSnapshot, ResolvedCycle};
use crate::graphql::LinearClient;

/// Enough to cover every cycle a team keeps around.
const CYCLE_FETCH_LIMIT: usize = 50;

/// Higher-level helpers around the remote cycle list, reading through the
/// optional cache.
#[derive(Clone)]
pub struct CycleService {
    client: LinearClient,
}

impl CycleService {
    pub fn new(client: LinearClient) -> Self {
        Self { client }
    }

    /// The cycle list in source order, from cache when fresh.
    pub async fn list(
        &self,
        cache: Option<&CycleCache>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CycleRecord>, CycleError> {
        Ok(self.snapshot(cache, now).await?.cycles)
    }

    /// Resolve a selector string to exactly one cycle.
    pub async fn resolve(
        &self,
        selector: &str,
        cache: Option<&CycleCache>,
        now: DateTime<Utc>,
    ) -> Result<ResolvedCycle, CycleError> {
        let parsed = CycleSelector::parse(selector)?;
        let snapshot = self.snapshot(cache, now).await?;
        find_cycle(&parsed, &snapshot.cycles)
            .map(ResolvedCycle::from)
            .ok_or_else(|| CycleError::NotFound(selector.trim().to_owned()))
    }

    /// Cache hit, else live fetch. The fetch repopulates the cache as a side
    /// effect; a failed cache write is not fatal to the command.
    async fn snapshot(
        &self,
        cache: Option<&CycleCache>,
        now: DateTime<Utc>,
    ) -> Result<CycleSnapshot, CycleError> {
        if let Some(snapshot) = cache.and_then(|cache| cache.get(now)) {
            return Ok(snapshot);
        }

        let cycles = self.client.cycles(CYCLE_FETCH_LIMIT).await?;
        let snapshot = CycleSnapshot {
            fetched_at: now,
            cycles,
        };
        if let Some(cache) = cache {
            if let Err(err) = cache.put(&snapshot) {
                eprintln!("warning: failed to write cycle cache: {err}");
            }
        }
        Ok(snapshot)
    }
}
