//! In-memory park data cache.
//!
//! Readers take an `Arc` to the current snapshot and keep it for as long as
//! they need; a refresh builds a whole new snapshot and swaps the pointer, so a
//! reader never sees a half-updated park.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};
use tracing::info;

use crate::error::AppError;
use crate::models::{ParkData, ParkId};

static EMPTY_PARK: LazyLock<ParkData> = LazyLock::new(ParkData::default);

/// Immutable view of all cached park data at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    parks: HashMap<ParkId, ParkData>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn new(parks: HashMap<ParkId, ParkData>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            parks,
            refreshed_at: Some(refreshed_at),
        }
    }

    /// Data for `park`, or an empty record when nothing was fetched.
    pub fn park(&self, park: ParkId) -> &ParkData {
        self.parks.get(&park).unwrap_or(&EMPTY_PARK)
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn is_empty(&self) -> bool {
        self.parks.values().all(ParkData::is_empty)
    }

    /// Builder used by tests and the refresher.
    pub fn with_park(mut self, park: ParkId, data: ParkData) -> Self {
        self.parks.insert(park, data);
        self
    }
}

/// Shared handle to the latest snapshot.
#[derive(Debug, Default)]
pub struct ParkDataCache {
    current: RwLock<Arc<CacheSnapshot>>,
}

impl ParkDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<Arc<CacheSnapshot>, AppError> {
        self.current
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|e| AppError::Internal(format!("Park data cache lock poisoned: {}", e)))
    }

    /// Swaps in a fully built snapshot.
    pub fn replace(&self, snapshot: CacheSnapshot) -> Result<(), AppError> {
        let mut guard = self
            .current
            .write()
            .map_err(|e| AppError::Internal(format!("Park data cache lock poisoned: {}", e)))?;
        *guard = Arc::new(snapshot);
        info!("Park data cache replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attraction, ParkData};

    fn attraction(name: &str) -> Attraction {
        Attraction {
            id: name.to_lowercase(),
            name: name.to_string(),
            wait_time: 10,
            is_open: true,
            has_lightning_lane: false,
            park: ParkId::Epcot,
            area: None,
        }
    }

    #[test]
    fn test_missing_park_is_empty() {
        let snapshot = CacheSnapshot::default();
        assert!(snapshot.park(ParkId::Epcot).is_empty());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_replace_does_not_touch_held_snapshot() {
        let cache = ParkDataCache::new();
        let first = CacheSnapshot::default().with_park(
            ParkId::Epcot,
            ParkData {
                attractions: vec![attraction("Test Track")],
                ..ParkData::default()
            },
        );
        cache.replace(first).unwrap();

        let held = cache.snapshot().unwrap();
        cache.replace(CacheSnapshot::default()).unwrap();

        assert_eq!(held.park(ParkId::Epcot).attractions.len(), 1);
        assert!(cache.snapshot().unwrap().park(ParkId::Epcot).is_empty());
    }
}
