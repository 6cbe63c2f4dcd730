//! Startup/background refresh of the park data cache.

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::cache::{CacheSnapshot, ParkDataCache};
use super::provider::ParkDataSource;
use crate::error::AppError;
use crate::models::{ParkData, ParkId};

/// Per-park record counts from one refresh, for logging and the UI status line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParkRefreshSummary {
    pub attractions: usize,
    pub entertainment: usize,
    pub character_meets: usize,
    pub hours: usize,
    /// Categories that failed and were left empty.
    pub failed_categories: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub parks: HashMap<ParkId, ParkRefreshSummary>,
}

impl RefreshReport {
    pub fn failed_category_count(&self) -> usize {
        self.parks.values().map(|s| s.failed_categories.len()).sum()
    }
}

/// Fetches every data park and swaps the result into the cache.
pub struct DataRefresher<S: ParkDataSource> {
    source: Arc<S>,
    cache: Arc<ParkDataCache>,
}

impl<S: ParkDataSource> DataRefresher<S> {
    pub fn new(source: Arc<S>, cache: Arc<ParkDataCache>) -> Self {
        Self { source, cache }
    }

    /// Refreshes all parks concurrently.
    ///
    /// A failed category is left empty and never blocks the others. The cache is
    /// replaced once, after every park has finished.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshReport, AppError> {
        info!("Refreshing park data for {} parks", ParkId::DATA_PARKS.len());

        let results = join_all(ParkId::DATA_PARKS.iter().map(|park| self.fetch_park(*park))).await;

        let mut parks = HashMap::new();
        let mut report = RefreshReport::default();
        for (park, data, summary) in results {
            parks.insert(park, data);
            report.parks.insert(park, summary);
        }

        self.cache.replace(CacheSnapshot::new(parks, Utc::now()))?;

        info!(
            "Park data refresh complete ({} failed categories)",
            report.failed_category_count()
        );
        Ok(report)
    }

    async fn fetch_park(&self, park: ParkId) -> (ParkId, ParkData, ParkRefreshSummary) {
        let (attractions, hours, entertainment, meets) = tokio::join!(
            self.source.wait_times(park),
            self.source.park_hours(park),
            self.source.entertainment(park),
            self.source.character_meets(park),
        );

        let mut failed = Vec::new();
        let data = ParkData {
            attractions: or_empty(attractions, park, "wait-times", &mut failed),
            hours: or_empty(hours, park, "hours", &mut failed),
            entertainment: or_empty(entertainment, park, "entertainment", &mut failed),
            character_meets: or_empty(meets, park, "character-meets", &mut failed),
        };

        let summary = ParkRefreshSummary {
            attractions: data.attractions.len(),
            entertainment: data.entertainment.len(),
            character_meets: data.character_meets.len(),
            hours: data.hours.len(),
            failed_categories: failed,
        };
        (park, data, summary)
    }
}

fn or_empty<T>(
    result: Result<Vec<T>, AppError>,
    park: ParkId,
    category: &'static str,
    failed: &mut Vec<&'static str>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!("No {} data for {}: {}", category, park, e);
            failed.push(category);
            Vec::new()
        }
    }
}
