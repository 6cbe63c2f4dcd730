//! # Data Module
//!
//! Live park data: the provider client, the refresh routine and the cache
//! the responders read from.

pub mod cache;
pub mod provider;
pub mod refresh;

pub use cache::{CacheSnapshot, ParkDataCache};
pub use provider::{HttpParkDataProvider, ParkDataSource};
pub use refresh::{DataRefresher, ParkRefreshSummary, RefreshReport};
