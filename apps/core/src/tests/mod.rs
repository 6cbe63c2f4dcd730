//! Test Module
//!
//! Cross-module test suite for the ParkChat core.
//!
//! ## Test Categories
//! - `brain_tests`: analyzer phrasings, pattern responder scenarios, composer fallbacks
//! - `session_tests`: submit pipeline, busy/empty rejection, feedback log
//! - `provider_tests`: HTTP park data provider and refresher against a mock server
//! - `storage_tests`: SQLite key-value store in memory and on disk

pub mod session_tests;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{sleep, Duration};

use crate::actors::messages::{ActorError, AppError, CompletionRequest};
use crate::actors::traits::CompletionProvider;
use crate::data::cache::CacheSnapshot;
use crate::models::{Attraction, ParkData, ParkHoursEntry, ParkId};

// ============================================================================
// Mock Completion Provider
// ============================================================================

/// Completion provider with a scripted outcome.
pub struct MockCompletion {
    pub response: String,
    pub delay_ms: u64,
    pub should_fail: bool,
    pub calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            delay_ms: 0,
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
        if self.should_fail {
            return Err(AppError::Actor(ActorError::LlmError(
                "mock provider failure".to_string(),
            )));
        }
        Ok(self.response.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn test_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

pub fn space_mountain() -> Attraction {
    Attraction {
        id: "space-mountain".to_string(),
        name: "Space Mountain".to_string(),
        wait_time: 45,
        is_open: true,
        has_lightning_lane: true,
        park: ParkId::MagicKingdom,
        area: Some("Tomorrowland".to_string()),
    }
}

/// Magic Kingdom with one ride and today's hours; every other park empty.
pub fn magic_kingdom_snapshot() -> CacheSnapshot {
    CacheSnapshot::default().with_park(
        ParkId::MagicKingdom,
        ParkData {
            attractions: vec![space_mountain()],
            hours: vec![ParkHoursEntry {
                date: test_day(),
                opening_time: Some("09:00".to_string()),
                closing_time: Some("22:00".to_string()),
                is_open: true,
            }],
            ..ParkData::default()
        },
    )
}
