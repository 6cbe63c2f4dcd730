//! Wait-time alerts.
//!
//! Watches favorite attractions in the cached data and schedules a local
//! notification when one drops under the user's threshold. The push service
//! itself sits behind [`NotificationScheduler`]; the conversation never calls
//! into this module.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::data::cache::CacheSnapshot;
use crate::error::AppError;
use crate::models::{Attraction, ParkId};
use crate::storage::{
    append_json, load_json, save_json, KeyValueStore, ALERT_HISTORY_KEY,
    NOTIFICATION_PREFERENCES_KEY,
};

const ALERT_HISTORY_CAP: usize = 50;
const REALERT_AFTER_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub enabled: bool,
    pub wait_threshold_minutes: u32,
    /// Attraction ids or names.
    pub favorite_attractions: Vec<String>,
    pub show_reminders: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            wait_threshold_minutes: 30,
            favorite_attractions: Vec::new(),
            show_reminders: false,
        }
    }
}

impl NotificationPreferences {
    fn is_favorite(&self, attraction: &Attraction) -> bool {
        let name = attraction.name.to_lowercase();
        self.favorite_attractions.iter().any(|fav| {
            fav == &attraction.id || fav.to_lowercase() == name
        })
    }
}

/// A notification handed to the platform scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: Uuid,
    pub attraction_id: String,
    pub park: ParkId,
    pub title: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Platform push capability.
#[async_trait]
pub trait NotificationScheduler: Send + Sync + 'static {
    /// Asks the user for permission; `true` when granted.
    async fn request_permission(&self) -> Result<bool, AppError>;
    async fn schedule(&self, notification: LocalNotification) -> Result<(), AppError>;
}

pub struct AlertService<N: NotificationScheduler, S: KeyValueStore> {
    scheduler: Arc<N>,
    store: Arc<S>,
}

impl<N: NotificationScheduler, S: KeyValueStore> AlertService<N, S> {
    pub fn new(scheduler: Arc<N>, store: Arc<S>) -> Self {
        Self { scheduler, store }
    }

    pub async fn preferences(&self) -> Result<NotificationPreferences, AppError> {
        load_json(self.store.as_ref(), NOTIFICATION_PREFERENCES_KEY).await
    }

    pub async fn save_preferences(&self, prefs: &NotificationPreferences) -> Result<(), AppError> {
        save_json(self.store.as_ref(), NOTIFICATION_PREFERENCES_KEY, prefs).await
    }

    /// Requests permission and turns alerts on if granted. Returns the final state.
    pub async fn enable(&self) -> Result<bool, AppError> {
        let granted = self.scheduler.request_permission().await?;
        let mut prefs = self.preferences().await?;
        prefs.enabled = granted;
        self.save_preferences(&prefs).await?;
        if !granted {
            info!("Notification permission denied; alerts stay off");
        }
        Ok(granted)
    }

    pub async fn history(&self) -> Result<Vec<AlertRecord>, AppError> {
        load_json(self.store.as_ref(), ALERT_HISTORY_KEY).await
    }

    /// Schedules alerts for favorites at or under the threshold. Returns what was sent.
    #[instrument(skip(self, snapshot))]
    pub async fn check_wait_times(
        &self,
        snapshot: &CacheSnapshot,
    ) -> Result<Vec<AlertRecord>, AppError> {
        let prefs = self.preferences().await?;
        if !prefs.enabled || prefs.favorite_attractions.is_empty() {
            return Ok(Vec::new());
        }

        let history = self.history().await?;
        let now = Utc::now();
        let cutoff = now - Duration::minutes(REALERT_AFTER_MINUTES);
        let mut sent = Vec::new();

        for park in ParkId::DATA_PARKS {
            for attraction in &snapshot.park(park).attractions {
                if !attraction.is_open
                    || attraction.wait_time > prefs.wait_threshold_minutes
                    || !prefs.is_favorite(attraction)
                {
                    continue;
                }
                let recently_alerted = history
                    .iter()
                    .chain(sent.iter())
                    .any(|r| r.attraction_id == attraction.id && r.sent_at > cutoff);
                if recently_alerted {
                    continue;
                }

                let notification = build_notification(attraction);
                if let Err(e) = self.scheduler.schedule(notification.clone()).await {
                    warn!("Could not schedule alert for {}: {}", attraction.name, e);
                    continue;
                }

                let record = AlertRecord {
                    id: Uuid::new_v4(),
                    attraction_id: attraction.id.clone(),
                    park: attraction.park,
                    title: notification.title,
                    body: notification.body,
                    sent_at: now,
                };
                append_json(
                    self.store.as_ref(),
                    ALERT_HISTORY_KEY,
                    record.clone(),
                    Some(ALERT_HISTORY_CAP),
                )
                .await?;
                sent.push(record);
            }
        }

        if !sent.is_empty() {
            info!("Sent {} wait-time alerts", sent.len());
        }
        Ok(sent)
    }
}

fn build_notification(attraction: &Attraction) -> LocalNotification {
    let mut data = HashMap::new();
    data.insert("attractionId".to_string(), attraction.id.clone());
    data.insert("park".to_string(), attraction.park.as_str().to_string());

    LocalNotification {
        title: format!("Short wait at {}", attraction.name),
        body: format!(
            "{} is down to {} minutes at {}.",
            attraction.name,
            attraction.wait_time,
            attraction.park.display_name()
        ),
        data,
    }
}
