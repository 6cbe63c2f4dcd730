//! Park data provider client.
//!
//! Talks to the park-data proxy: four JSON endpoints per park, each wrapping
//! its records in a named array field.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::models::{Attraction, CharacterMeet, EntertainmentEvent, ParkHoursEntry, ParkId};

/// Source of live park data. Errors mean "no data for this category" to callers.
#[async_trait]
pub trait ParkDataSource: Send + Sync + 'static {
    async fn wait_times(&self, park: ParkId) -> Result<Vec<Attraction>, AppError>;
    async fn park_hours(&self, park: ParkId) -> Result<Vec<ParkHoursEntry>, AppError>;
    async fn entertainment(&self, park: ParkId) -> Result<Vec<EntertainmentEvent>, AppError>;
    async fn character_meets(&self, park: ParkId) -> Result<Vec<CharacterMeet>, AppError>;
}

/// HTTP implementation against `{base}/parks/{park}/{endpoint}`.
#[derive(Clone)]
pub struct HttpParkDataProvider {
    client: Client,
    base_url: String,
}

impl HttpParkDataProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, park: ParkId, path: &str) -> String {
        format!("{}/parks/{}/{}", self.base_url, park.as_str(), path)
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, AppError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();

        if !status.is_success() {
            return Err(AppError::Io(std::io::Error::other(format!(
                "Park data request to {} failed with status {}",
                url, status
            ))));
        }

        Ok(res.json::<Value>().await?)
    }

    /// Fetches `path` and decodes the first present field among `fields`.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        park: ParkId,
        path: &str,
        fields: &[&str],
    ) -> Result<Vec<T>, AppError> {
        let body = self.fetch_json(&self.endpoint(park, path)).await?;
        Ok(decode_list(&body, fields, park))
    }
}

/// Decodes the named array from a provider body.
///
/// A missing field is an empty list. Records that fail to decode are skipped.
/// Objects without a `park` field get the requested park filled in.
pub fn decode_list<T: DeserializeOwned>(body: &Value, fields: &[&str], park: ParkId) -> Vec<T> {
    let Some(items) = fields
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_array))
    else {
        debug!("Response for {} has none of the fields {:?}", park, fields);
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let mut item = item.clone();
            if let Some(obj) = item.as_object_mut() {
                obj.entry("park")
                    .or_insert_with(|| Value::String(park.as_str().to_string()));
            }
            match serde_json::from_value::<T>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("Skipping undecodable record for {}: {}", park, e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl ParkDataSource for HttpParkDataProvider {
    #[instrument(skip(self))]
    async fn wait_times(&self, park: ParkId) -> Result<Vec<Attraction>, AppError> {
        self.fetch_list(park, "wait-times", &["attractions"]).await
    }

    #[instrument(skip(self))]
    async fn park_hours(&self, park: ParkId) -> Result<Vec<ParkHoursEntry>, AppError> {
        self.fetch_list(park, "hours", &["hours", "schedule"]).await
    }

    #[instrument(skip(self))]
    async fn entertainment(&self, park: ParkId) -> Result<Vec<EntertainmentEvent>, AppError> {
        self.fetch_list(park, "entertainment", &["entertainment"]).await
    }

    #[instrument(skip(self))]
    async fn character_meets(&self, park: ParkId) -> Result<Vec<CharacterMeet>, AppError> {
        self.fetch_list(park, "character-meets", &["characterMeets"]).await
    }
}
