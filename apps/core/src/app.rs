//! Composition root. The host shell builds one `ParkAssistant` at startup and
//! routes UI events to it.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::actors::llm::LlmActorHandle;
use crate::actors::traits::TranscriptionProvider;
use crate::actors::transcription::TranscriptionClient;
use crate::brain::composer::FallbackComposer;
use crate::config::AssistantConfig;
use crate::data::{DataRefresher, HttpParkDataProvider, ParkDataCache, RefreshReport};
use crate::error::AppError;
use crate::fs_manager::DataPaths;
use crate::models::ParkId;
use crate::notifications::{AlertService, NotificationScheduler};
use crate::session::{ConversationSession, SubmitOutcome};
use crate::storage::SqliteStore;

pub type AssistantSession = ConversationSession<LlmActorHandle, SqliteStore>;

pub struct ParkAssistant {
    session: Arc<AssistantSession>,
    refresher: DataRefresher<HttpParkDataProvider>,
    cache: Arc<ParkDataCache>,
    store: Arc<SqliteStore>,
    transcriber: TranscriptionClient,
    llm: LlmActorHandle,
}

impl ParkAssistant {
    /// Wires every collaborator from `config`. Does not fetch park data;
    /// call [`ParkAssistant::refresh`] once the host is ready.
    pub async fn initialize(
        config: AssistantConfig,
        paths: DataPaths,
        initial_park: ParkId,
    ) -> Result<Self, AppError> {
        config.check()?;
        let timeout = config.request_timeout();

        let store = Arc::new(SqliteStore::open(&paths).await?);
        let cache = Arc::new(ParkDataCache::new());
        let provider = Arc::new(HttpParkDataProvider::new(
            config.park_data_base_url.clone(),
            timeout,
        )?);
        let refresher = DataRefresher::new(provider, Arc::clone(&cache));

        let llm = LlmActorHandle::spawn(config.completion.clone(), timeout)?;
        let composer = FallbackComposer::new(Arc::new(llm.clone()), config.completion_policy())
            .with_sampling(config.completion.temperature, config.completion.max_tokens);

        let transcriber = TranscriptionClient::new(
            config.completion.base_url.clone(),
            config.completion.api_key.clone(),
            config.transcription_model.clone(),
            timeout,
        )?;

        let session = Arc::new(ConversationSession::new(
            composer,
            Arc::clone(&cache),
            Arc::clone(&store),
            initial_park,
        ));

        info!("Park assistant ready (current park: {})", initial_park);
        Ok(Self {
            session,
            refresher,
            cache,
            store,
            transcriber,
            llm,
        })
    }

    pub fn session(&self) -> Arc<AssistantSession> {
        Arc::clone(&self.session)
    }

    pub fn cache(&self) -> Arc<ParkDataCache> {
        Arc::clone(&self.cache)
    }

    pub async fn refresh(&self) -> Result<RefreshReport, AppError> {
        self.refresher.refresh().await
    }

    /// Transcribes a voice question and submits the text. Transcription
    /// failures are returned to the caller and nothing is submitted.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn submit_voice(
        &self,
        audio: Vec<u8>,
        file_name: String,
        mime_type: String,
    ) -> Result<SubmitOutcome, AppError> {
        let text = self
            .transcriber
            .transcribe(audio, file_name, mime_type)
            .await?;
        if text.is_empty() {
            warn!("Transcription returned no text");
        }
        Ok(self.session.submit(&text).await)
    }

    /// Alert service over the same store, backed by the host's scheduler.
    pub fn alerts<N: NotificationScheduler>(&self, scheduler: Arc<N>) -> AlertService<N, SqliteStore> {
        AlertService::new(scheduler, Arc::clone(&self.store))
    }

    pub async fn shutdown(&self) {
        self.llm.shutdown().await;
        info!("Park assistant stopped");
    }
}
