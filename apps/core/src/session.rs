//! Conversation Session.
//!
//! Owns the chat history, the current park and the recent-input ring buffer,
//! and drives analyzer -> pattern responder -> fallback composer for each
//! submitted message. One message is resolved at a time; submissions that
//! arrive while a response is pending are rejected, not queued.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::actors::traits::CompletionProvider;
use crate::brain::analyzer::QueryAnalyzer;
use crate::brain::composer::{ComposeInput, FallbackComposer};
use crate::brain::responder::{PatternMatch, PatternResponder};
use crate::data::cache::ParkDataCache;
use crate::error::AppError;
use crate::models::{Author, ChatMessage, FeedbackRating, MessageFeedback, ParkId};
use crate::storage::{append_json, KeyValueStore, FEEDBACK_KEY};

/// Shown when resolving a message fails unexpectedly.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I ran into a problem answering that. Please try asking again.";

const RECENT_INPUT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The assistant reply that was appended.
    Answered(ChatMessage),
    Rejected(RejectReason),
}

/// In-memory conversation state. Never persisted.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub current_park: ParkId,
    pub messages: Vec<ChatMessage>,
    recent_inputs: VecDeque<String>,
}

impl ConversationState {
    pub fn new(current_park: ParkId) -> Self {
        Self {
            current_park,
            messages: Vec::new(),
            recent_inputs: VecDeque::with_capacity(RECENT_INPUT_CAPACITY),
        }
    }

    fn remember_input(&mut self, text: &str) {
        if self.recent_inputs.len() == RECENT_INPUT_CAPACITY {
            self.recent_inputs.pop_front();
        }
        self.recent_inputs.push_back(text.to_string());
    }

    /// Last inputs, oldest first.
    pub fn recent_inputs(&self) -> Vec<String> {
        self.recent_inputs.iter().cloned().collect()
    }
}

/// One append-only feedback log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackLogEntry {
    pub message_id: Uuid,
    pub message_text: String,
    pub rating: FeedbackRating,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Clears the busy flag when a submission finishes, including on cancellation.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct ConversationSession<C: CompletionProvider, S: KeyValueStore> {
    analyzer: QueryAnalyzer,
    responder: PatternResponder,
    composer: FallbackComposer<C>,
    cache: Arc<ParkDataCache>,
    store: Arc<S>,
    state: Mutex<ConversationState>,
    busy: AtomicBool,
    today: Clock,
}

impl<C: CompletionProvider, S: KeyValueStore> ConversationSession<C, S> {
    pub fn new(
        composer: FallbackComposer<C>,
        cache: Arc<ParkDataCache>,
        store: Arc<S>,
        initial_park: ParkId,
    ) -> Self {
        Self {
            analyzer: QueryAnalyzer::new(),
            responder: PatternResponder::new(),
            composer,
            cache,
            store,
            state: Mutex::new(ConversationState::new(initial_park)),
            busy: AtomicBool::new(false),
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the date source used for "today" in hours answers.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        // State stays consistent across a panic: every mutation is a single push or assignment.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> SessionStatus {
        if self.busy.load(Ordering::Acquire) {
            SessionStatus::AwaitingResponse
        } else {
            SessionStatus::Idle
        }
    }

    pub fn current_park(&self) -> ParkId {
        self.lock_state().current_park
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state().messages.clone()
    }

    pub fn recent_inputs(&self) -> Vec<String> {
        self.lock_state().recent_inputs()
    }

    /// Submits a user message and waits for the assistant reply.
    #[instrument(skip(self, text))]
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty submission");
            return SubmitOutcome::Rejected(RejectReason::EmptyInput);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Ignoring submission while awaiting a response");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let recent = {
            let mut state = self.lock_state();
            let recent = state.recent_inputs();
            state.messages.push(ChatMessage::new(Author::User, text));
            state.remember_input(text);
            recent
        };

        let reply_text = match self.resolve(text, &recent).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to resolve message: {}", e);
                APOLOGY_MESSAGE.to_string()
            }
        };

        let reply = ChatMessage::new(Author::Assistant, reply_text);
        self.lock_state().messages.push(reply.clone());
        SubmitOutcome::Answered(reply)
    }

    async fn resolve(&self, text: &str, recent: &[String]) -> Result<String, AppError> {
        let analysis = self.analyzer.analyze(text);
        let snapshot = self.cache.snapshot()?;
        let today = (self.today)();

        let (outcome, park) = {
            let mut state = self.lock_state();
            let outcome = self.responder.respond(
                text,
                &analysis,
                &snapshot,
                today,
                &mut state.current_park,
            );
            (outcome, state.current_park)
        };
        debug!("Analysis: {}, park now {}", analysis.summary(), park);

        match outcome {
            PatternMatch::Matched(answer) => Ok(answer),
            PatternMatch::NoMatch => {
                let input = ComposeInput {
                    text,
                    park,
                    snapshot: &snapshot,
                    analysis: &analysis,
                    recent_inputs: recent,
                };
                Ok(self.composer.compose(input).await)
            }
        }
    }

    /// Records thumbs up/down on a message.
    ///
    /// The message's `feedback` always holds the latest rating; every call also
    /// appends a new entry to the stored feedback log.
    #[instrument(skip(self, comment))]
    pub async fn attach_feedback(
        &self,
        message_id: Uuid,
        rating: FeedbackRating,
        comment: Option<String>,
    ) -> Result<ChatMessage, AppError> {
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let feedback = MessageFeedback {
            rating,
            comment: comment.clone(),
            timestamp: Utc::now(),
        };

        let message = {
            let mut state = self.lock_state();
            let message = state
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or_else(|| AppError::NotFound(format!("message {}", message_id)))?;
            message.feedback = Some(feedback.clone());
            message.clone()
        };

        let entry = FeedbackLogEntry {
            message_id,
            message_text: message.text.clone(),
            rating,
            comment,
            timestamp: feedback.timestamp,
        };
        let total = append_json(self.store.as_ref(), FEEDBACK_KEY, entry, None).await?;
        info!("Feedback stored ({} entries in log)", total);

        Ok(message)
    }
}
