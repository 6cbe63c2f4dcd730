// ParkChat core: the assistant behind the park app's chat screen.
// Keyword rules answer first; a hosted completion model covers the rest.

pub mod actors;
pub mod app;
pub mod brain;
pub mod config;
pub mod data;
pub mod error;
pub mod fs_manager;
pub mod models;
pub mod notifications;
pub mod session;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use app::ParkAssistant;
pub use config::AssistantConfig;
pub use error::AppError;
pub use models::{ChatMessage, FeedbackRating, ParkId};
pub use session::{ConversationSession, SessionStatus, SubmitOutcome};
