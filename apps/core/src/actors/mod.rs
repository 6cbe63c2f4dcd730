//! External collaborators: the completion actor, speech-to-text, and the
//! traits the rest of the crate depends on instead of concrete clients.

pub mod llm;
pub mod messages;
pub mod traits;
pub mod transcription;
