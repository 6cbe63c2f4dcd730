//! Conversation Session Tests
//!
//! Drives the full submit pipeline with a scripted completion provider and an
//! in-memory store.

use super::{magic_kingdom_snapshot, test_day, MockCompletion};
use crate::brain::FallbackComposer;
use crate::config::CallPolicy;
use crate::data::cache::ParkDataCache;
use crate::error::AppError;
use crate::models::{Author, FeedbackRating, ParkId};
use crate::session::{
    ConversationSession, FeedbackLogEntry, RejectReason, SessionStatus, SubmitOutcome,
};
use crate::storage::{load_json, MemoryStore, SqliteStore, FEEDBACK_KEY};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

type TestSession = ConversationSession<MockCompletion, MemoryStore>;

fn session_with(provider: MockCompletion, initial_park: ParkId) -> (Arc<TestSession>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(ParkDataCache::with_snapshot(magic_kingdom_snapshot()));
    let policy = CallPolicy {
        max_attempts: 1,
        timeout: Duration::from_secs(2),
    };
    let composer = FallbackComposer::new(Arc::new(provider), policy);
    let session = ConversationSession::new(composer, cache, Arc::clone(&store), initial_park)
        .with_clock(test_day);
    (Arc::new(session), store)
}

#[cfg(test)]
mod submit_tests {
    use super::*;

    #[tokio::test]
    async fn test_space_mountain_scenario() {
        // 1. Arrange
        let (session, _) = session_with(MockCompletion::new("unused"), ParkId::Epcot);

        // 2. Act
        let outcome = session.submit("how long is the wait for space mountain").await;

        // 3. Assert
        let SubmitOutcome::Answered(reply) = outcome else {
            panic!("Expected an answer");
        };
        assert!(reply.text.contains("45 minute wait"));
        assert!(reply.text.contains("Lightning Lane"));
        assert_eq!(session.current_park(), ParkId::MagicKingdom);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].author, Author::User);
        assert_eq!(messages[1].id, reply.id);
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_empty_input_is_ignored() {
        let provider = MockCompletion::new("unused");
        let (session, _) = session_with(provider, ParkId::Epcot);

        assert_eq!(
            session.submit("").await,
            SubmitOutcome::Rejected(RejectReason::EmptyInput)
        );
        assert_eq!(
            session.submit("   \n").await,
            SubmitOutcome::Rejected(RejectReason::EmptyInput)
        );
        assert!(session.messages().is_empty());
        assert!(session.recent_inputs().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_goes_to_provider() {
        let (session, _) = session_with(
            MockCompletion::new("Grab a Dole Whip in Adventureland!"),
            ParkId::MagicKingdom,
        );

        let SubmitOutcome::Answered(reply) = session.submit("best snack?").await else {
            panic!("Expected an answer");
        };
        assert_eq!(reply.text, "Grab a Dole Whip in Adventureland!");
    }

    #[tokio::test]
    async fn test_pattern_answer_skips_provider() {
        let provider = Arc::new(MockCompletion::new("unused"));
        let composer = FallbackComposer::new(Arc::clone(&provider), CallPolicy::default());
        let session = ConversationSession::new(
            composer,
            Arc::new(ParkDataCache::with_snapshot(magic_kingdom_snapshot())),
            Arc::new(MemoryStore::new()),
            ParkId::MagicKingdom,
        )
        .with_clock(test_day);

        session.submit("what are the hours today").await;
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_still_answers() {
        let (session, _) = session_with(MockCompletion::failing(), ParkId::MagicKingdom);

        let SubmitOutcome::Answered(reply) = session.submit("which ride has the shortest wait").await
        else {
            panic!("Expected an answer");
        };
        assert!(reply.text.contains("Space Mountain: 45 min"));
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_noop() {
        // 1. Arrange
        let (session, _) = session_with(
            MockCompletion::new("eventually").with_delay(300),
            ParkId::MagicKingdom,
        );

        // 2. Act
        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit("any tips for today?").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.status(), SessionStatus::AwaitingResponse);
        let count_while_busy = session.messages().len();
        let second = session.submit("another question").await;

        // 3. Assert
        assert_eq!(second, SubmitOutcome::Rejected(RejectReason::Busy));
        assert_eq!(session.messages().len(), count_while_busy);

        let first = first.await.unwrap();
        assert!(matches!(first, SubmitOutcome::Answered(_)));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_recent_inputs_are_bounded() {
        let (session, _) = session_with(MockCompletion::new("ok"), ParkId::MagicKingdom);
        for i in 0..7 {
            session.submit(&format!("question {}", i)).await;
        }
        let recent = session.recent_inputs();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent.first().map(String::as_str), Some("question 2"));
        assert_eq!(recent.last().map(String::as_str), Some("question 6"));
        assert_eq!(session.messages().len(), 14);
    }

    #[tokio::test]
    async fn test_park_name_switches_current_park() {
        let (session, _) = session_with(MockCompletion::new("ok"), ParkId::MagicKingdom);
        session.submit("what's good to eat at animal kingdom").await;
        assert_eq!(session.current_park(), ParkId::AnimalKingdom);
    }
}

#[cfg(test)]
mod feedback_tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_feedback_wins_and_log_appends() {
        // 1. Arrange
        let (session, store) = session_with(MockCompletion::new("Try the churros."), ParkId::Epcot);
        let SubmitOutcome::Answered(reply) = session.submit("snack ideas?").await else {
            panic!("Expected an answer");
        };

        // 2. Act
        session
            .attach_feedback(reply.id, FeedbackRating::ThumbsDown, Some("too vague".to_string()))
            .await
            .unwrap();
        let updated = session
            .attach_feedback(reply.id, FeedbackRating::ThumbsUp, Some("  ".to_string()))
            .await
            .unwrap();

        // 3. Assert
        let feedback = updated.feedback.expect("feedback set");
        assert_eq!(feedback.rating, FeedbackRating::ThumbsUp);
        assert_eq!(feedback.comment, None);

        let stored = session
            .messages()
            .into_iter()
            .find(|m| m.id == reply.id)
            .and_then(|m| m.feedback)
            .unwrap();
        assert_eq!(stored.rating, FeedbackRating::ThumbsUp);

        let log: Vec<FeedbackLogEntry> = load_json(store.as_ref(), FEEDBACK_KEY).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].rating, FeedbackRating::ThumbsDown);
        assert_eq!(log[0].comment.as_deref(), Some("too vague"));
        assert_eq!(log[1].message_text, "Try the churros.");
    }

    #[tokio::test]
    async fn test_overlapping_feedback_keeps_both_entries() {
        // 1. Arrange
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let composer = FallbackComposer::new(
            Arc::new(MockCompletion::new("Head to Frontierland.")),
            CallPolicy::default(),
        );
        let session = ConversationSession::new(
            composer,
            Arc::new(ParkDataCache::with_snapshot(magic_kingdom_snapshot())),
            Arc::clone(&store),
            ParkId::MagicKingdom,
        )
        .with_clock(test_day);
        let SubmitOutcome::Answered(reply) = session.submit("where should we go next?").await else {
            panic!("Expected an answer");
        };

        // 2. Act
        let (first, second) = tokio::join!(
            session.attach_feedback(reply.id, FeedbackRating::ThumbsUp, None),
            session.attach_feedback(reply.id, FeedbackRating::ThumbsDown, Some("crowded".to_string())),
        );

        // 3. Assert
        first.unwrap();
        second.unwrap();
        let log: Vec<FeedbackLogEntry> = load_json(store.as_ref(), FEEDBACK_KEY).await.unwrap();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_message_is_not_found() {
        let (session, store) = session_with(MockCompletion::new("ok"), ParkId::Epcot);

        let result = session
            .attach_feedback(Uuid::new_v4(), FeedbackRating::ThumbsUp, None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        let log: Vec<FeedbackLogEntry> = load_json(store.as_ref(), FEEDBACK_KEY).await.unwrap();
        assert!(log.is_empty());
    }
}
