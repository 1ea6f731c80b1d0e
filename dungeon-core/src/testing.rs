//! Testing utilities for the adventure engine.
//!
//! This module provides tools for deterministic integration testing:
//! - [`MockNarrator`] returns scripted narrations without touching the
//!   network and records every prompt and context it was called with
//! - [`TestHarness`] drives whole turns through the real session logic

use crate::narrator::{Narration, Narrator, NarratorError};
use crate::session::{Scene, Session, SessionConfig, SessionError};
use crate::state::{GameState, Outcome};
use async_trait::async_trait;
use ollama::Context;
use std::collections::VecDeque;

/// A recorded narrator call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The prompt the session synthesized.
    pub prompt: String,
    /// The context the session passed along.
    pub context: Context,
}

/// A narrator that returns scripted replies in order.
///
/// Use this for deterministic tests without a running inference service.
pub struct MockNarrator {
    replies: VecDeque<Result<Narration, NarratorError>>,
    calls: Vec<RecordedCall>,
}

impl MockNarrator {
    /// Create a mock with no scripted replies.
    pub fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Queue a narration to return.
    pub fn queue(&mut self, narrative: impl Into<String>, context: Vec<i64>) {
        self.replies.push_back(Ok(Narration {
            narrative: narrative.into(),
            context: context.into(),
        }));
    }

    /// Queue an inference error to return.
    pub fn queue_error(&mut self, error: ollama::Error) {
        self.replies.push_back(Err(NarratorError::Inference(error)));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }
}

impl Default for MockNarrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn narrate(
        &mut self,
        prompt: &str,
        context: &Context,
    ) -> Result<Narration, NarratorError> {
        self.calls.push(RecordedCall {
            prompt: prompt.to_string(),
            context: context.clone(),
        });

        self.replies.pop_front().unwrap_or_else(|| {
            Ok(Narration {
                narrative: "The dungeon master has no more scripted responses.".to_string(),
                context: context.clone(),
            })
        })
    }
}

/// Test harness for running scripted adventure turns.
pub struct TestHarness {
    /// The session under test, backed by a [`MockNarrator`].
    pub session: Session<MockNarrator>,
}

impl TestHarness {
    /// Create a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::new())
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            session: Session::with_narrator(config, MockNarrator::new()),
        }
    }

    /// Queue a narration for the mock narrator.
    pub fn expect_narrative(
        &mut self,
        narrative: impl Into<String>,
        context: Vec<i64>,
    ) -> &mut Self {
        self.session.narrator_mut().queue(narrative, context);
        self
    }

    /// Queue an inference error for the mock narrator.
    pub fn expect_error(&mut self, error: ollama::Error) -> &mut Self {
        self.session.narrator_mut().queue_error(error);
        self
    }

    /// Run one full turn: narrate, then feed the given input.
    pub async fn turn(&mut self, input: &str) -> Result<(Scene, Outcome), SessionError> {
        let scene = self.session.next_scene().await?;
        let outcome = self.session.player_input(input);
        Ok((scene, outcome))
    }

    /// The current adventure state.
    pub fn state(&self) -> &GameState {
        self.session.state()
    }

    /// Every narrator call made so far.
    pub fn calls(&self) -> &[RecordedCall] {
        self.session.narrator().calls()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_narrator_basic() {
        let mut harness = TestHarness::new();
        harness.expect_narrative("You stand at the edge of a clearing.", vec![1, 2]);

        let (scene, outcome) = harness.turn("I look around").await.unwrap();

        assert_eq!(scene.narrative, "You stand at the edge of a clearing.");
        assert_eq!(scene.context_len, 2);
        assert_eq!(outcome, Outcome::Continue);
    }

    #[tokio::test]
    async fn test_mock_narrator_records_calls() {
        let mut harness = TestHarness::new();
        harness.expect_narrative("A wolf howls.", vec![7]);

        harness.turn("I hide").await.unwrap();

        let calls = harness.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("a mystical forest"));
        assert!(calls[0].context.is_empty());
    }

    #[tokio::test]
    async fn test_mock_narrator_exhausted_default() {
        let mut harness = TestHarness::new();
        harness.expect_narrative("Scripted.", vec![1]);

        harness.turn("first").await.unwrap();
        let (scene, _) = harness.turn("second").await.unwrap();

        assert!(scene.narrative.contains("no more scripted"));
        // The exhausted default echoes the context back unchanged.
        assert_eq!(scene.context_len, 1);
    }

    #[tokio::test]
    async fn test_mock_narrator_scripted_error() {
        let mut harness = TestHarness::new();
        harness.expect_error(ollama::Error::EmptyResponse);

        let err = harness.turn("anything").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Narrator(NarratorError::Inference(ollama::Error::EmptyResponse))
        ));
    }
}
