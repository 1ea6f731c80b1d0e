//! One adventure session: turn sequencing and state mutation.
//!
//! A turn has two phases. First the session asks the narrator for the next
//! narrative beat, replacing the conversation context with the one from the
//! response. Then one line of player input is folded back into the state
//! and the end condition is evaluated. Any narrator or input error is fatal
//! and leaves the state exactly as it was.

use crate::narrator::{DungeonMaster, Narrator, NarratorError};
use crate::state::{GameState, Outcome};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Narrator error: {0}")]
    Narrator(#[from] NarratorError),

    #[error("Input error: {0}")]
    Input(#[from] io::Error),
}

/// How a narrative beat is folded back into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationMode {
    /// Overwrite `current_location` with the full narrative text each turn.
    /// The location becomes a rolling record of the dungeon master's last
    /// utterance rather than a structured place name.
    #[default]
    NarrativeTranscript,
    /// Leave `current_location` untouched. The narrative is still recorded
    /// in the session transcript.
    Fixed,
}

/// Hook point for win/lose logic, evaluated over the state after each turn.
pub type EndCondition = Box<dyn Fn(&GameState) -> Outcome + Send + Sync>;

/// Configuration for creating a session.
///
/// All fields default to the fixed values every run starts from; overrides
/// exist for the model, service address, call deadline, location handling,
/// and end condition.
pub struct SessionConfig {
    /// Model override for the dungeon master.
    pub model: Option<String>,

    /// Base URL override for the inference service.
    pub base_url: Option<String>,

    /// Deadline for a single narration call.
    pub timeout: Option<Duration>,

    /// How the narrative is folded back into the state.
    pub location_mode: LocationMode,

    /// Evaluated after every turn; the default always continues.
    pub end_condition: EndCondition,
}

impl SessionConfig {
    /// Create a config with the fixed defaults.
    pub fn new() -> Self {
        Self {
            model: None,
            base_url: None,
            timeout: None,
            location_mode: LocationMode::default(),
            end_condition: Box::new(|_| Outcome::Continue),
        }
    }

    /// Set the model used for narration.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the base URL of the inference service.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the deadline for a single narration call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set how the narrative is folded back into the state.
    pub fn with_location_mode(mut self, mode: LocationMode) -> Self {
        self.location_mode = mode;
        self
    }

    /// Set the end condition evaluated after every turn.
    pub fn with_end_condition(
        mut self,
        condition: impl Fn(&GameState) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.end_condition = Box::new(condition);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What the operator sees at the top of a turn.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Narrative text from the dungeon master.
    pub narrative: String,
    /// Length of the conversation context after this narration.
    pub context_len: usize,
}

/// An entry in the session transcript: one narrative beat and the input
/// that answered it.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// Dungeon master narrative.
    pub narrative: String,
    /// Player input, trimmed.
    pub player_input: String,
    /// Turn number, starting at 1.
    pub turn: usize,
}

/// A running adventure session.
///
/// The session owns the adventure state exclusively; the narrator only ever
/// sees a prompt and the current context.
pub struct Session<N: Narrator> {
    narrator: N,
    state: GameState,
    location_mode: LocationMode,
    end_condition: EndCondition,
    /// Narrative awaiting the input that answers it.
    pending_narrative: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

impl Session<DungeonMaster> {
    /// Create a session backed by the local Ollama service.
    pub fn new(config: SessionConfig) -> Self {
        let mut dm = DungeonMaster::new();
        if let Some(model) = &config.model {
            dm = dm.with_model(model.clone());
        }
        if let Some(base_url) = &config.base_url {
            dm = dm.with_base_url(base_url.clone());
        }
        if let Some(timeout) = config.timeout {
            dm = dm.with_timeout(timeout);
        }
        Self::with_narrator(config, dm)
    }
}

impl<N: Narrator + Send> Session<N> {
    /// Create a session with a custom narrator.
    ///
    /// Tests use this with a scripted narrator; everything downstream of the
    /// narrator runs the real turn logic.
    pub fn with_narrator(config: SessionConfig, narrator: N) -> Self {
        Self {
            narrator,
            state: GameState::new(),
            location_mode: config.location_mode,
            end_condition: config.end_condition,
            pending_narrative: None,
            transcript: Vec::new(),
        }
    }

    /// Ask the dungeon master for the next narrative beat.
    ///
    /// On success the conversation context is replaced wholesale with the
    /// one from the response. On error nothing is mutated.
    pub async fn next_scene(&mut self) -> Result<Scene, SessionError> {
        let prompt = synthesize_prompt(&self.state);
        let narration = self.narrator.narrate(&prompt, &self.state.context).await?;

        self.state.context = narration.context;
        debug!(
            turn = self.transcript.len() + 1,
            context_len = self.state.context.len(),
            "narration received"
        );

        let scene = Scene {
            narrative: narration.narrative.clone(),
            context_len: self.state.context.len(),
        };
        self.pending_narrative = Some(narration.narrative);
        Ok(scene)
    }

    /// Fold one line of player input back into the state and evaluate the
    /// end condition.
    ///
    /// Surrounding whitespace is trimmed; embedded whitespace is preserved.
    pub fn player_input(&mut self, line: &str) -> Outcome {
        self.state.player.action = line.trim().to_string();

        if let Some(narrative) = self.pending_narrative.take() {
            if self.location_mode == LocationMode::NarrativeTranscript {
                self.state.current_location = narrative.clone();
            }
            self.transcript.push(TranscriptEntry {
                narrative,
                player_input: self.state.player.action.clone(),
                turn: self.transcript.len() + 1,
            });
        }

        (self.end_condition)(&self.state)
    }

    /// The current adventure state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The transcript of completed turns.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Length of the current conversation context.
    pub fn context_len(&self) -> usize {
        self.state.context.len()
    }

    /// The last narrative, if any turn has completed.
    pub fn last_narrative(&self) -> Option<&str> {
        self.transcript.last().map(|e| e.narrative.as_str())
    }

    /// The underlying narrator, for inspection in tests.
    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// Mutable access to the underlying narrator.
    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }
}

/// Build the prompt sent to the dungeon master for the current turn.
///
/// The wording is fixed; the first turn uses the hardcoded opening action
/// since it runs before any input is read.
pub fn synthesize_prompt(state: &GameState) -> String {
    format!(
        "The current location of the player is {}. The player says: {}, what will the dungeon master say?",
        state.current_location, state.player.action
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{OPENING_ACTION, STARTING_LOCATION};

    #[test]
    fn test_prompt_uses_fixed_wording() {
        let state = GameState::new();
        assert_eq!(
            synthesize_prompt(&state),
            format!(
                "The current location of the player is {STARTING_LOCATION}. \
                 The player says: {OPENING_ACTION}, what will the dungeon master say?"
            )
        );
    }

    #[test]
    fn test_prompt_reflects_state() {
        let mut state = GameState::new();
        state.current_location = "a damp cave".to_string();
        state.player.action = "light a torch".to_string();
        assert_eq!(
            synthesize_prompt(&state),
            "The current location of the player is a damp cave. \
             The player says: light a torch, what will the dungeon master say?"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::new();
        assert!(config.model.is_none());
        assert!(config.base_url.is_none());
        assert!(config.timeout.is_none());
        assert_eq!(config.location_mode, LocationMode::NarrativeTranscript);
        assert_eq!((config.end_condition)(&GameState::new()), Outcome::Continue);
    }

    #[test]
    fn test_config_builders() {
        let config = SessionConfig::new()
            .with_model("mistral")
            .with_base_url("http://localhost:9999")
            .with_timeout(Duration::from_secs(30))
            .with_location_mode(LocationMode::Fixed)
            .with_end_condition(|_| Outcome::Win);

        assert_eq!(config.model.as_deref(), Some("mistral"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.location_mode, LocationMode::Fixed);
        assert_eq!((config.end_condition)(&GameState::new()), Outcome::Win);
    }
}
