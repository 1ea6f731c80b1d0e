//! The AI dungeon master.
//!
//! [`DungeonMaster`] wraps the Ollama client and owns the persona prompt;
//! the [`Narrator`] trait is the seam that lets tests substitute a scripted
//! narrator for the real service.

use async_trait::async_trait;
use ollama::{Context, GenerateRequest, Ollama};
use std::time::Duration;
use thiserror::Error;

/// System persona sent with every generate call.
const SYSTEM_PROMPT: &str = "You are a dungeon master in a d&d game. Your task is to assess the situation and interpret the player's actions. You should keep responses short and to the point, and provide enough information to keep the game moving.";

/// Errors from the narrator.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("Inference error: {0}")]
    Inference(#[from] ollama::Error),
}

/// One narrative beat from the dungeon master.
#[derive(Debug, Clone)]
pub struct Narration {
    /// The narrative text. Never empty on success.
    pub narrative: String,
    /// Replacement conversation context for the next call.
    pub context: Context,
}

/// Anything that can produce the next narrative beat.
///
/// Implementations must echo `context` to the backend unchanged and return
/// the backend's replacement context wholesale; mixing contexts from
/// different turns breaks conversational coherence.
#[async_trait]
pub trait Narrator {
    async fn narrate(&mut self, prompt: &str, context: &Context)
        -> Result<Narration, NarratorError>;
}

/// The real dungeon master, backed by a local Ollama service.
pub struct DungeonMaster {
    client: Ollama,
}

impl DungeonMaster {
    /// Create a dungeon master pointed at the default local service.
    pub fn new() -> Self {
        Self {
            client: Ollama::new(),
        }
    }

    /// Set the model used for narration.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.client = self.client.with_model(model);
        self
    }

    /// Set the base URL of the inference service.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Set the deadline for a single narration call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

impl Default for DungeonMaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Narrator for DungeonMaster {
    async fn narrate(
        &mut self,
        prompt: &str,
        context: &Context,
    ) -> Result<Narration, NarratorError> {
        let request = GenerateRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_context(context.clone());

        let response = self.client.generate(request).await?;

        Ok(Narration {
            narrative: response.response,
            context: response.context,
        })
    }
}
