//! Text-adventure engine backed by a local Ollama dungeon master.
//!
//! This crate provides:
//! - A single in-memory adventure state ([`GameState`])
//! - An AI dungeon master over Ollama's generate API ([`DungeonMaster`])
//! - Turn sequencing with a pluggable end condition ([`Session`])
//! - Deterministic testing utilities ([`MockNarrator`], [`TestHarness`])
//!
//! # Quick Start
//!
//! ```ignore
//! use dungeon_core::{Outcome, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::new(SessionConfig::new());
//!
//!     let scene = session.next_scene().await?;
//!     println!("{}", scene.narrative);
//!
//!     match session.player_input("I look around") {
//!         Outcome::Continue => { /* next turn */ }
//!         Outcome::Win | Outcome::Lose => { /* adventure over */ }
//!     }
//!     Ok(())
//! }
//! ```

pub mod narrator;
pub mod session;
pub mod state;
pub mod testing;

// Primary public API
pub use narrator::{DungeonMaster, Narration, Narrator, NarratorError};
pub use session::{
    synthesize_prompt, EndCondition, LocationMode, Scene, Session, SessionConfig, SessionError,
    TranscriptEntry,
};
pub use state::{GameState, Outcome, Player, OPENING_ACTION, STARTING_LOCATION};
pub use testing::{MockNarrator, TestHarness};
