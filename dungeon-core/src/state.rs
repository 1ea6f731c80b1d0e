//! Adventure state for a single run.
//!
//! The whole adventure lives in one mutable record owned by the session.
//! Nothing here is ever written to disk; every run starts from the same
//! fixed defaults and the state dies with the process.

use ollama::Context;
use std::collections::HashSet;

/// Fixed starting location for every run.
pub const STARTING_LOCATION: &str = "a mystical forest";

/// Opening action fed to the dungeon master before any input is read.
pub const OPENING_ACTION: &str = "I am walking vigilantly";

const STARTING_HEALTH: i32 = 100;

/// The player character.
///
/// `inventory`, `health`, and `experience` are placeholders for future
/// mechanics; nothing mutates them yet.
#[derive(Debug, Clone)]
pub struct Player {
    pub inventory: Vec<String>,
    pub health: i32,
    pub experience: i32,
    /// The player's last typed command, overwritten every turn.
    pub action: String,
}

/// In-memory state of one adventure.
#[derive(Debug, Clone)]
pub struct GameState {
    pub player: Player,
    /// Where the player currently is. In the default location mode this is
    /// overwritten each turn with the dungeon master's full response.
    pub current_location: String,
    pub visited_locations: HashSet<String>,
    /// Opaque conversation state echoed to the service each turn.
    pub context: Context,
}

impl GameState {
    /// Create the fixed initial state every run starts from.
    pub fn new() -> Self {
        Self {
            player: Player {
                inventory: Vec::new(),
                health: STARTING_HEALTH,
                experience: 0,
                action: OPENING_ACTION.to_string(),
            },
            current_location: STARTING_LOCATION.to_string(),
            visited_locations: HashSet::new(),
            context: Context::new(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of evaluating the end condition after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The adventure keeps going.
    Continue,
    Win,
    Lose,
}

impl Outcome {
    /// Whether this outcome ends the adventure.
    pub fn is_finished(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}
