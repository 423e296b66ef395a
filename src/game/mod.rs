//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The engine never touches storage; it only reports when a round's score is final.

pub mod config;
pub mod direction;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use config::{GameConfig, FOOD_REWARD, MIN_SPEED_MS, SPEED_STEP_MS};
pub use direction::Direction;
pub use engine::{GameEngine, GameEvent, RoundOutcome, StepResult};
pub use state::{GameState, Phase, Position, Snake};
