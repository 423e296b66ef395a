//! Snake Board - a terminal Snake game with a local or remote leaderboard
//!
//! This library provides:
//! - Core game logic, free of I/O (game module)
//! - Score persistence behind one interface (store module)
//! - Configuration and player preferences (config, prefs modules)
//! - TUI rendering and key handling (render, input modules)
//! - Execution modes: play and print scores (modes module)

pub mod config;
pub mod game;
pub mod input;
pub mod modes;
pub mod prefs;
pub mod render;
pub mod store;
