//! Keyboard mapping for the terminal host

pub mod handler;

pub use handler::{InputHandler, KeyAction, PromptAction};
