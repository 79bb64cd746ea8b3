//! Core data models for the cricket tracker.

mod player;

pub use player::*;
