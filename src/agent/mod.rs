//! Client-side conversation engine.

pub mod conversation;

pub use conversation::{Conversation, DEFAULT_WINDOW_SIZE};
