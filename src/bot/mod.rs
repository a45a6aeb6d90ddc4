/// Inline button payloads
pub mod callback_data;
/// Slash commands and their handlers
pub mod commands;
/// Update dispatching
pub mod handlers;
pub mod keyboards;
/// Per-user booking flow state
pub mod state;
