//! Slack boundary for the lunch-train bot.
//!
//! This crate holds everything that faces the chat platform:
//! - **Gateway** (`gateway`) - the messaging and user-lookup collaborator
//!   traits the scheduler talks through, with `Noop` stand-ins for dry mode
//! - **Block Kit** (`blocks`) - rich message builders and the lunch-train
//!   message templates
//! - **Jokes** (`jokes`) - emoji decoration and weighted joke content for
//!   the daily prompt
//! - **Events** (`events`) - block-action routing from user interactions to
//!   roster mutations
//!
//! The wire transport itself (Socket Mode, HTTP) is owned by the enclosing
//! process; everything here is transport-agnostic.

pub mod blocks;
pub mod events;
pub mod gateway;
pub mod jokes;
