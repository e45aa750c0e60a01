//! Chatroom agents - simulated human participants for shared chatrooms
//!
//! Each participant polls a room, "reads" new messages at human speed,
//! asks a completion provider for a reply, "types" it, and waits to see it
//! echoed back before reacting again.

pub mod config;
pub mod conversation;
pub mod experiment;
pub mod heckler;
pub mod llm;
pub mod logging;
pub mod pacing;
pub mod prompt;
pub mod replay;
pub mod room;
pub mod runtime;
pub mod state_machine;
