//! Protocol types for rollcalld IPC
//!
//! This crate defines the stable API between rollcalld and its callers
//! (normally the attendance web application):
//! - Commands (requests from clients)
//! - Responses and error codes
//! - Events (service -> subscribed clients)
//! - Views of sessions, tokens, and attendance records

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
