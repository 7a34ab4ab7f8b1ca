//! Request handling for rollcalld
//!
//! The binary owns process setup (arguments, logging, signals). Everything
//! that turns an IPC message into engine calls and replies lives here so it
//! can be driven from tests.

mod dispatch;

pub use dispatch::*;
