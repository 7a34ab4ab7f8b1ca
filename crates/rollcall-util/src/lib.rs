//! Shared utilities for rollcall
//!
//! This crate provides:
//! - ID types (SessionId, StudentId, PrincipalId, ClientId)
//! - Clock access with mock time for development
//! - Default paths for socket, config, and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
