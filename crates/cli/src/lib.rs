//! EFRN CLI - Command wiring
//!
//! This crate provides the `efrn` binary and the commands behind it.

pub mod commands;
pub mod context;

pub use context::AppContext;
