//! CLI module
//!
//! Command-line interface for checking credentials and sending signed requests.
//!
//! # Commands
//!
//! - `check` - Verify the credentials against the API
//! - `get` - Send a signed GET request

mod commands;
mod runner;

pub use commands::{Cli, Commands, DumpArg};
pub use runner::Runner;
