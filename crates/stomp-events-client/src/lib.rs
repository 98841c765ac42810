//! Terminal front end for the STOMP events client.
//!
//! Provides:
//! - `UserCommand` - Parsed command line
//! - `Dispatcher` - Maps commands onto session operations
//! - `run_commands` - Command loop over a line source
//! - `Cli` - Binary arguments

pub mod cli;
pub mod command;
pub mod dispatcher;
pub mod repl;

pub use cli::Cli;
pub use command::{CommandError, UserCommand, Verb};
pub use dispatcher::Dispatcher;
pub use repl::{run_commands, spawn_stdin_reader};
