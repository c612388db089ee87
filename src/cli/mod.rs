//! CLI module for couloir
//!
//! Provides command-line interface for:
//! - init: create or upgrade the store, seed users and couloirs
//! - add / update / delete / reset: authenticated mutations
//! - list / show / count / classify: classified reads
//! - watch: follow other instances' changes
//! - login: credential check

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, open_context, run, run_command, watch};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
