//! CLI argument definitions using clap
//!
//! Every command takes `--config <path>`. Commands that need input read a
//! single JSON object from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// couloir - avalanche risk classification for ski couloirs
#[derive(Parser, Debug)]
#[command(name = "couloir")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or upgrade the store and seed default users and couloirs
    Init {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Add a couloir ({"username", "password", "point"} on stdin)
    Add {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// List every couloir with its classification
    List {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Show one couloir with its classification
    Show {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,

        /// Point identifier
        #[arg(long)]
        id: u64,
    },

    /// Replace a couloir ({"username", "password", "id", "point"} on stdin)
    Update {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Delete a couloir ({"username", "password", "id"} on stdin)
    Delete {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Number of stored couloirs
    Count {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Classify unsaved point data (point JSON on stdin)
    Classify {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Clear all couloirs, admin only ({"username", "password", "reseed"} on stdin)
    Reset {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Follow changes made by other instances and print one line per change
    Watch {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },

    /// Check credentials ({"username", "password"} on stdin)
    Login {
        #[arg(long, default_value = "./couloir.json")]
        config: PathBuf,
    },
}

impl Command {
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Command::Init { config }
            | Command::Add { config }
            | Command::List { config }
            | Command::Show { config, .. }
            | Command::Update { config }
            | Command::Delete { config }
            | Command::Count { config }
            | Command::Classify { config }
            | Command::Reset { config }
            | Command::Watch { config }
            | Command::Login { config } => config,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["couloir", "list"]).unwrap();
        assert_eq!(cli.command.config_path(), &PathBuf::from("./couloir.json"));
    }

    #[test]
    fn test_show_requires_id() {
        assert!(Cli::try_parse_from(["couloir", "show"]).is_err());
        let cli = Cli::try_parse_from(["couloir", "show", "--id", "7", "--config", "/etc/c.json"]).unwrap();
        match cli.command {
            Command::Show { config, id } => {
                assert_eq!(id, 7);
                assert_eq!(config, PathBuf::from("/etc/c.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
