use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Campus assistant chat over academic records.
#[derive(Debug, Parser)]
#[command(name = "kampus", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Requester id the messages are sent as.
    #[arg(short, long, global = true, env = "KAMPUS_USER", default_value_t = 1)]
    pub user: i64,

    /// Display name used in named replies.
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Dataset JSON for the in-memory store (overrides `data_path`).
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// DuckDB database file; seeded from `--data` when given.
    #[cfg(feature = "duckdb")]
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Extra config file layered above `./kampus.toml`.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reply to one message.
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the reply as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Read messages from stdin until EOF or `exit`.
    Chat,

    /// Show which intent a message routes to.
    Classify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show the days, time range and course fragments found in a message.
    Extract {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "kampus", "ask", "jadwal", "senin", "--json", "-u", "7", "--name", "Budi",
        ])
        .unwrap();
        assert_eq!(cli.user, 7);
        assert_eq!(cli.name.as_deref(), Some("Budi"));
        match cli.command {
            Command::Ask { text, json } => {
                assert_eq!(text, vec!["jadwal", "senin"]);
                assert!(json);
            }
            other => panic!("expected ask, got {other:?}"),
        }
    }

    #[test]
    fn ask_requires_text() {
        assert!(Cli::try_parse_from(["kampus", "ask"]).is_err());
    }
}
