//! Command-line interface definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ParserStrategy;

/// devicematcher - User-Agent based device identification service
#[derive(Parser, Debug)]
#[command(name = "devicematcher")]
#[command(version)]
#[command(about = "Identify and deduplicate devices from User-Agent strings", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file (default: ./config.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Parse a User-Agent string offline and print the result as JSON
    Parse {
        /// Raw User-Agent header value
        user_agent: String,

        /// Parser strategy; defaults to parser.strategy from configuration
        #[arg(long)]
        strategy: Option<ParserStrategy>,
    },

    /// Print a sample configuration file
    ConfigGen {
        /// Output path (default: stdout)
        output_path: Option<PathBuf>,
    },
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["devicematcher"]);
        assert_eq!(cli.command(), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_with_strategy() {
        let cli = Cli::parse_from([
            "devicematcher",
            "--config",
            "/etc/dm.toml",
            "parse",
            "Mozilla/5.0 (X11) Gecko/20100101 Firefox/115.0",
            "--strategy",
            "regex",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dm.toml")));
        match cli.command() {
            Commands::Parse {
                user_agent,
                strategy,
            } => {
                assert!(user_agent.starts_with("Mozilla/5.0"));
                assert_eq!(strategy, Some(ParserStrategy::Regex));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["devicematcher", "parse", "ua", "--strategy", "magic"]);
        assert!(result.is_err());
    }
}
