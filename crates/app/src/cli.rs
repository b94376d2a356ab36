//! Command-line interface

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `reeltime` binary.
#[derive(Debug, Parser)]
#[command(name = "reeltime", version, about = "Session tracking for DaVinci Resolve projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (JSON or TOML); probed from standard locations when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the short debug grace periods
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track sessions until interrupted (Ctrl-C)
    Run,
    /// Print per-project totals
    Stats {
        /// Only count time after this instant (RFC 3339)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Close sessions left open by a crashed run, then exit
    Recover,
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stats_parses_since_with_offset() {
        let cli =
            Cli::try_parse_from(["reeltime", "stats", "--since", "2024-05-01T11:00:00+02:00"])
                .expect("cli should parse");

        match cli.command {
            Commands::Stats { since, json } => {
                assert_eq!(since, Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
                assert!(!json);
            }
            other => panic!("expected stats, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["reeltime", "run", "--debug", "--config", "rt.toml"])
            .expect("cli should parse");

        assert!(matches!(cli.command, Commands::Run));
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("rt.toml")));
    }

    #[test]
    fn invalid_since_is_rejected() {
        assert!(Cli::try_parse_from(["reeltime", "stats", "--since", "yesterday"]).is_err());
    }
}
