//! Runtime configuration for the monitor.
//!
//! Every option has a compile-time default and can be overridden either on
//! the command line or through a `CHESS_MONITOR_*` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use engine::{EngineConfig, GoParams};

use crate::detector::Notation;
use crate::error::MonitorError;
use crate::source::Credentials;

/// Default engine skill level (Stockfish "Skill Level", full strength).
const DEFAULT_SKILL_LEVEL: u8 = 20;

/// Default fixed search depth.
const DEFAULT_DEPTH: u8 = 15;

/// Default number of ranked candidate moves.
const DEFAULT_CANDIDATES: u8 = 3;

/// Default time between polls of the observation source (in milliseconds).
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default upper bound on one engine search (in seconds).
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(
    name = "chess-monitor",
    version,
    about = "Watch a game in progress and print engine suggestions after every move"
)]
pub struct Cli {
    /// Identifier of the game to monitor.
    #[arg(long, env = "CHESS_MONITOR_GAME")]
    pub game: String,

    /// Account name handed to the observation source.
    #[arg(long, env = "CHESS_MONITOR_USERNAME")]
    pub username: Option<String>,

    /// Account password. Only read from the environment.
    #[arg(skip = std::env::var("CHESS_MONITOR_PASSWORD").ok())]
    pub password: Option<String>,

    /// Text file holding the displayed move list, rewritten as the game goes on.
    #[arg(long, env = "CHESS_MONITOR_MOVES_FILE")]
    pub moves_file: PathBuf,

    /// Engine binary. Well-known install locations and PATH are searched when omitted.
    #[arg(long, env = "CHESS_MONITOR_ENGINE_PATH")]
    pub engine_path: Option<PathBuf>,

    #[arg(
        long,
        env = "CHESS_MONITOR_SKILL_LEVEL",
        default_value_t = DEFAULT_SKILL_LEVEL,
        value_parser = clap::value_parser!(u8).range(0..=20)
    )]
    pub skill_level: u8,

    /// Fixed search depth.
    #[arg(
        long,
        env = "CHESS_MONITOR_DEPTH",
        default_value_t = DEFAULT_DEPTH,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    pub depth: u8,

    /// Search for this many milliseconds instead of to a fixed depth.
    #[arg(long, env = "CHESS_MONITOR_MOVETIME")]
    pub movetime: Option<u64>,

    /// Number of ranked moves to show.
    #[arg(
        long,
        env = "CHESS_MONITOR_CANDIDATES",
        default_value_t = DEFAULT_CANDIDATES,
        value_parser = clap::value_parser!(u8).range(1..=10)
    )]
    pub candidates: u8,

    #[arg(long, env = "CHESS_MONITOR_THREADS")]
    pub threads: Option<u32>,

    #[arg(long, env = "CHESS_MONITOR_HASH_MB")]
    pub hash_mb: Option<u32>,

    #[arg(long, env = "CHESS_MONITOR_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    #[arg(long, env = "CHESS_MONITOR_SEARCH_TIMEOUT_SECS", default_value_t = DEFAULT_SEARCH_TIMEOUT_SECS)]
    pub search_timeout_secs: u64,

    /// Compare moves by raw text instead of ignoring check marks and annotations.
    #[arg(long, env = "CHESS_MONITOR_STRICT_NOTATION")]
    pub strict_notation: bool,

    /// Do not re-read the full move list after each new move.
    #[arg(long, env = "CHESS_MONITOR_NO_VERIFY_HISTORY")]
    pub no_verify_history: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "CHESS_MONITOR_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

/// Validated settings for one monitoring session.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub game_id: String,
    pub credentials: Credentials,
    pub engine: EngineConfig,
    pub poll_interval: Duration,
    pub notation: Notation,
    pub verify_history: bool,
}

impl MonitorSettings {
    pub fn new(game_id: impl Into<String>, engine: EngineConfig) -> Self {
        Self {
            game_id: game_id.into(),
            credentials: Credentials::default(),
            engine,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            notation: Notation::default(),
            verify_history: true,
        }
    }
}

impl Cli {
    pub fn settings(&self) -> Result<MonitorSettings, MonitorError> {
        let game_id = self.game.trim();
        if game_id.is_empty() {
            return Err(MonitorError::Config("game identifier is empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(MonitorError::Config(
                "poll interval must be at least 1 ms".to_string(),
            ));
        }
        if self.search_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "search timeout must be at least 1 s".to_string(),
            ));
        }
        if self.movetime == Some(0) {
            return Err(MonitorError::Config("movetime must be positive".to_string()));
        }

        let search = match self.movetime {
            Some(ms) => GoParams {
                movetime: Some(ms),
                ..Default::default()
            },
            None => GoParams {
                depth: Some(self.depth),
                ..Default::default()
            },
        };

        let engine = EngineConfig {
            path: self.engine_path.clone(),
            skill_level: Some(self.skill_level),
            threads: self.threads,
            hash_mb: self.hash_mb,
            multipv: self.candidates,
            search,
            search_timeout: Duration::from_secs(self.search_timeout_secs),
            ..Default::default()
        };

        Ok(MonitorSettings {
            game_id: game_id.to_string(),
            credentials: Credentials::new(self.username.clone(), self.password.clone()),
            engine,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            notation: if self.strict_notation {
                Notation::Strict
            } else {
                Notation::Normalized
            },
            verify_history: !self.no_verify_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["chess-monitor", "--game", "abc123", "--moves-file", "/tmp/moves.txt"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&[]).unwrap().settings().unwrap();
        assert_eq!(settings.game_id, "abc123");
        assert_eq!(settings.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        assert_eq!(settings.notation, Notation::Normalized);
        assert!(settings.verify_history);
        assert_eq!(settings.engine.skill_level, Some(DEFAULT_SKILL_LEVEL));
        assert_eq!(settings.engine.multipv, DEFAULT_CANDIDATES);
        assert_eq!(settings.engine.search.depth, Some(DEFAULT_DEPTH));
        assert_eq!(settings.engine.search.movetime, None);
    }

    #[test]
    fn test_movetime_replaces_depth() {
        let settings = parse(&["--movetime", "250"]).unwrap().settings().unwrap();
        assert_eq!(settings.engine.search.movetime, Some(250));
        assert_eq!(settings.engine.search.depth, None);
    }

    #[test]
    fn test_flags() {
        let settings = parse(&["--strict-notation", "--no-verify-history", "--candidates", "5"])
            .unwrap()
            .settings()
            .unwrap();
        assert_eq!(settings.notation, Notation::Strict);
        assert!(!settings.verify_history);
        assert_eq!(settings.engine.multipv, 5);
    }

    #[test]
    fn test_skill_level_out_of_range() {
        assert!(parse(&["--skill-level", "21"]).is_err());
        assert!(parse(&["--skill-level", "0"]).is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = parse(&["--poll-interval-ms", "0"])
            .unwrap()
            .settings()
            .unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_blank_game_rejected() {
        let cli = Cli::try_parse_from(["chess-monitor", "--game", "  ", "--moves-file", "m.txt"]).unwrap();
        assert!(matches!(cli.settings(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_game_is_required() {
        assert!(Cli::try_parse_from(["chess-monitor", "--moves-file", "m.txt"]).is_err());
    }
}
