//! UCI engine adapter.
//!
//! [`StockfishEngine`] owns one engine process for the lifetime of a
//! monitoring session and answers one query at a time.

pub mod stockfish;
pub mod uci;

pub use stockfish::{EngineConfig, StockfishEngine};
pub use uci::{UciError, UciMessage};

use std::path::PathBuf;
use std::time::Duration;

use chess::CoordinateMove;

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Uci,
    /// Position from the standard start, followed by `moves`.
    SetPosition { moves: Vec<CoordinateMove> },
    SetOption { name: String, value: Option<String> },
    IsReady,
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
    pub infinite: bool,        // Search until "stop"
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    BestMove(Option<CoordinateMove>),
    Info(EngineInfo),
}

/// One "info" line. Only the fields a search result is built from are kept.
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<CoordinateMove>, // Principal variation
    pub multipv: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i8), // Negative for being mated
}

impl From<Score> for chess::AnalysisScore {
    fn from(score: Score) -> Self {
        match score {
            Score::Centipawns(cp) => Self::Centipawns(cp),
            Score::Mate(m) => Self::Mate(m as i32),
        }
    }
}

/// Every way the engine can become unusable. All of them end a session.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine binary not found: {0}")]
    NotFound(String),
    #[error("Failed to spawn engine {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Engine process has no {0} pipe")]
    NoPipe(&'static str),
    #[error("Failed to write to engine: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),
    #[error("Engine closed its output")]
    Closed,
    #[error("Move {mv} is not legal in the engine's position")]
    InvalidPosition { mv: String },
}
