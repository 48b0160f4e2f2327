//! Session-level error taxonomy.
//!
//! Every variant of [`MonitorError`] is fatal: the loop stops at the first one
//! and the binary exits non-zero. [`SessionFailure`] attaches what the session
//! knew at that moment.

use std::fmt;

use chess::{DescribeError, PieceColor, TranslateError};
use engine::EngineError;

use crate::history::HistoryError;
use crate::source::ObservationError;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// An observed move does not resolve against the replayed position.
    #[error("illegal move: {0}")]
    IllegalMove(#[from] TranslateError),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),

    #[error("observation source unavailable: {0}")]
    ObservationUnavailable(#[from] ObservationError),

    /// The engine suggested a move from a square the board has empty.
    #[error("board out of sync with engine: {0}")]
    EmptySquare(#[from] DescribeError),

    #[error("move history inconsistent: {0}")]
    HistoryInconsistent(#[from] HistoryError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Snapshot of the session taken when it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub last_move: Option<String>,
    pub side_to_move: PieceColor,
    pub plies: usize,
}

impl Default for FailureContext {
    fn default() -> Self {
        Self {
            last_move: None,
            side_to_move: PieceColor::White,
            plies: 0,
        }
    }
}

/// A fatal error together with the session context it interrupted.
#[derive(Debug)]
pub struct SessionFailure {
    pub error: MonitorError,
    pub context: FailureContext,
}

impl SessionFailure {
    pub fn new(error: MonitorError, context: FailureContext) -> Self {
        Self { error, context }
    }

    /// Failure before any move was replayed.
    pub fn at_start(error: impl Into<MonitorError>) -> Self {
        Self::new(error.into(), FailureContext::default())
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.error)?;
        match &self.context.last_move {
            Some(san) => write!(f, "last move {san}, ")?,
            None => write!(f, "no moves yet, ")?,
        }
        write!(
            f,
            "{} to move, {} plies)",
            self.context.side_to_move, self.context.plies
        )
    }
}

impl std::error::Error for SessionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
