//! Decides whether the observed latest move is new.
//!
//! The detector only compares text (and, when the source provides it, the
//! ply count). It never checks legality; that is the translator's job.

use chess::normalize_san;

use crate::history::{HistoryError, MoveHistory};
use crate::source::LatestMove;

/// How two move texts are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Notation {
    /// Raw text equality.
    Strict,
    /// Equality after [`normalize_san`]: check marks, annotation glyphs,
    /// whitespace and figurines do not count as a change.
    #[default]
    Normalized,
}

impl Notation {
    pub fn same(self, a: &str, b: &str) -> bool {
        match self {
            Self::Strict => a == b,
            Self::Normalized => normalize_san(a) == normalize_san(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    NoChange,
    NewMove(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    notation: Notation,
}

impl ChangeDetector {
    pub fn new(notation: Notation) -> Self {
        Self { notation }
    }

    /// Compare the last move we know about with the one currently shown.
    ///
    /// With no previous move, anything non-empty is new. Blank text (a move
    /// list still rendering) is never a change.
    pub fn detect(&self, previous_last: Option<&str>, observed: &str) -> Change {
        if observed.trim().is_empty() {
            return Change::NoChange;
        }
        match previous_last {
            Some(previous) if self.notation.same(previous, observed) => Change::NoChange,
            _ => Change::NewMove(observed.trim().to_string()),
        }
    }

    /// Ply-aware detection.
    ///
    /// When the source says how many moves it displays, a repeated text such
    /// as `O-O` answered by `O-O` is still a new move. A ply count behind the
    /// history, or more than one ahead of it, is reported as inconsistent.
    /// Without a ply count this falls back to [`ChangeDetector::detect`].
    pub fn detect_latest(
        &self,
        history: &MoveHistory,
        observed: &LatestMove,
    ) -> Result<Change, HistoryError> {
        let Some(ply) = observed.ply else {
            return Ok(self.detect(history.last(), &observed.san));
        };

        let known = history.len();
        if ply < known {
            return Err(HistoryError::Shrunk {
                known,
                observed: ply,
            });
        }
        if ply == known {
            return match history.last() {
                Some(last) if !self.notation.same(last, &observed.san) => {
                    Err(HistoryError::Diverged {
                        ply,
                        known: last.to_string(),
                        observed: observed.san.clone(),
                    })
                }
                _ => Ok(Change::NoChange),
            };
        }
        if ply > known + 1 {
            return Err(HistoryError::Gap {
                known,
                observed: ply,
            });
        }
        Ok(self.detect(None, &observed.san))
    }
}
