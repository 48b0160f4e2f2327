//! Observed move history.

use crate::detector::Notation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("source shows {observed} moves but {known} were already seen")]
    Shrunk { known: usize, observed: usize },
    #[error("move {ply} changed from {known:?} to {observed:?}")]
    Diverged {
        ply: usize,
        known: String,
        observed: String,
    },
    #[error("source jumped from {known} to {observed} moves")]
    Gap { known: usize, observed: usize },
}

/// SAN moves in the order they were observed. Only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    moves: Vec<String>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.moves
    }

    pub fn last(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn push(&mut self, san: impl Into<String>) {
        self.moves.push(san.into());
    }

    /// Check a full move list read from the source against this history.
    ///
    /// The list may trail by one move (the latest-move view and the list view
    /// are not rendered atomically); any other shortfall, a differing move or
    /// an extra move is an error.
    pub fn reconcile(&self, observed: &[String], notation: Notation) -> Result<(), HistoryError> {
        let known = self.moves.len();
        if observed.len() + 1 < known {
            return Err(HistoryError::Shrunk {
                known,
                observed: observed.len(),
            });
        }
        if observed.len() > known {
            return Err(HistoryError::Gap {
                known,
                observed: observed.len(),
            });
        }

        match self
            .moves
            .iter()
            .zip(observed)
            .position(|(ours, theirs)| !notation.same(ours, theirs))
        {
            Some(index) => Err(HistoryError::Diverged {
                ply: index + 1,
                known: self.moves[index].clone(),
                observed: observed[index].clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for MoveHistory {
    fn from(moves: Vec<S>) -> Self {
        Self {
            moves: moves.into_iter().map(Into::into).collect(),
        }
    }
}
