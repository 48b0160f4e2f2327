//! State of one monitored game.

use chess::{apply, apply_one, BoardState, CoordinateMove, Translation};
use engine::StockfishEngine;

use crate::error::{FailureContext, MonitorError};
use crate::history::MoveHistory;
use crate::report::Report;

/// Owns everything the loop accumulates for a game: the observed history,
/// the position replayed from it and the engine process analysing it.
pub struct Session {
    history: MoveHistory,
    state: BoardState,
    coord_moves: Vec<CoordinateMove>,
    engine: StockfishEngine,
}

impl Session {
    pub fn new(engine: StockfishEngine) -> Self {
        Self {
            history: MoveHistory::new(),
            state: BoardState::new(),
            coord_moves: Vec::new(),
            engine,
        }
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Replace the session's game with the full list read at startup.
    pub fn bootstrap(&mut self, moves: Vec<String>) -> Result<(), MonitorError> {
        let Translation { coord_moves, state } = apply(&moves)?;
        self.history = MoveHistory::from(moves);
        self.coord_moves = coord_moves;
        self.state = state;
        Ok(())
    }

    /// Extend the game by one observed move. Nothing changes if it does not
    /// resolve.
    pub fn record_move(&mut self, san: &str) -> Result<CoordinateMove, MonitorError> {
        let coord = apply_one(&mut self.state, san)?;
        self.history.push(san);
        self.coord_moves.push(coord);
        Ok(coord)
    }

    /// Ask the engine about the current position.
    pub async fn analyze(&mut self) -> Result<Report, MonitorError> {
        let analysis = self.engine.analyze(&self.coord_moves).await?;
        Ok(Report::build(&self.state, analysis)?)
    }

    pub fn context(&self) -> FailureContext {
        FailureContext {
            last_move: self.history.last().map(str::to_string),
            side_to_move: self.state.side_to_move(),
            plies: self.state.plies(),
        }
    }

    pub async fn close(self) {
        self.engine.shutdown().await;
    }
}
