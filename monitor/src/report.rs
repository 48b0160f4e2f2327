//! Per-turn report printed to the output sink.

use std::fmt;

use chess::{
    describe, format_san, Analysis, AnalysisScore, BoardState, CoordinateMove, DescribeError,
    GameStatus, PieceColor,
};

const SEPARATOR: &str = "--------------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub mv: CoordinateMove,
    /// `None` when the engine's move does not resolve on our board.
    pub san: Option<String>,
    /// From White's point of view.
    pub score: Option<AnalysisScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOver {
    Checkmate { winner: PieceColor },
    Stalemate,
    /// The engine had nothing to suggest although the position is not over.
    NoSuggestion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub side_to_move: PieceColor,
    pub best_move: Option<CoordinateMove>,
    pub description: Option<String>,
    pub candidates: Vec<CandidateLine>,
    pub game_over: Option<GameOver>,
}

impl Report {
    /// Combine an analysis with the position it was computed for.
    ///
    /// Fails when the best move starts on an empty square, meaning the engine
    /// and the board disagree about the position.
    pub fn build(state: &BoardState, analysis: Analysis) -> Result<Self, DescribeError> {
        let side_to_move = state.side_to_move();
        let description = analysis
            .best_move
            .as_ref()
            .map(|mv| describe(mv, state))
            .transpose()?;

        let candidates = analysis
            .candidates
            .into_iter()
            .map(|candidate| CandidateLine {
                san: candidate
                    .mv
                    .to_board_move(state.board())
                    .map(|mv| format_san(state.board(), mv)),
                score: candidate.score.map(|s| s.for_white(side_to_move)),
                mv: candidate.mv,
            })
            .collect();

        let game_over = match (analysis.best_move, state.status()) {
            (Some(_), _) => None,
            (None, GameStatus::Won) => Some(GameOver::Checkmate {
                winner: opponent(side_to_move),
            }),
            (None, GameStatus::Drawn) => Some(GameOver::Stalemate),
            (None, GameStatus::Ongoing) => Some(GameOver::NoSuggestion),
        };

        Ok(Self {
            side_to_move,
            best_move: analysis.best_move,
            description,
            candidates,
            game_over,
        })
    }
}

fn opponent(color: PieceColor) -> PieceColor {
    match color {
        PieceColor::White => PieceColor::Black,
        PieceColor::Black => PieceColor::White,
    }
}

impl fmt::Display for GameOver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            Self::Stalemate => f.write_str("draw"),
            Self::NoSuggestion => f.write_str("engine has no move"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "Turn: {}", self.side_to_move)?;
        match (&self.best_move, &self.description) {
            (Some(mv), Some(description)) => {
                writeln!(f, "Best move: {mv}")?;
                writeln!(f, "Descriptive move: {description}")?;
            }
            _ => writeln!(f, "Best move: (none)")?,
        }
        if let Some(over) = &self.game_over {
            writeln!(f, "Game over: {over}")?;
        }
        if !self.candidates.is_empty() {
            writeln!(f, "Top {} moves:", self.candidates.len())?;
            for (i, line) in self.candidates.iter().enumerate() {
                write!(f, "  {}. {}", i + 1, line.mv)?;
                if let Some(san) = &line.san {
                    write!(f, " ({san})")?;
                }
                match &line.score {
                    Some(score) => writeln!(f, "  {score}")?,
                    None => writeln!(f)?,
                }
            }
        }
        Ok(())
    }
}
