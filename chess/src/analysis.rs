//! Engine analysis types shared between the engine adapter and the report.

use crate::types::PieceColor;
use crate::uci::CoordinateMove;

/// Engine evaluation score.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisScore {
    Centipawns(i32),
    Mate(i32),
}

/// One ranked engine suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub mv: CoordinateMove,
    pub score: Option<AnalysisScore>,
}

/// Outcome of analysing one position. Recomputed every turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// `None` when the side to move has no legal moves.
    pub best_move: Option<CoordinateMove>,
    /// Best first, at most the configured number of lines.
    pub candidates: Vec<Candidate>,
}

impl AnalysisScore {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    /// Re-express a side-to-move score from White's point of view.
    pub fn for_white(&self, side_to_move: PieceColor) -> Self {
        match side_to_move {
            PieceColor::White => *self,
            PieceColor::Black => self.negate(),
        }
    }
}

impl std::fmt::Display for AnalysisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AnalysisScore::Centipawns(35).to_string(), "+0.35");
        assert_eq!(AnalysisScore::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(AnalysisScore::Mate(3).to_string(), "+M3");
        assert_eq!(AnalysisScore::Mate(-2).to_string(), "-M2");
    }

    #[test]
    fn test_for_white_flips_black_scores() {
        let score = AnalysisScore::Centipawns(40);
        assert_eq!(score.for_white(PieceColor::White), score);
        assert_eq!(
            score.for_white(PieceColor::Black),
            AnalysisScore::Centipawns(-40)
        );
    }
}
