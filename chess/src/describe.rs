//! Human-readable rendering of a coordinate move.

use cozy_chess::Square;

use crate::converters::format_square;
use crate::translate::BoardState;
use crate::types::PieceKind;
use crate::uci::CoordinateMove;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescribeError {
    /// The move starts on a square with nothing on it, so the position the
    /// move was computed for is not the one we hold.
    #[error("No piece on {square} to describe move {mv}")]
    EmptySquare { square: String, mv: String },
}

/// Describe `mv` as "White Knight from g1 to f3" using the piece found on
/// its origin square in `state`.
pub fn describe(mv: &CoordinateMove, state: &BoardState) -> Result<String, DescribeError> {
    let origin: Square = mv.origin();
    let (kind, color) = state
        .piece_at(origin)
        .ok_or_else(|| DescribeError::EmptySquare {
            square: format_square(origin),
            mv: mv.to_string(),
        })?;

    let mut text = format!(
        "{} {} from {} to {}",
        color.name(),
        kind.name(),
        format_square(origin),
        format_square(mv.destination())
    );

    if let Some(promo) = mv.promotion() {
        text.push_str(&format!(", promoting to {}", PieceKind::from(promo).name()));
    }

    Ok(text)
}
