//! Replay of an observed SAN move list into a validated position.
//!
//! [`apply`] replays a whole history from the starting position;
//! [`apply_one`] extends an existing [`BoardState`] by a single move. Both
//! go through the same SAN resolution, and neither leaves a half-applied
//! state behind on failure.

use cozy_chess::{Board, GameStatus, Move, Square};

use crate::san::{parse_san, SanError};
use crate::types::{PieceColor, PieceKind};
use crate::uci::CoordinateMove;

/// Position derived from the moves applied so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    board: Board,
    moves: Vec<Move>,
}

/// Result of a successful full replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub coord_moves: Vec<CoordinateMove>,
    pub state: BoardState,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Illegal move {san:?} at ply {ply} ({side} to move): {source}")]
    IllegalMove {
        /// 1-indexed ply of the offending move.
        ply: usize,
        san: String,
        side: PieceColor,
        #[source]
        source: SanError,
    },
}

impl BoardState {
    /// The standard starting position.
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            moves: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_board(board: Board) -> Self {
        Self {
            board,
            moves: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn plies(&self) -> usize {
        self.moves.len()
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn piece_at(&self, square: Square) -> Option<(PieceKind, PieceColor)> {
        let piece = self.board.piece_on(square)?;
        let color = self.board.color_on(square)?;
        Some((piece.into(), color.into()))
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one SAN move to `state`, returning its coordinate form.
///
/// `state` is left untouched when the move cannot be resolved.
pub fn apply_one(state: &mut BoardState, san: &str) -> Result<CoordinateMove, TranslateError> {
    let mv = parse_san(&state.board, san).map_err(|source| TranslateError::IllegalMove {
        ply: state.plies() + 1,
        san: san.to_string(),
        side: state.side_to_move(),
        source,
    })?;

    let coord = CoordinateMove::from_board_move(&state.board, mv);
    // parse_san only returns moves from the legal move list
    state.board.play_unchecked(mv);
    state.moves.push(mv);
    Ok(coord)
}

/// Replay `history` from the starting position.
///
/// Stops at the first move that does not resolve; no partial result is
/// returned in that case.
pub fn apply<S: AsRef<str>>(history: &[S]) -> Result<Translation, TranslateError> {
    let mut state = BoardState::new();
    let coord_moves = history
        .iter()
        .map(|san| apply_one(&mut state, san.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Translation { coord_moves, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uci(coords: &[CoordinateMove]) -> Vec<String> {
        coords.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_opening_scenario() {
        let t = apply(&["e4", "e5", "Nf3"]).unwrap();
        assert_eq!(uci(&t.coord_moves), ["e2e4", "e7e5", "g1f3"]);
        assert_eq!(t.state.side_to_move(), PieceColor::Black);
        assert_eq!(t.state.plies(), 3);
    }

    #[test]
    fn test_empty_history() {
        let empty: [&str; 0] = [];
        let t = apply(&empty).unwrap();
        assert!(t.coord_moves.is_empty());
        assert_eq!(t.state, BoardState::new());
        assert_eq!(t.state.side_to_move(), PieceColor::White);
    }

    #[test]
    fn test_illegal_move_fails_whole_call() {
        let err = apply(&["e4", "e5", "Qh8"]).unwrap_err();
        match err {
            TranslateError::IllegalMove { ply, san, side, .. } => {
                assert_eq!(ply, 3);
                assert_eq!(san, "Qh8");
                assert_eq!(side, PieceColor::White);
            }
        }
    }

    #[test]
    fn test_apply_one_is_atomic() {
        let mut state = apply(&["e4"]).unwrap().state;
        let before = state.clone();
        assert!(apply_one(&mut state, "e4").is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_incremental_matches_bulk() {
        let history = ["d4", "d5", "c4", "dxc4", "e3", "b5", "a4", "c6", "axb5", "cxb5"];
        let bulk = apply(&history).unwrap();

        let mut state = BoardState::new();
        let mut coords = Vec::new();
        for san in history {
            coords.push(apply_one(&mut state, san).unwrap());
        }
        assert_eq!(coords, bulk.coord_moves);
        assert_eq!(state, bulk.state);
    }

    #[test]
    fn test_castling_emits_king_move() {
        let t = apply(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O", "Nf6"]).unwrap();
        assert_eq!(t.coord_moves[6].to_string(), "e1g1");
    }

    #[test]
    fn test_piece_at_after_replay() {
        let t = apply(&["e4"]).unwrap();
        let e4 = crate::converters::parse_square("e4").unwrap();
        assert_eq!(
            t.state.piece_at(e4),
            Some((PieceKind::Pawn, PieceColor::White))
        );
    }

    /// Play `choices` as indices into the legal move list, producing a valid
    /// SAN history.
    fn random_history(choices: &[usize]) -> Vec<String> {
        let mut board = Board::default();
        let mut history = Vec::new();
        for choice in choices {
            let mut legal = Vec::new();
            board.generate_moves(|mvs| {
                legal.extend(mvs);
                false
            });
            if legal.is_empty() {
                break;
            }
            let mv = legal[choice % legal.len()];
            history.push(crate::san::format_san(&board, mv));
            board.play_unchecked(mv);
        }
        history
    }

    proptest! {
        #[test]
        fn prop_replay_length_and_turn(choices in prop::collection::vec(any::<usize>(), 0..40)) {
            let history = random_history(&choices);
            let t = apply(&history).unwrap();
            prop_assert_eq!(t.coord_moves.len(), history.len());
            let expected = if history.len() % 2 == 0 { PieceColor::White } else { PieceColor::Black };
            prop_assert_eq!(t.state.side_to_move(), expected);
        }

        #[test]
        fn prop_replay_is_idempotent(choices in prop::collection::vec(any::<usize>(), 0..40)) {
            let history = random_history(&choices);
            prop_assert_eq!(apply(&history).unwrap(), apply(&history).unwrap());
        }

        #[test]
        fn prop_described_origin_is_occupied(choices in prop::collection::vec(any::<usize>(), 1..40)) {
            let history = random_history(&choices);
            let mut state = BoardState::new();
            for san in &history {
                let before = state.clone();
                let coord = apply_one(&mut state, san).unwrap();
                prop_assert!(crate::describe::describe(&coord, &before).is_ok());
            }
        }
    }
}
