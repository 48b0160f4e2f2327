//! UCI (Universal Chess Interface) coordinate moves

use std::fmt;
use std::str::FromStr;

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::converters::{format_piece, format_square, parse_square};

/// A move as origin square, destination square and optional promotion, in
/// the form UCI engines read and write ("e2e4", "e1g1", "e7e8q").
///
/// Castling is written as the king's two-square move, unlike the
/// king-takes-rook encoding cozy-chess uses internally. Values come either
/// from a move played on a board ([`CoordinateMove::from_board_move`]) or
/// from parsing engine output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateMove {
    origin: Square,
    destination: Square,
    promotion: Option<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid coordinate move: {0}")]
pub struct CoordinateMoveError(pub String);

impl CoordinateMove {
    /// Derive the coordinate form of `mv`, which must be legal on `board`.
    pub fn from_board_move(board: &Board, mv: Move) -> Self {
        let destination = if is_castling(board, mv) {
            let file = if mv.to.file() as usize > mv.from.file() as usize {
                File::G
            } else {
                File::C
            };
            Square::new(file, mv.from.rank())
        } else {
            mv.to
        };

        Self {
            origin: mv.from,
            destination,
            promotion: mv.promotion,
        }
    }

    pub fn origin(&self) -> Square {
        self.origin
    }

    pub fn destination(&self) -> Square {
        self.destination
    }

    pub fn promotion(&self) -> Option<Piece> {
        self.promotion
    }

    /// Resolve this move against `board`, returning the cozy-chess move if
    /// it is legal there.
    pub fn to_board_move(&self, board: &Board) -> Option<Move> {
        let raw = Move {
            from: self.origin,
            to: self.destination,
            promotion: self.promotion,
        };

        let mut legal = Vec::new();
        board.generate_moves(|mvs| {
            legal.extend(mvs);
            false
        });

        let mv = convert_uci_castling_to_cozy(raw, &legal);
        legal.contains(&mv).then_some(mv)
    }
}

impl fmt::Display for CoordinateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mv = Move {
            from: self.origin,
            to: self.destination,
            promotion: self.promotion,
        };
        f.write_str(&format_uci_move(mv))
    }
}

impl FromStr for CoordinateMove {
    type Err = CoordinateMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordinateMoveError(s.to_string());

        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }

        let origin = parse_square(&s[0..2]).ok_or_else(invalid)?;
        let destination = parse_square(&s[2..4]).ok_or_else(invalid)?;
        let promotion = match s.get(4..5) {
            None => None,
            Some("q") => Some(Piece::Queen),
            Some("r") => Some(Piece::Rook),
            Some("b") => Some(Piece::Bishop),
            Some("n") => Some(Piece::Knight),
            Some(_) => return Err(invalid()),
        };

        Ok(Self {
            origin,
            destination,
            promotion,
        })
    }
}

/// True when `mv` is castling in cozy-chess's king-takes-own-rook encoding.
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to).is_some()
        && board.color_on(mv.to) == board.color_on(mv.from)
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// Returns the move unchanged unless the converted form is in `legal_moves`.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);

    if !is_back_rank || !is_e_file || mv.promotion.is_some() || mv.to.rank() != mv.from.rank() {
        return mv;
    }

    let rook_file = match mv.to.file() {
        File::G => File::H,
        File::C => File::A,
        _ => return mv,
    };

    let converted = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };

    if legal_moves.contains(&converted) {
        converted
    } else {
        mv
    }
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}
