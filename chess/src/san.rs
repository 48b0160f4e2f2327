//! Standard Algebraic Notation (SAN)
//!
//! Parsing resolves a SAN string against the legal moves of a position, so
//! a move is only ever accepted if it is legal and unambiguous there.

use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

use crate::converters::{format_file, format_rank, format_square, parse_file, parse_rank};
use crate::types::PieceKind;
use crate::uci::is_castling;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastleSide {
    King,
    Queen,
}

/// The pieces of a non-castling SAN move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SanParts {
    piece: Piece,
    from_file: Option<File>,
    from_rank: Option<Rank>,
    to: Square,
    promotion: Option<Piece>,
}

/// Strip decoration that does not identify a move: surrounding whitespace,
/// check and mate marks, annotation glyphs and an "e.p." suffix. Unicode
/// figurines are mapped to their SAN letters.
pub fn normalize_san(san: &str) -> String {
    let mut text: String = san
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '♔' | '♚' => 'K',
            '♕' | '♛' => 'Q',
            '♖' | '♜' => 'R',
            '♗' | '♝' => 'B',
            '♘' | '♞' => 'N',
            other => other,
        })
        .collect();

    if let Some(stripped) = text.strip_suffix("e.p.") {
        text = stripped.to_string();
    }

    text.trim_end_matches(['+', '#', '!', '?']).to_string()
}

/// Parse a SAN move against `board`.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let text = normalize_san(san);
    if text.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let legal = legal_moves(board);

    if let Some(side) = castle_side(&text) {
        return legal
            .into_iter()
            .find(|mv| is_castling(board, *mv) && castle_side_of(*mv) == side)
            .ok_or_else(|| SanError::NoLegalMove(san.to_string()));
    }

    let parts = parse_parts(&text).ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;

    let candidates: Vec<Move> = legal
        .into_iter()
        .filter(|mv| !is_castling(board, *mv) && parts.matches(board, *mv))
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(SanError::NoLegalMove(san.to_string())),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Format a legal move on `board` as SAN, including the check or mate mark.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = String::new();

    if is_castling(board, mv) {
        san.push_str(match castle_side_of(mv) {
            CastleSide::King => "O-O",
            CastleSide::Queen => "O-O-O",
        });
    } else {
        let piece = board.piece_on(mv.from).unwrap_or(Piece::Pawn);
        let is_capture = board.piece_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        if piece == Piece::Pawn {
            if is_capture {
                san.push(format_file(mv.from.file()));
            }
        } else {
            san.push(PieceKind::from(piece).to_char_upper());
            san.push_str(&disambiguation(board, mv, piece));
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(PieceKind::from(promo).to_char_upper());
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    san
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

fn castle_side(text: &str) -> Option<CastleSide> {
    match text {
        "O-O" | "0-0" => Some(CastleSide::King),
        "O-O-O" | "0-0-0" => Some(CastleSide::Queen),
        _ => None,
    }
}

fn castle_side_of(mv: Move) -> CastleSide {
    if mv.to.file() as usize > mv.from.file() as usize {
        CastleSide::King
    } else {
        CastleSide::Queen
    }
}

/// Minimal origin hint that separates `mv` from other moves of the same
/// piece type to the same square.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
                && !is_castling(board, *other)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        return format_file(mv.from.file()).to_string();
    }
    if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        return format_rank(mv.from.rank()).to_string();
    }
    format_square(mv.from)
}

fn parse_parts(text: &str) -> Option<SanParts> {
    let chars: Vec<char> = text.chars().collect();

    let (body, promotion) = match chars.iter().position(|c| *c == '=') {
        Some(idx) => {
            if idx + 2 != chars.len() {
                return None;
            }
            (&chars[..idx], Some(promotion_piece(chars[idx + 1])?))
        }
        None => match chars.split_last() {
            // "e8Q" without the '='
            Some((last, rest))
                if promotion_piece(*last).is_some()
                    && rest.last().is_some_and(|c| c.is_ascii_digit()) =>
            {
                (rest, promotion_piece(*last))
            }
            _ => (&chars[..], None),
        },
    };

    let (piece, body) = match body.split_first() {
        Some((first, rest)) => match PieceKind::from_san_letter(*first) {
            Some(kind) => (Piece::from(kind), rest),
            None => (Piece::Pawn, body),
        },
        None => return None,
    };

    let body: Vec<char> = body.iter().copied().filter(|c| *c != 'x').collect();
    if body.len() < 2 || body.len() > 4 {
        return None;
    }

    let (hint, dest) = body.split_at(body.len() - 2);
    let to = Square::new(parse_file(dest[0])?, parse_rank(dest[1])?);

    let mut from_file = None;
    let mut from_rank = None;
    for c in hint {
        if let Some(file) = parse_file(*c) {
            if from_file.replace(file).is_some() {
                return None;
            }
        } else if let Some(rank) = parse_rank(*c) {
            if from_rank.replace(rank).is_some() {
                return None;
            }
        } else {
            return None;
        }
    }

    if promotion.is_some() && piece != Piece::Pawn {
        return None;
    }

    Some(SanParts {
        piece,
        from_file,
        from_rank,
        to,
        promotion,
    })
}

fn promotion_piece(c: char) -> Option<Piece> {
    match PieceKind::from_san_letter(c)? {
        PieceKind::King | PieceKind::Pawn => None,
        kind => Some(Piece::from(kind)),
    }
}

impl SanParts {
    fn matches(&self, board: &Board, mv: Move) -> bool {
        board.piece_on(mv.from) == Some(self.piece)
            && mv.to == self.to
            && mv.promotion == self.promotion
            && self.from_file.map_or(true, |f| mv.from.file() == f)
            && self.from_rank.map_or(true, |r| mv.from.rank() == r)
    }
}
