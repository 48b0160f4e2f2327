//! Board-side logic for the game monitor: notation parsing, replay of an
//! observed move list into a validated position, and human-readable move
//! descriptions.
//!
//! cozy-chess is used for the position and legal move generation; the
//! project-owned types in [`types`] and [`uci`] are what other crates see.

pub mod analysis;
pub mod converters;
pub mod describe;
pub mod san;
pub mod translate;
pub mod types;
pub mod uci;

pub use analysis::{Analysis, AnalysisScore, Candidate};
pub use converters::*;
pub use describe::{describe, DescribeError};
pub use san::{format_san, normalize_san, parse_san, SanError};
pub use translate::{apply, apply_one, BoardState, TranslateError, Translation};
pub use types::{PieceColor, PieceKind};
pub use uci::{convert_uci_castling_to_cozy, format_uci_move, CoordinateMove};

pub use cozy_chess::GameStatus;
