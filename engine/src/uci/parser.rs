use crate::{EngineInfo, Score};
use chess::CoordinateMove;

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for "bestmove (none)", sent when the side to move
    /// has no legal moves.
    BestMove {
        mv: Option<CoordinateMove>,
        ponder: Option<CoordinateMove>,
    },
    Info(EngineInfo),
    InfoString(String),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            if tokens.len() < 2 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let mv = match tokens[1] {
                "(none)" | "0000" => None,
                text => Some(parse_uci_move(text)?),
            };
            let ponder = if tokens.len() >= 4 && tokens[2] == "ponder" {
                Some(parse_uci_move(tokens[3])?)
            } else {
                None
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") if tokens.get(1) == Some(&"string") => {
            Ok(UciMessage::InfoString(tokens[2..].join(" ")))
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..])?)),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse an "info" line from the engine
fn parse_info_line(tokens: &[&str]) -> Result<EngineInfo, crate::UciError> {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if let Ok(mv) = parse_uci_move(tokens[i]) {
                        info.pv.push(mv);
                    }
                    i += 1;
                }
                continue; // Don't increment i again
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            _ => {
                // Unknown keyword or a value we don't use, skip
            }
        }
        i += 1;
    }

    Ok(info)
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Parse UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<CoordinateMove, crate::UciError> {
    s.parse()
        .map_err(|_| crate::UciError::InvalidMove(s.to_string()))
}
