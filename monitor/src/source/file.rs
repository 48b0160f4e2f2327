//! A move list kept in a plain-text file.
//!
//! Something outside the monitor (typically a browser scraper) rewrites the
//! file as the game progresses; every poll re-reads it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Credentials, LatestMove, ObservationError, ObservationSource};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, Clone)]
pub struct MoveFileSource {
    path: PathBuf,
    connected: bool,
}

impl MoveFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connected: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<String>, ObservationError> {
        if !self.connected {
            return Err(ObservationError::Unavailable(
                "move file read before connect".to_string(),
            ));
        }
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ObservationError::Unavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        parse_move_list(&text)
    }
}

#[async_trait]
impl ObservationSource for MoveFileSource {
    async fn connect(
        &mut self,
        credentials: &Credentials,
        game_id: &str,
    ) -> Result<(), ObservationError> {
        tokio::fs::metadata(&self.path).await.map_err(|e| {
            ObservationError::Unavailable(format!("cannot open {}: {}", self.path.display(), e))
        })?;
        tracing::info!(
            game = game_id,
            user = credentials.username().unwrap_or("-"),
            path = %self.path.display(),
            "Watching move file"
        );
        self.connected = true;
        Ok(())
    }

    async fn current_move_list(&mut self) -> Result<Vec<String>, ObservationError> {
        self.read().await
    }

    async fn latest_move(&mut self) -> Result<Option<LatestMove>, ObservationError> {
        let moves = self.read().await?;
        let ply = moves.len();
        Ok(moves.into_iter().last().map(|san| LatestMove {
            san,
            ply: Some(ply),
        }))
    }

    async fn close(&mut self) {
        self.connected = false;
    }
}

/// Extract SAN tokens from a move list.
///
/// Accepts one move per line as well as PGN-style movetext: move numbers
/// (`1.`, `12...`, also glued to the move as in `1.e4`), result tokens and
/// `{...}` comments are dropped.
pub fn parse_move_list(text: &str) -> Result<Vec<String>, ObservationError> {
    let mut stripped = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ObservationError::Malformed("unmatched '}'".to_string())
                })?;
                stripped.push(' ');
            }
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ObservationError::Malformed("unterminated comment".to_string()));
    }

    Ok(stripped
        .split_whitespace()
        .filter(|token| !RESULT_TOKENS.contains(token))
        .map(strip_move_number)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect())
}

fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < token.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_one_move_per_line() {
        assert_eq!(parse_move_list("e4\ne5\nNf3\n").unwrap(), ["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_parse_pgn_movetext() {
        let text = "1. e4 e5 {open game} 2.Nf3 Nc6 3. Bb5 a6 4... Nf6 1/2-1/2";
        assert_eq!(
            parse_move_list(text).unwrap(),
            ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Nf6"]
        );
    }

    #[test]
    fn test_parse_keeps_castling_with_zeros() {
        assert_eq!(parse_move_list("0-0 0-0-0 *").unwrap(), ["0-0", "0-0-0"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_move_list("").unwrap().is_empty());
        assert!(parse_move_list("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_broken_comments() {
        assert!(matches!(
            parse_move_list("e4 {oops"),
            Err(ObservationError::Malformed(_))
        ));
        assert!(matches!(
            parse_move_list("e4 }"),
            Err(ObservationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_file_source_reads_latest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1. e4 e5 2. Nf3").unwrap();

        let mut source = MoveFileSource::new(file.path());
        source.connect(&Credentials::default(), "g1").await.unwrap();

        assert_eq!(
            source.latest_move().await.unwrap(),
            Some(LatestMove {
                san: "Nf3".to_string(),
                ply: Some(3),
            })
        );
        assert_eq!(source.current_move_list().await.unwrap().len(), 3);
        source.close().await;
    }

    #[tokio::test]
    async fn test_file_source_empty_file_has_no_latest() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut source = MoveFileSource::new(file.path());
        source.connect(&Credentials::default(), "g1").await.unwrap();
        assert_eq!(source.latest_move().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MoveFileSource::new(dir.path().join("moves.txt"));
        let err = source
            .connect(&Credentials::default(), "g1")
            .await
            .unwrap_err();
        assert!(matches!(err, ObservationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_file_removed_after_connect_is_unavailable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        let mut source = MoveFileSource::new(&path);
        source.connect(&Credentials::default(), "g1").await.unwrap();

        drop(file);
        assert!(matches!(
            source.latest_move().await,
            Err(ObservationError::Unavailable(_))
        ));
    }
}
