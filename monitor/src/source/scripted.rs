//! In-memory source that replays canned move lists.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Credentials, LatestMove, ObservationError, ObservationSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Connect { game_id: String },
    CurrentMoveList,
    LatestMove,
    Close,
}

#[derive(Debug, Clone)]
enum Frame {
    Show(Vec<String>),
    Fail(String),
}

/// Each `latest_move` call advances to the next scripted frame; the move
/// list then stays at that frame until the next poll. Once the script runs
/// out, the last list keeps being shown.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    shown: Vec<String>,
    frames: VecDeque<Frame>,
    report_ply: bool,
    fail_connect: Option<String>,
    on_exhausted: Option<watch::Sender<bool>>,
    calls: Vec<SourceCall>,
}

impl ScriptedSource {
    /// Start with `initial` on display. Ply counts are reported by default.
    pub fn new(initial: &[&str]) -> Self {
        Self {
            shown: to_owned(initial),
            report_ply: true,
            ..Default::default()
        }
    }

    pub fn then_show(mut self, moves: &[&str]) -> Self {
        self.frames.push_back(Frame::Show(to_owned(moves)));
        self
    }

    pub fn then_fail(mut self, reason: &str) -> Self {
        self.frames.push_back(Frame::Fail(reason.to_string()));
        self
    }

    /// Report only the move text, like a source that cannot count moves.
    pub fn without_ply(mut self) -> Self {
        self.report_ply = false;
        self
    }

    pub fn failing_connect(mut self, reason: &str) -> Self {
        self.fail_connect = Some(reason.to_string());
        self
    }

    /// Flip `shutdown` to `true` on the first poll after the script ends.
    pub fn cancel_when_exhausted(mut self, shutdown: watch::Sender<bool>) -> Self {
        self.on_exhausted = Some(shutdown);
        self
    }

    pub fn calls(&self) -> &[SourceCall] {
        &self.calls
    }

    pub fn is_closed(&self) -> bool {
        self.calls.last() == Some(&SourceCall::Close)
    }
}

fn to_owned(moves: &[&str]) -> Vec<String> {
    moves.iter().map(|m| m.to_string()).collect()
}

#[async_trait]
impl ObservationSource for ScriptedSource {
    async fn connect(
        &mut self,
        _credentials: &Credentials,
        game_id: &str,
    ) -> Result<(), ObservationError> {
        self.calls.push(SourceCall::Connect {
            game_id: game_id.to_string(),
        });
        match &self.fail_connect {
            Some(reason) => Err(ObservationError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    async fn current_move_list(&mut self) -> Result<Vec<String>, ObservationError> {
        self.calls.push(SourceCall::CurrentMoveList);
        Ok(self.shown.clone())
    }

    async fn latest_move(&mut self) -> Result<Option<LatestMove>, ObservationError> {
        self.calls.push(SourceCall::LatestMove);
        match self.frames.pop_front() {
            Some(Frame::Show(moves)) => self.shown = moves,
            Some(Frame::Fail(reason)) => return Err(ObservationError::Unavailable(reason)),
            None => {
                if let Some(shutdown) = self.on_exhausted.take() {
                    let _ = shutdown.send(true);
                }
            }
        }

        let ply = self.report_ply.then_some(self.shown.len());
        Ok(self.shown.last().map(|san| LatestMove {
            san: san.clone(),
            ply,
        }))
    }

    async fn close(&mut self) {
        self.calls.push(SourceCall::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_advance_per_poll() {
        let mut source = ScriptedSource::new(&[]).then_show(&["e4"]).then_fail("gone");

        assert!(source.current_move_list().await.unwrap().is_empty());
        let latest = source.latest_move().await.unwrap().unwrap();
        assert_eq!(latest.san, "e4");
        assert_eq!(latest.ply, Some(1));
        assert_eq!(source.current_move_list().await.unwrap(), ["e4"]);
        assert!(source.latest_move().await.is_err());
        // Script exhausted: keeps showing the last list
        assert_eq!(source.latest_move().await.unwrap().unwrap().san, "e4");
    }

    #[tokio::test]
    async fn test_cancel_when_exhausted() {
        let (tx, rx) = watch::channel(false);
        let mut source = ScriptedSource::new(&["e4"]).cancel_when_exhausted(tx);
        source.latest_move().await.unwrap();
        assert!(*rx.borrow());
    }
}
