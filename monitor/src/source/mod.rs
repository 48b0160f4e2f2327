//! Where observed moves come from.
//!
//! The monitor never reads a game page itself. An [`ObservationSource`]
//! hands it the displayed move list as SAN text; how that text is obtained
//! (a file kept current by a scraper, a canned script) is up to the
//! implementation.

mod file;
mod scripted;

pub use file::{parse_move_list, MoveFileSource};
pub use scripted::{ScriptedSource, SourceCall};

use std::fmt;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationError {
    #[error("{0}")]
    Unavailable(String),
    #[error("malformed move list: {0}")]
    Malformed(String),
}

/// The most recent move shown by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestMove {
    pub san: String,
    /// Number of moves displayed, when the source knows it.
    pub ply: Option<usize>,
}

/// Login details passed through to the source untouched.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
pub trait ObservationSource: Send {
    /// Open the game view. Called once, before any other method.
    async fn connect(&mut self, credentials: &Credentials, game_id: &str)
        -> Result<(), ObservationError>;

    /// Every move currently displayed, oldest first.
    async fn current_move_list(&mut self) -> Result<Vec<String>, ObservationError>;

    /// The last displayed move, or `None` before the first move.
    async fn latest_move(&mut self) -> Result<Option<LatestMove>, ObservationError>;

    /// Release whatever `connect` acquired. Must be safe to call more than
    /// once and after a failed `connect`.
    async fn close(&mut self);
}
