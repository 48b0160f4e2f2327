//! Live game monitor.
//!
//! Polls an [`ObservationSource`] for the moves of a game in progress,
//! replays them into a validated position, asks a UCI engine for the best
//! reply and prints a [`Report`] after every move. See [`run_monitor`].

pub mod config;
pub mod detector;
pub mod error;
pub mod history;
pub mod monitor;
pub mod report;
pub mod session;
pub mod source;

pub use config::{Cli, MonitorSettings};
pub use detector::{Change, ChangeDetector, Notation};
pub use error::{FailureContext, MonitorError, SessionFailure};
pub use history::{HistoryError, MoveHistory};
pub use monitor::{run_monitor, MonitorState};
pub use report::{CandidateLine, GameOver, Report};
pub use session::Session;
pub use source::{
    Credentials, LatestMove, MoveFileSource, ObservationError, ObservationSource, ScriptedSource,
};
