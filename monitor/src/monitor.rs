//! The monitoring loop.
//!
//! ```text
//! Bootstrapping ──► Reporting ──► Polling ──► Analyzing ──► Reporting ─┐
//!                                   ▲  │ no change                     │
//!                                   │  └──────┘                        │
//!                                   └──────────────────────────────────┘
//! ```
//!
//! Any fatal error, or the shutdown signal, moves the loop to `Stopped`.
//! The observation source is closed and the engine shut down on every exit.

use std::io::Write;

use engine::StockfishEngine;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;

use crate::config::MonitorSettings;
use crate::detector::{Change, ChangeDetector};
use crate::error::{MonitorError, SessionFailure};
use crate::history::HistoryError;
use crate::report::Report;
use crate::session::Session;
use crate::source::ObservationSource;

#[derive(Debug)]
pub enum MonitorState {
    /// Reading the full move list and replaying it.
    Bootstrapping,
    /// Waiting for the next tick, then asking for the latest move.
    Polling,
    /// A new move was observed and must be applied and analysed.
    Analyzing(String),
    /// A report is ready for the output sink.
    Reporting(Box<Report>),
    Stopped,
}

impl MonitorState {
    fn name(&self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::Polling => "polling",
            Self::Analyzing(_) => "analyzing",
            Self::Reporting(_) => "reporting",
            Self::Stopped => "stopped",
        }
    }
}

/// Watch one game until `shutdown` becomes `true` (or its sender is
/// dropped), writing one report per observed move to `out`.
///
/// Returns `Ok(())` on cancellation. Any fatal error stops the session and
/// comes back with the context it interrupted.
pub async fn run_monitor<S, W>(
    settings: &MonitorSettings,
    source: &mut S,
    out: &mut W,
    shutdown: watch::Receiver<bool>,
) -> Result<(), SessionFailure>
where
    S: ObservationSource,
    W: Write,
{
    let span = tracing::info_span!("session", game = %settings.game_id);
    run_monitor_inner(settings, source, out, shutdown)
        .instrument(span)
        .await
}

async fn run_monitor_inner<S, W>(
    settings: &MonitorSettings,
    source: &mut S,
    out: &mut W,
    shutdown: watch::Receiver<bool>,
) -> Result<(), SessionFailure>
where
    S: ObservationSource,
    W: Write,
{
    if let Err(e) = source
        .connect(&settings.credentials, &settings.game_id)
        .await
    {
        tracing::error!("Failed to connect to observation source: {}", e);
        source.close().await;
        return Err(SessionFailure::at_start(e));
    }

    let engine = match StockfishEngine::spawn_with_config(settings.engine.clone()).await {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Engine unavailable: {}", e);
            source.close().await;
            return Err(SessionFailure::at_start(e));
        }
    };

    let mut session = Session::new(engine);
    let result = drive(settings, &mut session, source, out, shutdown).await;

    let context = session.context();
    session.close().await;
    source.close().await;

    match result {
        Ok(()) => {
            tracing::info!(plies = context.plies, "Monitor stopped");
            Ok(())
        }
        Err(error) => {
            tracing::error!(
                last_move = context.last_move.as_deref().unwrap_or("-"),
                side_to_move = %context.side_to_move,
                plies = context.plies,
                "Monitor stopped: {}",
                error
            );
            Err(SessionFailure::new(error, context))
        }
    }
}

async fn drive<S, W>(
    settings: &MonitorSettings,
    session: &mut Session,
    source: &mut S,
    out: &mut W,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), MonitorError>
where
    S: ObservationSource,
    W: Write,
{
    let detector = ChangeDetector::new(settings.notation);
    let mut ticker = time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut state = MonitorState::Bootstrapping;
    loop {
        tracing::debug!(state = state.name(), "Monitor step");
        state = match state {
            MonitorState::Bootstrapping => {
                let moves = source.current_move_list().await?;
                tracing::info!(plies = moves.len(), "Bootstrapping from move list");
                session.bootstrap(moves)?;
                MonitorState::Reporting(Box::new(session.analyze().await?))
            }

            MonitorState::Polling => {
                if *shutdown.borrow() {
                    MonitorState::Stopped
                } else {
                    tokio::select! {
                        biased;

                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                tracing::debug!("Shutdown sender dropped");
                            }
                            MonitorState::Stopped
                        }

                        _ = ticker.tick() => {
                            poll(&detector, session, source).await?
                        }
                    }
                }
            }

            MonitorState::Analyzing(san) => {
                let coord = session.record_move(&san)?;
                tracing::info!(san = %san, uci = %coord, ply = session.history().len(), "New move");
                if settings.verify_history {
                    let observed = source.current_move_list().await?;
                    session
                        .history()
                        .reconcile(&observed, settings.notation)?;
                }
                MonitorState::Reporting(Box::new(session.analyze().await?))
            }

            MonitorState::Reporting(report) => {
                write!(out, "{report}")?;
                out.flush()?;
                MonitorState::Polling
            }

            MonitorState::Stopped => {
                tracing::info!("Shutdown requested");
                return Ok(());
            }
        };
    }
}

/// One observation: compare the source's latest move with the history.
async fn poll<S: ObservationSource>(
    detector: &ChangeDetector,
    session: &Session,
    source: &mut S,
) -> Result<MonitorState, MonitorError> {
    let Some(latest) = source.latest_move().await? else {
        if session.history().is_empty() {
            return Ok(MonitorState::Polling);
        }
        return Err(HistoryError::Shrunk {
            known: session.history().len(),
            observed: 0,
        }
        .into());
    };

    match detector.detect_latest(session.history(), &latest)? {
        Change::NoChange => Ok(MonitorState::Polling),
        Change::NewMove(san) => Ok(MonitorState::Analyzing(san)),
    }
}
