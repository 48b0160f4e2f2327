use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chess::{Analysis, Candidate, CoordinateMove, PieceColor, PieceKind};
use cozy_chess::{Board, Square};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::sync::mpsc;

use crate::uci::{parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineError, EngineEvent, GoParams};

/// Time allowed for `uciok` and `readyok`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Well-known install locations, tried before `PATH`.
const DEFAULT_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

pub struct StockfishEngine {
    process: Child,
    stdin: mpsc::Sender<String>,
    event_rx: mpsc::Receiver<EngineEvent>,
    /// Our own replay of the last position sent, for square lookups.
    position: Board,
    multipv: u8,
    search: GoParams,
    search_timeout: Duration,
}

/// Configuration for the engine process and its searches.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Binary to run. Searched for in the usual places when `None`.
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
    /// 0..=20, the Stockfish "Skill Level" option.
    pub skill_level: Option<u8>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Number of ranked lines per search.
    pub multipv: u8,
    pub search: GoParams,
    pub search_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            skill_level: Some(20),
            threads: None,
            hash_mb: None,
            multipv: 3,
            search: GoParams {
                depth: Some(15),
                ..Default::default()
            },
            search_timeout: Duration::from_secs(30),
        }
    }
}

impl StockfishEngine {
    /// Spawn the engine and run the UCI handshake. The returned engine has
    /// all options applied and has answered `readyok`.
    #[tracing::instrument(level = "info", skip(config), fields(path = ?config.path))]
    pub async fn spawn_with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let path = match &config.path {
            Some(path) => resolve_configured_path(path)?,
            None => find_stockfish_path()
                .ok_or_else(|| EngineError::NotFound("stockfish".to_string()))?,
        };
        tracing::info!("Found engine at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                tracing::error!("Failed to spawn engine: {}", source);
                if source.kind() == std::io::ErrorKind::NotFound {
                    EngineError::NotFound(path.display().to_string())
                } else {
                    EngineError::Spawn {
                        path: path.clone(),
                        source,
                    }
                }
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoPipe("stdin"))?;
        let stdout = process.stdout.take().ok_or(EngineError::NoPipe("stdout"))?;

        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(64);
        tokio::spawn(read_engine_output(stdout, event_tx));

        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                tracing::trace!("UCI >> {}", cmd.trim());
                if let Err(e) = stdin.write_all(cmd.as_bytes()).await {
                    tracing::error!("Failed to write to engine stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush engine stdin: {}", e);
                    break;
                }
            }
            tracing::debug!("Stdin writer task exiting");
        });

        let mut engine = Self {
            process,
            stdin: stdin_tx,
            event_rx,
            position: Board::default(),
            multipv: config.multipv.max(1),
            search: config.search,
            search_timeout: config.search_timeout,
        };

        engine.send_command(EngineCommand::Uci).await?;
        engine.wait_ready("uciok").await?;

        if let Some(level) = config.skill_level {
            let level = level.min(20);
            tracing::info!("Setting skill level to {}", level);
            engine.set_option("Skill Level", level).await?;
        }
        if let Some(threads) = config.threads {
            engine.set_option("Threads", threads.clamp(1, 16)).await?;
        }
        if let Some(hash_mb) = config.hash_mb {
            engine.set_option("Hash", hash_mb.clamp(1, 2048)).await?;
        }
        engine.set_option("MultiPV", engine.multipv).await?;

        engine.send_command(EngineCommand::IsReady).await?;
        engine.wait_ready("readyok").await?;

        tracing::info!("Engine spawned and initialized");
        Ok(engine)
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        tracing::debug!("Queueing command: {:?}", cmd);
        self.stdin
            .send(format_command(&cmd))
            .await
            .map_err(|_| EngineError::Closed)
    }

    async fn set_option(&self, name: &str, value: impl ToString) -> Result<(), EngineError> {
        self.send_command(EngineCommand::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        })
        .await
    }

    async fn wait_ready(&mut self, what: &'static str) -> Result<(), EngineError> {
        let event_rx = &mut self.event_rx;
        tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
            while let Some(event) = event_rx.recv().await {
                if matches!(event, EngineEvent::Ready) {
                    return Ok(());
                }
            }
            Err(EngineError::Closed)
        })
        .await
        .map_err(|_| {
            tracing::error!("Timeout waiting for {}", what);
            EngineError::Timeout(HANDSHAKE_TIMEOUT, what)
        })?
    }

    /// Set the position to the standard start followed by `moves`.
    ///
    /// The moves are replayed locally as well; a move that is not legal
    /// there is rejected before anything reaches the engine.
    pub async fn set_position(&mut self, moves: &[CoordinateMove]) -> Result<(), EngineError> {
        let mut board = Board::default();
        for mv in moves {
            let internal = mv
                .to_board_move(&board)
                .ok_or_else(|| EngineError::InvalidPosition { mv: mv.to_string() })?;
            board.play_unchecked(internal);
        }

        self.send_command(EngineCommand::SetPosition {
            moves: moves.to_vec(),
        })
        .await?;
        self.position = board;
        Ok(())
    }

    /// Search the current position, keeping the top `lines` principal
    /// variations.
    pub async fn search(&mut self, lines: u8) -> Result<Analysis, EngineError> {
        let lines = lines.max(1);
        if lines != self.multipv {
            self.set_option("MultiPV", lines).await?;
            self.multipv = lines;
        }

        self.send_command(EngineCommand::Go(self.search)).await?;

        let mut ranked: BTreeMap<u8, Candidate> = BTreeMap::new();
        let mut depth = None;
        let mut nodes = None;
        let event_rx = &mut self.event_rx;
        let waited = tokio::time::timeout(self.search_timeout, async {
            loop {
                match event_rx.recv().await {
                    Some(EngineEvent::Info(info)) => {
                        depth = info.depth.or(depth);
                        nodes = info.nodes.or(nodes);
                        // Lines without a pv are progress reports
                        if let Some(first) = info.pv.first() {
                            ranked.insert(
                                info.multipv.unwrap_or(1),
                                Candidate {
                                    mv: *first,
                                    score: info.score.map(Into::into),
                                },
                            );
                        }
                    }
                    Some(EngineEvent::BestMove(mv)) => return Ok(mv),
                    Some(EngineEvent::Ready) => continue,
                    None => return Err(EngineError::Closed),
                }
            }
        })
        .await;

        let best_move = match waited {
            Ok(result) => result?,
            Err(_) => {
                let _ = self.send_command(EngineCommand::Stop).await;
                return Err(EngineError::Timeout(self.search_timeout, "bestmove"));
            }
        };

        let Some(best) = best_move else {
            tracing::info!("Engine reports no legal moves");
            return Ok(Analysis::default());
        };

        let mut candidates: Vec<Candidate> =
            ranked.into_values().take(lines as usize).collect();
        if candidates.is_empty() {
            candidates.push(Candidate {
                mv: best,
                score: None,
            });
        }

        tracing::info!(
            best = %best,
            lines = candidates.len(),
            depth = ?depth,
            nodes = ?nodes,
            "Search complete"
        );
        Ok(Analysis {
            best_move: Some(best),
            candidates,
        })
    }

    /// Best move in the current position.
    pub async fn best_move(&mut self) -> Result<Option<CoordinateMove>, EngineError> {
        Ok(self.search(self.multipv).await?.best_move)
    }

    /// Top `n` ranked moves in the current position.
    pub async fn top_moves(&mut self, n: u8) -> Result<Vec<Candidate>, EngineError> {
        Ok(self.search(n).await?.candidates)
    }

    /// Set the position from the full move sequence and search it.
    ///
    /// Each call supplies the whole game; nothing carries over from the
    /// previous query except the engine's hash table. At a fixed depth the
    /// result is repeatable, with `movetime` it may vary between calls.
    #[tracing::instrument(level = "debug", skip(self, moves), fields(plies = moves.len()))]
    pub async fn analyze(&mut self, moves: &[CoordinateMove]) -> Result<Analysis, EngineError> {
        self.set_position(moves).await?;
        self.search(self.multipv).await
    }

    /// Piece on `square` in the position last sent with [`Self::set_position`].
    pub fn piece_at(&self, square: Square) -> Option<(PieceKind, PieceColor)> {
        let piece = self.position.piece_on(square)?;
        let color = self.position.color_on(square)?;
        Some((piece.into(), color.into()))
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
        tracing::info!("Engine shut down");
    }
}

async fn read_engine_output(stdout: ChildStdout, event_tx: mpsc::Sender<EngineEvent>) {
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tracing::warn!("Engine stdout EOF - engine closed");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                tracing::trace!("UCI << {}", trimmed);

                let event = match parse_uci_message(trimmed) {
                    Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                    Ok(UciMessage::BestMove { mv, .. }) => EngineEvent::BestMove(mv),
                    Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                    Ok(msg) => {
                        tracing::trace!("Ignoring UCI message: {:?}", msg);
                        continue;
                    }
                    Err(e) => {
                        tracing::trace!("Failed to parse UCI message: {}", e);
                        continue;
                    }
                };

                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!("Error reading from engine stdout: {}", e);
                break;
            }
        }
    }
    tracing::debug!("Output reader task exiting");
}

/// Render a command as the line written to the engine.
fn format_command(cmd: &EngineCommand) -> String {
    let mut line = match cmd {
        EngineCommand::Uci => "uci".to_string(),
        EngineCommand::IsReady => "isready".to_string(),
        EngineCommand::SetPosition { moves } => {
            let mut position = "position startpos".to_string();
            if !moves.is_empty() {
                position.push_str(" moves");
                for mv in moves {
                    position.push_str(&format!(" {}", mv));
                }
            }
            position
        }
        EngineCommand::SetOption { name, value } => match value {
            Some(val) => format!("setoption name {} value {}", name, val),
            None => format!("setoption name {}", name),
        },
        EngineCommand::Go(params) => {
            let mut go = "go".to_string();
            if let Some(movetime) = params.movetime {
                go.push_str(&format!(" movetime {}", movetime));
            } else if let Some(depth) = params.depth {
                go.push_str(&format!(" depth {}", depth));
            } else if params.infinite {
                go.push_str(" infinite");
            } else {
                go.push_str(" movetime 1000"); // Default 1 second
            }
            go
        }
        EngineCommand::Stop => "stop".to_string(),
        EngineCommand::Quit => "quit".to_string(),
    };
    line.push('\n');
    line
}

/// Check an explicitly configured binary. Bare names are looked up on `PATH`.
fn resolve_configured_path(path: &Path) -> Result<PathBuf, EngineError> {
    let is_bare_name = path.components().count() == 1 && !path.is_absolute();
    let resolved = if is_bare_name {
        search_path(path)
    } else {
        path.is_file().then(|| path.to_path_buf())
    };
    resolved.ok_or_else(|| EngineError::NotFound(path.display().to_string()))
}

/// Find Stockfish executable in common locations
fn find_stockfish_path() -> Option<PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .or_else(|| search_path(Path::new("stockfish")))
}

fn search_path(name: &Path) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
