//! Drives the adapter against a scripted UCI responder.
#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use chess::{AnalysisScore, CoordinateMove, PieceColor, PieceKind};
use engine::{EngineConfig, EngineError, StockfishEngine};

fn fake_engine_config() -> EngineConfig {
    let script = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_uci.sh");
    EngineConfig {
        path: Some(PathBuf::from("/bin/sh")),
        args: vec![script.display().to_string()],
        search_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn stalled_engine_config(search_timeout: Duration) -> EngineConfig {
    let script = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stalled_uci.sh");
    EngineConfig {
        path: Some(PathBuf::from("/bin/sh")),
        args: vec![script.display().to_string()],
        search_timeout,
        ..Default::default()
    }
}

fn moves(uci: &[&str]) -> Vec<CoordinateMove> {
    uci.iter().map(|m| m.parse().unwrap()).collect()
}

#[tokio::test]
async fn analyze_after_first_move_returns_ranked_candidates() {
    let mut engine = StockfishEngine::spawn_with_config(fake_engine_config())
        .await
        .unwrap();

    let analysis = engine.analyze(&moves(&["e2e4"])).await.unwrap();

    assert_eq!(analysis.best_move.unwrap().to_string(), "e7e5");
    assert!(analysis.candidates.len() <= 3);
    let ranked: Vec<String> = analysis
        .candidates
        .iter()
        .map(|c| c.mv.to_string())
        .collect();
    assert_eq!(ranked, ["e7e5", "c7c5", "e7e6"]);
    // Deepest line wins over the earlier depth-1 report
    assert_eq!(
        analysis.candidates[0].score,
        Some(AnalysisScore::Centipawns(-25))
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn checkmated_position_has_no_best_move() {
    let mut engine = StockfishEngine::spawn_with_config(fake_engine_config())
        .await
        .unwrap();

    let analysis = engine
        .analyze(&moves(&["f2f3", "e7e5", "g2g4", "d8h4"]))
        .await
        .unwrap();

    assert_eq!(analysis.best_move, None);
    assert!(analysis.candidates.is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn resource_operations() {
    let mut engine = StockfishEngine::spawn_with_config(fake_engine_config())
        .await
        .unwrap();

    engine.set_position(&moves(&["e2e4"])).await.unwrap();
    let e4 = chess::parse_square("e4").unwrap();
    assert_eq!(
        engine.piece_at(e4),
        Some((PieceKind::Pawn, PieceColor::White))
    );
    assert_eq!(engine.piece_at(chess::parse_square("e2").unwrap()), None);

    assert_eq!(engine.best_move().await.unwrap().unwrap().to_string(), "e7e5");
    assert_eq!(engine.top_moves(2).await.unwrap().len(), 2);

    engine.shutdown().await;
}

#[tokio::test]
async fn illegal_position_is_rejected_locally() {
    let mut engine = StockfishEngine::spawn_with_config(fake_engine_config())
        .await
        .unwrap();

    let err = engine.set_position(&moves(&["e2e5"])).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidPosition { .. }));

    engine.shutdown().await;
}

#[tokio::test]
async fn missing_binary_is_not_found() {
    let config = EngineConfig {
        path: Some(PathBuf::from("/nonexistent/stockfish")),
        ..Default::default()
    };
    let err = StockfishEngine::spawn_with_config(config).await.err().unwrap();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn silent_process_times_out_or_closes() {
    // A shell that exits without ever answering `uci`
    let config = EngineConfig {
        path: Some(PathBuf::from("/bin/sh")),
        args: vec!["-c".to_string(), "exit 0".to_string()],
        ..Default::default()
    };
    let err = StockfishEngine::spawn_with_config(config).await.err().unwrap();
    assert!(matches!(
        err,
        EngineError::Closed | EngineError::Timeout(_, _)
    ));
}

#[tokio::test]
async fn unanswered_search_times_out() {
    let mut engine = StockfishEngine::spawn_with_config(stalled_engine_config(
        Duration::from_millis(300),
    ))
    .await
    .unwrap();

    let err = engine.analyze(&moves(&["e2e4"])).await.unwrap_err();
    assert!(
        matches!(err, EngineError::Timeout(d, "bestmove") if d == Duration::from_millis(300)),
        "unexpected error: {err:?}"
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn shutdown_sends_quit() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("quit");
    let mut config = fake_engine_config();
    config.args.push(marker.display().to_string());

    let engine = StockfishEngine::spawn_with_config(config).await.unwrap();
    assert!(!marker.exists());
    engine.shutdown().await;
    assert!(marker.exists());
}

#[tokio::test]
#[ignore = "requires a stockfish binary"]
async fn real_stockfish_suggests_a_reply() {
    let mut engine = StockfishEngine::spawn_with_config(EngineConfig {
        search: engine::GoParams {
            depth: Some(8),
            ..Default::default()
        },
        ..Default::default()
    })
    .await
    .unwrap();

    let analysis = engine.analyze(&moves(&["e2e4"])).await.unwrap();
    assert!(analysis.best_move.is_some());
    assert!(analysis.candidates.len() <= 3);

    engine.shutdown().await;
}
