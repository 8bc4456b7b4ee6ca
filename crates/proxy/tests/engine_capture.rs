#![cfg(unix)]

use anyhow::{Context, Result};
use genmovelog::{DiagnosticLog, Dispatcher, EngineProcess, FeatureFlags, SessionConfig};
use genmovelog_protocol::{extract_payload, Command, GenmoveLog, HeatmapPayload, GENMOVELOG_COMMAND};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::time::Duration;

const BRANCH_LINES: usize = 20;

/// Writes a burst of diagnostics right before each `genmove` response, and the
/// heatmap grid only after the `heatmap` response.
const CHATTY_ENGINE: &str = r#"#!/bin/sh
while IFS= read -r line; do
  set -- $line
  id=""
  case "$1" in
    [0-9]*) id="$1"; shift ;;
  esac
  case "$1" in
    genmove)
      echo "NN eval=0.5" >&2
      i=0
      while [ "$i" -lt 20 ]; do
        echo "D4 -> 10 (V: 50.00%) (N: 5.00%) PV: D4 Q16 C3 D5" >&2
        i=$((i + 1))
      done
      printf '=%s Q16\n\n' "$id"
      ;;
    heatmap)
      printf '=%s\n\n' "$id"
      sleep 0.05
      echo "NN eval=0.5" >&2
      i=0
      while [ "$i" -lt 19 ]; do
        echo "  0   1   2   3   4   5   6   7   8   9  10  11  12  13  14  15  16  17  $i" >&2
        i=$((i + 1))
      done
      echo "pass: 0" >&2
      ;;
    *)
      printf '?%s unknown command\n\n' "$id"
      ;;
  esac
done
"#;

fn spawn_dispatcher(dir: &Path) -> Result<Dispatcher<EngineProcess>> {
    let script = dir.join("chatty-engine.sh");
    std::fs::write(&script, CHATTY_ENGINE)?;

    let diagnostics = DiagnosticLog::new();
    diagnostics.set_relay(false);
    let engine = EngineProcess::spawn(
        "sh",
        &[script.display().to_string(), "--gtp".to_string()],
        diagnostics.clone(),
    )
    .context("spawn chatty engine")?;

    let config = SessionConfig {
        features: FeatureFlags {
            include_black: true,
            ..FeatureFlags::default()
        },
        ..SessionConfig::default()
    };
    Ok(Dispatcher::new(engine, diagnostics, config))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stderr_written_before_the_response_is_captured() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut dispatcher = spawn_dispatcher(dir.path())?;

    for round in 0..100 {
        let response = dispatcher
            .handle(Command::new("genmove").with_args(["b"]))
            .await?;
        assert_eq!(response.content, "Q16");

        let log = dispatcher.handle(Command::new(GENMOVELOG_COMMAND)).await?;
        let payload: GenmoveLog = extract_payload(&log.content).context("genmovelog payload")?;
        assert_eq!(
            payload.variations.matches("(;").count(),
            BRANCH_LINES,
            "round {round}"
        );
    }

    dispatcher
        .into_engine()
        .shutdown(Duration::from_secs(2))
        .await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn heatmap_rows_after_the_response_still_arrive() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut dispatcher = spawn_dispatcher(dir.path())?;

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        dispatcher.handle(Command::new("heatmap").with_id(Some(9))),
    )
    .await
    .context("timeout waiting for heatmap")??;
    assert_eq!(response.id, Some(9));

    let payload: HeatmapPayload = extract_payload(&response.content).context("heatmap payload")?;
    assert_eq!(payload.heatmap.len(), 19);
    assert!(payload.heatmap.iter().all(|row| row.len() == 19));
    assert_eq!(payload.heatmap[18][18], 9);

    dispatcher
        .into_engine()
        .shutdown(Duration::from_secs(2))
        .await;
    Ok(())
}
