//! # genmovelog
//!
//! A GTP proxy between Sabaki and a Leela Zero engine. Commands pass through to
//! the engine unchanged, except for the few the proxy answers itself:
//!
//! ```text
//! Sabaki ──stdin──> Dispatcher ──stdin──> engine
//!    ^                  │                   │
//!    └────stdout────────┤<──────stdout──────┘
//!                       │
//!                       │<── DiagnosticLog <── stderr (relayed to our stderr)
//!                       │
//!     sabaki-genmovelog ├─> variations / labels / heatmap from the capture
//!               heatmap ├─> engine `heatmap` + wait for the grid rows
//!         list_commands └─> engine list + sabaki-genmovelog
//! ```
//!
//! Structured results travel inside an ordinary success response, after the
//! `#sabaki` sentinel, as a single JSON object.

pub mod capture;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod latch;
pub mod server;
pub mod session;

pub use capture::DiagnosticLog;
pub use config::{Cli, FeatureFlags, ProxyConfig, SessionConfig};
pub use dispatcher::Dispatcher;
pub use engine::{Engine, EngineProcess};
pub use error::{ProxyError, Result};
pub use latch::{LatchOutcome, SignalLatch};
pub use server::{serve, ServeOutcome};
pub use session::{Phase, SessionState};

use anyhow::Context;
use clap::Parser;
use std::time::Duration;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Runs the proxy on the process's stdio and returns the exit code to leave with.
pub async fn main_entry() -> anyhow::Result<i32> {
    let config = Cli::parse().into_config()?;

    // Stderr is shared with the relayed engine diagnostics.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .target(env_logger::Target::Stderr)
    .init();

    log::info!(
        "starting {} {}",
        config.engine_program,
        config.engine_args.join(" ")
    );

    let diagnostics = DiagnosticLog::new();
    let engine = EngineProcess::spawn(
        &config.engine_program,
        &config.engine_args,
        diagnostics.clone(),
    )
    .with_context(|| format!("failed to start engine {}", config.engine_program))?;

    let mut dispatcher = Dispatcher::new(engine, diagnostics, config.session);
    let outcome = serve(&mut dispatcher, tokio::io::stdin(), tokio::io::stdout()).await?;

    let code = match outcome {
        ServeOutcome::EngineExited(code) => {
            log::info!("engine exited, leaving with {code:?}");
            code.unwrap_or(1)
        }
        ServeOutcome::ClientClosed => {
            dispatcher.into_engine().shutdown(SHUTDOWN_GRACE).await;
            0
        }
    };
    Ok(code)
}
