use crate::capture::DiagnosticLog;
use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::latch::{LatchOutcome, SignalLatch};
use crate::session::{captures_diagnostics, SessionState};
use genmovelog_analysis::{
    assign_labels, extract_heatmap, parse_variations, render_labels, render_variations,
    LineClassifier,
};
use genmovelog_protocol::{
    embed_payload, Command, GenmoveLog, HeatmapPayload, Response, GENMOVELOG_COMMAND,
};

/// How a client command is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// `sabaki-genmovelog`: answered from the captured diagnostics
    GenmoveLog,
    /// `known_command sabaki-genmovelog`: always `true`
    KnownGenmoveLog,
    /// `heatmap`: forwarded, then answered from the grid it prints
    Heatmap,
    /// Everything else goes to the engine verbatim
    Delegate,
}

impl Route {
    fn of(command: &Command) -> Self {
        match command.name.as_str() {
            GENMOVELOG_COMMAND => Route::GenmoveLog,
            "known_command" if command.arg(0) == Some(GENMOVELOG_COMMAND) => {
                Route::KnownGenmoveLog
            }
            "heatmap" => Route::Heatmap,
            _ => Route::Delegate,
        }
    }
}

enum HeatmapOutcome {
    Grid(Vec<Vec<u8>>),
    Rejected(Response),
}

/// Routes client commands, keeping session state and capture in step with what the
/// engine has accepted.
pub struct Dispatcher<E> {
    engine: E,
    diagnostics: DiagnosticLog,
    state: SessionState,
    config: SessionConfig,
}

impl<E: Engine> Dispatcher<E> {
    pub fn new(engine: E, diagnostics: DiagnosticLog, config: SessionConfig) -> Self {
        Self {
            engine,
            diagnostics,
            state: SessionState::default(),
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Handles one raw client line. Returns the frame to write back, or `None` for
    /// lines that carry no command.
    pub async fn handle_line(&mut self, line: &str) -> Result<Option<String>> {
        let Some(command) = Command::parse(line) else {
            return Ok(None);
        };
        let response = self.handle(command).await?;
        Ok(Some(response.to_frame()))
    }

    pub async fn handle(&mut self, command: Command) -> Result<Response> {
        log::debug!("client -> {command}");
        match Route::of(&command) {
            Route::GenmoveLog => self.genmove_log(command.id).await,
            Route::KnownGenmoveLog => Ok(Response::success(command.id, "true")),
            Route::Heatmap => self.heatmap(command.id).await,
            Route::Delegate => self.delegate(command).await,
        }
    }

    async fn delegate(&mut self, command: Command) -> Result<Response> {
        let captures = captures_diagnostics(&command.name);
        if captures {
            self.state = self.state.begin_capture();
            self.diagnostics.start();
        }

        let mut response = self.engine.send(&command).await?;

        if captures {
            self.diagnostics.stop();
            self.state = self.state.end_capture();
        }
        if response.error {
            return Ok(response);
        }

        self.state = self.state.after_success(&command);
        if command.is("list_commands") {
            response.content.push('\n');
            response.content.push_str(GENMOVELOG_COMMAND);
        }
        Ok(response)
    }

    async fn genmove_log(&mut self, id: Option<u32>) -> Result<Response> {
        let mut payload = GenmoveLog::default();
        let mover = self.state.last_mover;
        let features = self.config.features;

        if features.includes(mover) {
            let log = self.diagnostics.snapshot();
            let variations = parse_variations(&log, self.config.depth_limit);
            payload.variations =
                render_variations(&variations, mover, self.state.board_size, features.layout());
            if features.show_labels && !variations.is_empty() {
                payload.labels = render_labels(&assign_labels(&log, self.state.board_size));
            }
            log::debug!(
                "reporting {} variations after {mover} move",
                variations.len()
            );
        } else {
            log::debug!("variations after {mover} moves are not requested");
        }

        if features.show_heatmap {
            self.diagnostics.set_relay(false);
            let outcome = self.collect_heatmap().await;
            self.diagnostics.set_relay(true);
            match outcome? {
                HeatmapOutcome::Grid(grid) => payload.heatmap = Some(grid),
                HeatmapOutcome::Rejected(response) => {
                    log::warn!("engine rejected heatmap: {}", response.content);
                }
            }
        }

        Ok(Response::success(id, embed_payload(&payload)?))
    }

    async fn heatmap(&mut self, id: Option<u32>) -> Result<Response> {
        match self.collect_heatmap().await? {
            HeatmapOutcome::Grid(heatmap) => {
                Ok(Response::success(id, embed_payload(&HeatmapPayload { heatmap })?))
            }
            HeatmapOutcome::Rejected(response) => Ok(Response { id, ..response }),
        }
    }

    /// Sends `heatmap` to the engine and waits until both its response and
    /// `board_size` grid rows on the diagnostic channel have arrived.
    ///
    /// Capture stays on afterwards; the next move command restarts it.
    async fn collect_heatmap(&mut self) -> Result<HeatmapOutcome> {
        self.state = self.state.begin_capture();
        self.diagnostics.start();

        let board_size = self.state.board_size;
        let timeout = self.config.heatmap_timeout;
        let mut lines = self.diagnostics.subscribe();
        let latch = SignalLatch::new(board_size, LineClassifier::is_grid_row);
        let command = Command::new("heatmap");

        let outcome = {
            let send = self.engine.send(&command);
            let barrier = latch.wait(&mut lines, timeout);
            tokio::pin!(send);
            tokio::pin!(barrier);

            tokio::select! {
                response = &mut send => {
                    let response = response?;
                    if response.error {
                        return Ok(HeatmapOutcome::Rejected(response));
                    }
                    barrier.await
                }
                outcome = &mut barrier => {
                    let response = send.await?;
                    if response.error {
                        return Ok(HeatmapOutcome::Rejected(response));
                    }
                    outcome
                }
            }
        };

        match outcome {
            LatchOutcome::Satisfied => {}
            LatchOutcome::TimedOut => {
                log::warn!("heatmap rows incomplete after {timeout:?}, using what arrived");
            }
            LatchOutcome::Closed => {
                log::warn!("diagnostic channel closed before the heatmap was complete");
            }
        }

        let grid = extract_heatmap(&self.diagnostics.snapshot(), board_size);
        Ok(HeatmapOutcome::Grid(grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_intercepted_commands() {
        assert_eq!(
            Route::of(&Command::new(GENMOVELOG_COMMAND)),
            Route::GenmoveLog
        );
        assert_eq!(
            Route::of(&Command::new("known_command").with_args([GENMOVELOG_COMMAND])),
            Route::KnownGenmoveLog
        );
        assert_eq!(Route::of(&Command::new("heatmap")), Route::Heatmap);
    }

    #[test]
    fn other_known_command_queries_go_to_engine() {
        assert_eq!(
            Route::of(&Command::new("known_command").with_args(["genmove"])),
            Route::Delegate
        );
        assert_eq!(Route::of(&Command::new("known_command")), Route::Delegate);
        assert_eq!(
            Route::of(&Command::new("Sabaki-genmovelog")),
            Route::Delegate
        );
    }
}
