use crate::capture::DiagnosticLog;
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use genmovelog_protocol::{Command, Response};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

/// Stderr counts as drained once it has been silent this long.
const STDERR_QUIET: Duration = Duration::from_millis(10);
/// Upper bound on one drain, for engines that never stop talking.
const STDERR_DRAIN_LIMIT: Duration = Duration::from_millis(250);

/// A GTP engine the dispatcher can talk to.
#[async_trait]
pub trait Engine: Send {
    /// Sends one command and waits for its complete response frame.
    async fn send(&mut self, command: &Command) -> Result<Response>;

    /// Resolves with the exit code once the engine has terminated; `None` when it
    /// died without one.
    async fn exited(&mut self) -> Option<i32> {
        std::future::pending().await
    }
}

/// The engine running as a child process.
///
/// Stdout carries GTP frames. Stderr is pumped line by line into the shared
/// [`DiagnosticLog`] by a background task, so diagnostics keep flowing while a
/// response is awaited. Before `send` returns, the pump has drained whatever the
/// engine wrote to stderr ahead of its response.
pub struct EngineProcess {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    sync_tx: mpsc::Sender<oneshot::Sender<()>>,
    exit_rx: watch::Receiver<Option<ExitStatus>>,
    kill_tx: oneshot::Sender<()>,
}

impl EngineProcess {
    pub fn spawn(program: &str, args: &[String], diagnostics: DiagnosticLog) -> Result<Self> {
        let mut child = ProcessCommand::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProxyError::Other("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProxyError::Other("engine stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProxyError::Other("engine stderr unavailable".to_string()))?;

        log::info!("spawned engine {program} (pid {:?})", child.id());

        let (sync_tx, sync_rx) = mpsc::channel(1);
        tokio::spawn(
            StderrPump {
                reader: BufReader::new(stderr),
                buf: Vec::new(),
                diagnostics,
                sync_rx,
            }
            .run(),
        );

        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            // The kill channel also fires when the handle is dropped.
            let status = tokio::select! {
                status = child.wait() => status,
                _ = kill_rx => {
                    let _ = child.start_kill();
                    child.wait().await
                }
            };
            match status {
                Ok(status) => {
                    log::info!("engine exited with {status}");
                    let _ = exit_tx.send(Some(status));
                }
                Err(err) => log::error!("failed to wait for engine: {err}"),
            }
        });

        Ok(Self {
            stdin,
            stdout: BufReader::new(stdout).lines(),
            sync_tx,
            exit_rx,
            kill_tx,
        })
    }

    /// Closes the engine's stdin and waits up to `grace` for it to leave on its own
    /// before killing it.
    pub async fn shutdown(self, grace: Duration) -> Option<i32> {
        let EngineProcess {
            stdin,
            stdout,
            mut exit_rx,
            kill_tx,
            ..
        } = self;
        drop(stdin);
        drop(stdout);

        match tokio::time::timeout(grace, wait_for_exit(&mut exit_rx)).await {
            Ok(code) => code,
            Err(_) => {
                log::warn!("engine still running after {grace:?}, killing it");
                let _ = kill_tx.send(());
                wait_for_exit(&mut exit_rx).await
            }
        }
    }

    /// Waits until the pump has ingested the stderr written so far.
    async fn drain_stderr(&mut self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.sync_tx.send(ack_tx).await.is_ok() {
            // An error means the pump hit EOF; nothing is left to drain.
            let _ = ack_rx.await;
        }
    }
}

/// Owns the engine's stderr. Lines go to the diagnostic log as they arrive; a
/// sync request is answered once stderr has gone quiet.
struct StderrPump {
    reader: BufReader<ChildStderr>,
    /// Survives cancelled reads, so a line split across reads is never lost.
    buf: Vec<u8>,
    diagnostics: DiagnosticLog,
    sync_rx: mpsc::Receiver<oneshot::Sender<()>>,
}

impl StderrPump {
    async fn run(mut self) {
        loop {
            let open = tokio::select! {
                biased;
                read = self.reader.read_until(b'\n', &mut self.buf) => self.on_read(read),
                Some(ack) = self.sync_rx.recv() => {
                    let open = self.drain().await;
                    let _ = ack.send(());
                    open
                }
            };
            if !open {
                break;
            }
        }
        log::debug!("engine stderr closed");
    }

    /// Reads until stderr stays quiet for `STDERR_QUIET`. Returns whether stderr
    /// is still open.
    async fn drain(&mut self) -> bool {
        let deadline = Instant::now() + STDERR_DRAIN_LIMIT;
        loop {
            let quiet_until = (Instant::now() + STDERR_QUIET).min(deadline);
            let result =
                tokio::time::timeout_at(quiet_until, self.reader.read_until(b'\n', &mut self.buf))
                    .await;
            match result {
                Ok(read) => {
                    if !self.on_read(read) {
                        return false;
                    }
                }
                Err(_) => return true,
            }
            if Instant::now() >= deadline {
                log::debug!("engine stderr still busy after {STDERR_DRAIN_LIMIT:?}");
                return true;
            }
        }
    }

    fn on_read(&mut self, read: std::io::Result<usize>) -> bool {
        match read {
            Ok(0) => {
                self.flush_line();
                false
            }
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.flush_line();
                }
                true
            }
            Err(err) => {
                log::warn!("engine stderr read failed: {err}");
                false
            }
        }
    }

    fn flush_line(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        {
            let line = String::from_utf8_lossy(&self.buf);
            self.diagnostics
                .ingest(line.trim_end_matches(|c: char| c == '\n' || c == '\r'));
        }
        self.buf.clear();
    }
}

#[async_trait]
impl Engine for EngineProcess {
    async fn send(&mut self, command: &Command) -> Result<Response> {
        log::debug!("engine <- {command}");
        let line = format!("{command}\n");
        if let Err(err) = write_line(&mut self.stdin, &line).await {
            return Err(match err.kind() {
                std::io::ErrorKind::BrokenPipe => ProxyError::EngineExited,
                _ => err.into(),
            });
        }
        let response = read_frame(&mut self.stdout).await?;
        self.drain_stderr().await;
        log::debug!("engine -> {response}");
        Ok(response)
    }

    async fn exited(&mut self) -> Option<i32> {
        wait_for_exit(&mut self.exit_rx).await
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await
}

async fn wait_for_exit(exit_rx: &mut watch::Receiver<Option<ExitStatus>>) -> Option<i32> {
    match exit_rx.wait_for(Option::is_some).await {
        Ok(status) => (*status).and_then(|status| status.code()),
        Err(_) => None,
    }
}

/// Reads one response frame: leading blank lines are skipped, the frame ends at the
/// next blank line.
pub(crate) async fn read_frame<R>(lines: &mut Lines<R>) -> Result<Response>
where
    R: AsyncBufRead + Unpin,
{
    let mut frame: Vec<String> = Vec::new();
    loop {
        let Some(line) = lines.next_line().await? else {
            return Err(ProxyError::EngineExited);
        };
        if line.trim().is_empty() {
            if frame.is_empty() {
                continue;
            }
            break;
        }
        frame.push(line);
    }
    Response::from_frame_lines(&frame).map_err(|err| ProxyError::MalformedResponse(err.to_string()))
}
