use crate::dispatcher::Dispatcher;
use crate::engine::Engine;
use crate::error::{ProxyError, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The client closed its end; the engine is still running.
    ClientClosed,
    /// The engine terminated with this exit code.
    EngineExited(Option<i32>),
}

/// Reads client commands from `input` one line at a time and writes each response
/// frame to `output` before reading the next command.
pub async fn serve<E, R, W>(
    dispatcher: &mut Dispatcher<E>,
    input: R,
    mut output: W,
) -> Result<ServeOutcome>
where
    E: Engine,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            code = dispatcher.engine_mut().exited() => {
                return Ok(ServeOutcome::EngineExited(code));
            }
        };
        let Some(line) = line else {
            log::info!("client closed the connection");
            return Ok(ServeOutcome::ClientClosed);
        };

        match dispatcher.handle_line(&line).await {
            Ok(Some(frame)) => {
                output.write_all(frame.as_bytes()).await?;
                output.flush().await?;
            }
            Ok(None) => {}
            Err(ProxyError::EngineExited) => {
                let code = dispatcher.engine_mut().exited().await;
                return Ok(ServeOutcome::EngineExited(code));
            }
            Err(err) => return Err(err),
        }
    }
}
