use std::io::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const LINE_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct CaptureBuffer {
    capturing: bool,
    text: String,
}

/// The engine's diagnostic channel as seen by the proxy.
///
/// Every ingested line is optionally relayed to our own stderr, appended to the
/// buffer while a capture is running, and then broadcast to subscribers. Appending
/// before broadcasting means a subscriber that has seen a line can rely on it being
/// in the next [`DiagnosticLog::snapshot`].
#[derive(Clone)]
pub struct DiagnosticLog {
    inner: Arc<DiagnosticLogInner>,
}

struct DiagnosticLogInner {
    buffer: Mutex<CaptureBuffer>,
    relay: AtomicBool,
    lines_tx: broadcast::Sender<String>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        let (lines_tx, _) = broadcast::channel(LINE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(DiagnosticLogInner {
                buffer: Mutex::new(CaptureBuffer::default()),
                relay: AtomicBool::new(true),
                lines_tx,
            }),
        }
    }

    /// Clears the buffer and starts appending.
    pub fn start(&self) {
        let mut buffer = self.lock();
        buffer.text.clear();
        buffer.capturing = true;
    }

    /// Stops appending; the buffer keeps its contents until the next `start`.
    pub fn stop(&self) {
        self.lock().capturing = false;
    }

    pub fn is_capturing(&self) -> bool {
        self.lock().capturing
    }

    pub fn snapshot(&self) -> String {
        self.lock().text.clone()
    }

    pub fn set_relay(&self, enabled: bool) {
        self.inner.relay.store(enabled, Ordering::Relaxed);
    }

    pub fn relay_enabled(&self) -> bool {
        self.inner.relay.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.lines_tx.subscribe()
    }

    pub fn ingest(&self, line: &str) {
        {
            let mut buffer = self.lock();
            if buffer.capturing {
                buffer.text.push_str(line);
                buffer.text.push('\n');
            }
        }

        if self.relay_enabled() {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{line}");
        }

        // No subscribers is the normal case outside a heatmap request.
        let _ = self.inner.lines_tx.send(line.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, CaptureBuffer> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::DiagnosticLog;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_appends_between_start_and_stop() {
        let log = DiagnosticLog::new();
        log.set_relay(false);

        log.ingest("before");
        log.start();
        log.ingest("one");
        log.ingest("two");
        log.stop();
        log.ingest("after");

        assert_eq!(log.snapshot(), "one\ntwo\n");
        assert!(!log.is_capturing());
    }

    #[test]
    fn start_clears_previous_capture() {
        let log = DiagnosticLog::new();
        log.set_relay(false);
        log.start();
        log.ingest("old");
        log.start();
        log.ingest("new");
        assert_eq!(log.snapshot(), "new\n");
    }

    #[test]
    fn relay_toggle_is_independent_of_capture() {
        let log = DiagnosticLog::new();
        assert!(log.relay_enabled());
        log.set_relay(false);
        log.start();
        assert!(!log.relay_enabled());
        assert!(log.is_capturing());
    }

    #[tokio::test]
    async fn subscribers_see_every_line() {
        let log = DiagnosticLog::new();
        log.set_relay(false);
        let mut rx = log.subscribe();
        log.ingest("not captured");
        log.start();
        log.ingest("captured");
        assert_eq!(rx.recv().await.expect("line"), "not captured");
        assert_eq!(rx.recv().await.expect("line"), "captured");
    }
}
