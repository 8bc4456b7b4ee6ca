use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchOutcome {
    Satisfied,
    TimedOut,
    Closed,
}

/// Countdown latch over diagnostic lines: satisfied once `count` lines matched.
pub struct SignalLatch {
    remaining: usize,
    matches: fn(&str) -> bool,
}

impl SignalLatch {
    pub fn new(count: usize, matches: fn(&str) -> bool) -> Self {
        Self {
            remaining: count,
            matches,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_satisfied(&self) -> bool {
        self.remaining == 0
    }

    /// Counts `line` if it matches; returns whether the latch is now satisfied.
    pub fn observe(&mut self, line: &str) -> bool {
        if self.remaining > 0 && (self.matches)(line) {
            self.remaining -= 1;
        }
        self.is_satisfied()
    }

    /// Drains `lines` until satisfied. Without a timeout this waits for as long as
    /// the channel stays open.
    pub async fn wait(
        mut self,
        lines: &mut broadcast::Receiver<String>,
        timeout: Option<Duration>,
    ) -> LatchOutcome {
        let drain = async move {
            while !self.is_satisfied() {
                match lines.recv().await {
                    Ok(line) => {
                        self.observe(&line);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("diagnostic subscriber lagged, {skipped} lines skipped");
                    }
                    Err(RecvError::Closed) => return LatchOutcome::Closed,
                }
            }
            LatchOutcome::Satisfied
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, drain)
                .await
                .unwrap_or(LatchOutcome::TimedOut),
            None => drain.await,
        }
    }
}
