use genmovelog_protocol::{Color, Command, MAX_BOARD_SIZE};

pub const DEFAULT_BOARD_SIZE: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Capturing,
}

/// Per-connection state. Transitions are pure; the dispatcher owns the only copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub board_size: usize,
    pub last_mover: Color,
    pub phase: Phase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            last_mover: Color::Black,
            phase: Phase::Idle,
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn begin_capture(self) -> Self {
        Self {
            phase: Phase::Capturing,
            ..self
        }
    }

    #[must_use]
    pub fn end_capture(self) -> Self {
        Self {
            phase: Phase::Idle,
            ..self
        }
    }

    /// State after the engine accepted `command`.
    #[must_use]
    pub fn after_success(self, command: &Command) -> Self {
        match command.name.as_str() {
            "genmove" | "play" => match command.arg(0).and_then(Color::from_gtp_arg) {
                Some(last_mover) => Self { last_mover, ..self },
                None => self,
            },
            "boardsize" => match command.arg(0).and_then(parse_board_size) {
                Some(board_size) => Self { board_size, ..self },
                None => {
                    log::warn!("keeping board size {} after {command}", self.board_size);
                    self
                }
            },
            _ => self,
        }
    }
}

/// Commands whose diagnostics are recorded while they run.
pub(crate) fn captures_diagnostics(name: &str) -> bool {
    matches!(name, "genmove" | "play")
}

fn parse_board_size(raw: &str) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|size| (1..=MAX_BOARD_SIZE).contains(size))
}
