use clap::Parser;
use genmovelog_analysis::TreeLayout;
use genmovelog_protocol::Color;
use std::time::Duration;

/// Variation depth with `--limitdepth`.
pub const LIMITED_DEPTH: usize = 7;
/// Variation depth otherwise.
pub const FULL_DEPTH: usize = 21;

pub const HEATMAP_TIMEOUT_ENV: &str = "GENMOVELOG_HEATMAP_TIMEOUT_MS";

const GTP_MODE_FLAG: &str = "--gtp";

#[derive(Parser, Debug)]
#[command(name = "genmovelog")]
#[command(
    about = "GTP proxy that shows Leela Zero variations, labels and heatmaps in Sabaki",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Render each variation as one node with the final stones and move numbers
    #[arg(long)]
    pub flat: bool,

    /// Attach the network policy heatmap to every sabaki-genmovelog response
    #[arg(long)]
    pub heatmap: bool,

    /// Report variations after black moves
    #[arg(long)]
    pub black: bool,

    /// Report variations after white moves
    #[arg(long)]
    pub white: bool,

    /// Truncate variations to 7 moves instead of 21
    #[arg(long)]
    pub limitdepth: bool,

    /// Label the first move of each variation on the board
    #[arg(long)]
    pub labels: bool,

    /// Stop waiting for heatmap rows after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub heatmap_timeout_ms: Option<u64>,

    /// Verbose proxy logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log proxy errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Engine executable followed by its own arguments
    #[arg(required = true, trailing_var_arg = true, value_name = "ENGINE")]
    pub engine_command: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    pub flatten_trees: bool,
    pub show_heatmap: bool,
    pub include_black: bool,
    pub include_white: bool,
    pub show_labels: bool,
}

impl FeatureFlags {
    pub fn includes(&self, mover: Color) -> bool {
        match mover {
            Color::Black => self.include_black,
            Color::White => self.include_white,
        }
    }

    pub fn layout(&self) -> TreeLayout {
        if self.flatten_trees {
            TreeLayout::Flat
        } else {
            TreeLayout::Nested
        }
    }
}

/// Everything the dispatcher needs besides the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub features: FeatureFlags,
    pub depth_limit: usize,
    pub heatmap_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::default(),
            depth_limit: FULL_DEPTH,
            heatmap_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub session: SessionConfig,
    pub engine_program: String,
    pub engine_args: Vec<String>,
    pub log_filter: log::LevelFilter,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<ProxyConfig> {
        let env_timeout = std::env::var(HEATMAP_TIMEOUT_ENV).ok();
        self.into_config_with_env(env_timeout.as_deref())
    }

    fn into_config_with_env(self, env_timeout: Option<&str>) -> anyhow::Result<ProxyConfig> {
        let mut command = self.engine_command.into_iter();
        let engine_program = command
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing engine executable"))?;
        let mut engine_args: Vec<String> = command.collect();
        if !engine_args.iter().any(|arg| arg == GTP_MODE_FLAG) {
            engine_args.push(GTP_MODE_FLAG.to_string());
        }

        let heatmap_timeout = match self.heatmap_timeout_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => parse_timeout_ms(env_timeout),
        };

        let log_filter = if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };

        Ok(ProxyConfig {
            session: SessionConfig {
                features: FeatureFlags {
                    flatten_trees: self.flat,
                    show_heatmap: self.heatmap,
                    include_black: self.black,
                    include_white: self.white,
                    show_labels: self.labels,
                },
                depth_limit: if self.limitdepth {
                    LIMITED_DEPTH
                } else {
                    FULL_DEPTH
                },
                heatmap_timeout,
            },
            engine_program,
            engine_args,
            log_filter,
        })
    }
}

/// Missing, empty, zero or unparsable values mean "wait forever".
pub fn parse_timeout_ms(raw: Option<&str>) -> Option<Duration> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            log::warn!("ignoring invalid {HEATMAP_TIMEOUT_ENV}={raw:?}");
            None
        }
    }
}
