//! # genmovelog protocol
//!
//! The GTP surface shared by the analysis and proxy crates.
//!
//! - [`Command`] / [`Response`]: line-based GTP request and response frames
//! - [`Color`]: stone colors as they appear in GTP arguments and SGF properties
//! - [`coord_to_point`]: GTP vertices (`D4`) to SGF points (`dp`)
//! - [`GenmoveLog`] / [`HeatmapPayload`]: structured results embedded after the
//!   `#sabaki` sentinel inside a success response

mod color;
mod command;
mod coords;
mod payload;
mod response;

pub use color::Color;
pub use command::{Command, GENMOVELOG_COMMAND};
pub use coords::{coord_to_point, MAX_BOARD_SIZE};
pub use payload::{embed_payload, extract_payload, GenmoveLog, HeatmapPayload, SABAKI_SENTINEL};
pub use response::Response;
