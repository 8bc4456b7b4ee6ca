//! # genmovelog analysis
//!
//! Turns the engine's free-form diagnostic log into structured results.
//!
//! ## Pipeline
//!
//! ```text
//! diagnostic log
//!     │
//!     ├──> Line Classifier
//!     │      └─ Ignorable | AnalysisMarker | BranchLine | GridRow
//!     │
//!     ├──> Variation Parser ──> Move-Tree Serializer ──> SGF
//!     │
//!     ├──> Label Assigner ──> dp:A;pd:B;...
//!     │
//!     └──> Heatmap Extractor ──> rows of 0..=9
//! ```
//!
//! Parsing is lenient: lines that do not match the expected shape are skipped.

mod classifier;
mod heatmap;
mod labels;
mod move_tree;
mod variations;

pub use classifier::{LineClassifier, LineKind};
pub use heatmap::{extract_heatmap, normalize, MAX_INTENSITY};
pub use labels::{assign_labels, render_labels, Label};
pub use move_tree::{render_variations, TreeLayout};
pub use variations::{parse_variations, Stat, Variation, MIN_VARIATION_MOVES};
