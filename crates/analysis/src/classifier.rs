use once_cell::sync::Lazy;
use regex::Regex;

const ANALYSIS_MARKERS: [&str; 2] = ["MC winrate=", "NN eval="];
pub(crate) const BRANCH_MARKER: &str = "->";
pub(crate) const PV_MARKER: &str = "PV:";

static GRID_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[0-9]+(?:\s+[0-9]+)*\s*$").expect("grid row pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Anything the parsers do not look at
    Ignorable,
    /// Search summary that precedes the per-move breakdown
    AnalysisMarker,
    /// One candidate move with its visits, stats and principal variation
    BranchLine,
    /// A row of the policy heatmap: integers and nothing else
    GridRow,
}

pub struct LineClassifier;

impl LineClassifier {
    #[must_use]
    pub fn classify(line: &str) -> LineKind {
        if ANALYSIS_MARKERS.iter().any(|marker| line.contains(marker)) {
            return LineKind::AnalysisMarker;
        }
        if line.contains(BRANCH_MARKER) {
            return LineKind::BranchLine;
        }
        if GRID_ROW.is_match(line) {
            return LineKind::GridRow;
        }
        LineKind::Ignorable
    }

    #[must_use]
    pub fn is_grid_row(line: &str) -> bool {
        Self::classify(line) == LineKind::GridRow
    }

    /// Branch lines at or after the first analysis marker, or in the whole log when
    /// the engine printed no marker.
    pub(crate) fn scoped_branch_lines(log: &str) -> Vec<&str> {
        let lines: Vec<(&str, LineKind)> = log
            .lines()
            .map(|line| (line, Self::classify(line)))
            .collect();
        let start = lines
            .iter()
            .position(|(_, kind)| *kind == LineKind::AnalysisMarker)
            .unwrap_or(0);

        lines[start..]
            .iter()
            .filter(|(_, kind)| *kind == LineKind::BranchLine)
            .map(|(line, _)| *line)
            .collect()
    }
}
