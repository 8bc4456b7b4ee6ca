use crate::classifier::LineClassifier;
use crate::variations::{principal_variation, MIN_VARIATION_MOVES};
use genmovelog_protocol::coord_to_point;

const LABEL_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub point: String,
    pub letter: char,
}

/// Letters the first move of every qualifying variation: A, B, C, ... and `Z` for
/// everything past the 26th.
///
/// A variation that opens with a pass keeps its letter slot but gets no label.
/// No `:A` pair with an empty point is emitted for it, so `render_labels` never
/// produces an entry that Sabaki cannot place on the board.
pub fn assign_labels(log: &str, board_size: usize) -> Vec<Label> {
    LineClassifier::scoped_branch_lines(log)
        .into_iter()
        .map(principal_variation)
        .filter(|pv| pv.len() >= MIN_VARIATION_MOVES)
        .enumerate()
        .filter_map(|(idx, pv)| {
            let point = coord_to_point(pv[0], board_size);
            if point.is_empty() {
                return None;
            }
            let letter = LABEL_LETTERS[idx.min(LABEL_LETTERS.len() - 1)];
            Some(Label {
                point,
                letter: char::from(letter),
            })
        })
        .collect()
}

/// SGF `LB`-style rendering: `dp:A;pd:B`.
pub fn render_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| format!("{}:{}", label.point, label.letter))
        .collect::<Vec<_>>()
        .join(";")
}
