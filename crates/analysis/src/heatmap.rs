use crate::classifier::{LineClassifier, LineKind};

pub const MAX_INTENSITY: u8 = 9;

/// Finds the first grid block in the log and scales it to `0..=9`.
///
/// Up to `board_size` consecutive grid rows are read. Returns an empty grid when
/// the log holds no grid at all.
pub fn extract_heatmap(log: &str, board_size: usize) -> Vec<Vec<u8>> {
    let raw: Vec<Vec<u64>> = log
        .lines()
        .skip_while(|line| LineClassifier::classify(line) != LineKind::GridRow)
        .take_while(|line| LineClassifier::classify(line) == LineKind::GridRow)
        .take(board_size)
        .map(|line| {
            line.split_whitespace()
                .filter_map(|cell| cell.parse::<u64>().ok())
                .collect()
        })
        .collect();

    if raw.is_empty() {
        log::debug!("no heatmap grid in diagnostic log");
    } else if raw.len() < board_size {
        log::warn!(
            "heatmap grid has {} rows, expected {board_size}",
            raw.len()
        );
    }

    normalize(&raw)
}

/// `floor(raw * 9.9 / max)` per cell; an all-zero block stays all zero.
pub fn normalize(raw: &[Vec<u64>]) -> Vec<Vec<u8>> {
    let max = raw.iter().flatten().copied().max().unwrap_or(0);
    raw.iter()
        .map(|row| {
            row.iter()
                .map(|&value| {
                    if max == 0 {
                        return 0;
                    }
                    let scaled = (value as f64 * 9.9 / max as f64).floor();
                    scaled.clamp(0.0, f64::from(MAX_INTENSITY)) as u8
                })
                .collect()
        })
        .collect()
}
