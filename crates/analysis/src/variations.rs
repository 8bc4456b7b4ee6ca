use crate::classifier::{LineClassifier, BRANCH_MARKER, PV_MARKER};

/// Principal variations shorter than this are too shallow to show.
pub const MIN_VARIATION_MOVES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub key: String,
    pub value: String,
}

/// One candidate line reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    /// `None` when the engine printed something that is not a number.
    pub visits: Option<u64>,
    /// In order of appearance; keys are unique.
    pub stats: Vec<Stat>,
    /// GTP vertices, mover first.
    pub moves: Vec<String>,
}

impl Variation {
    pub fn stat(&self, key: &str) -> Option<&str> {
        self.stats
            .iter()
            .find(|stat| stat.key == key)
            .map(|stat| stat.value.as_str())
    }

    fn push_stat(&mut self, key: String, value: String) {
        match self.stats.iter_mut().find(|stat| stat.key == key) {
            Some(existing) => existing.value = value,
            None => self.stats.push(Stat { key, value }),
        }
    }
}

/// Extracts every qualifying branch line of a diagnostic log, in log order.
///
/// Lines that do not look like a branch line are skipped, never reported.
pub fn parse_variations(log: &str, depth_limit: usize) -> Vec<Variation> {
    let variations: Vec<Variation> = LineClassifier::scoped_branch_lines(log)
        .into_iter()
        .filter_map(|line| parse_branch_line(line, depth_limit))
        .collect();
    log::debug!("parsed {} variations from diagnostic log", variations.len());
    variations
}

/// Whitespace-separated tokens after the `PV:` marker.
pub(crate) fn principal_variation(line: &str) -> Vec<&str> {
    line.find(PV_MARKER)
        .map(|idx| line[idx + PV_MARKER.len()..].split_whitespace().collect())
        .unwrap_or_default()
}

fn parse_branch_line(line: &str, depth_limit: usize) -> Option<Variation> {
    let pv = principal_variation(line);
    if pv.len() < MIN_VARIATION_MOVES {
        return None;
    }

    let after_marker = &line[line.find(BRANCH_MARKER)? + BRANCH_MARKER.len()..];
    let pv_start = after_marker.find(PV_MARKER).unwrap_or(after_marker.len());
    let head = &after_marker[..pv_start];
    let stats_start = head.find('(').unwrap_or(head.len());

    let mut variation = Variation {
        visits: head[..stats_start].trim().parse::<u64>().ok(),
        stats: Vec::new(),
        moves: pv
            .into_iter()
            .take(depth_limit)
            .map(str::to_string)
            .collect(),
    };

    for group in parenthesized_groups(&head[stats_start..]) {
        let Some((key, value)) = group.split_once(':') else {
            continue;
        };
        let Some(key) = key.split_whitespace().next() else {
            continue;
        };
        variation.push_stat(key.to_string(), value.trim().to_string());
    }

    Some(variation)
}

fn parenthesized_groups(text: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('(') {
        let inner = &rest[open + 1..];
        let Some(close) = inner.find(')') else {
            break;
        };
        groups.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const BRANCH: &str = "1 -> 400 (V: 54.32%) (N: 12.3%) PV: D4 Q16 C3 D5 E6";

    fn stat(key: &str, value: &str) -> Stat {
        Stat {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn parses_visits_stats_and_moves() {
        let log = format!("NN eval=0.51\n{BRANCH}\n");
        let variations = parse_variations(&log, 21);
        assert_eq!(
            variations,
            vec![Variation {
                visits: Some(400),
                stats: vec![stat("V", "54.32%"), stat("N", "12.3%")],
                moves: vec!["D4", "Q16", "C3", "D5", "E6"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }]
        );
    }

    #[test]
    fn truncates_to_depth_limit() {
        let variations = parse_variations(BRANCH, 4);
        assert_eq!(variations[0].moves, vec!["D4", "Q16", "C3", "D5"]);
    }

    #[test]
    fn drops_shallow_lines() {
        let log = "D4 -> 10 (V: 50.00%) PV: D4 Q16 C3\nQ4 -> 9 (V: 49.00%) PV: Q4 D16 R3 C16";
        let variations = parse_variations(log, 21);
        assert_eq!(variations.len(), 1);
        assert_eq!(variations[0].visits, Some(9));
    }

    #[test]
    fn leela_zero_layout_with_lcb() {
        let log = "\
Playouts: 1600, Win: 54.32%, PV: D4 Q16 Q4 D16
NN eval=0.543210
 D4 ->    1523 (V: 54.32%) (LCB: 53.10%) (N: 45.67%) PV: D4 Q16 Q4 D16 R17
Q16 ->     101 (V: 52.10%) (LCB: 49.00%) (N: 20.01%) PV: Q16 D4 D16 Q4 C3
";
        let variations = parse_variations(log, 7);
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0].visits, Some(1523));
        assert_eq!(variations[0].stat("LCB"), Some("53.10%"));
        let keys: Vec<&str> = variations[0].stats.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["V", "LCB", "N"]);
        assert_eq!(variations[1].moves[0], "Q16");
    }

    #[test]
    fn malformed_visits_become_sentinel() {
        let log = "D4 -> lots (V: 50.00%) PV: D4 Q16 C3 D5";
        let variations = parse_variations(log, 21);
        assert_eq!(variations.len(), 1);
        assert_eq!(variations[0].visits, None);
        assert_eq!(variations[0].stat("V"), Some("50.00%"));
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let log = "D4 -> 5 (V: 1%) (N: 2%) (V: 3%) PV: D4 Q16 C3 D5";
        let variations = parse_variations(log, 21);
        assert_eq!(variations[0].stats, vec![stat("V", "3%"), stat("N", "2%")]);
    }

    #[test]
    fn empty_log_yields_nothing() {
        assert!(parse_variations("", 21).is_empty());
        assert!(parse_variations("NN eval=0.5\nno branches here", 21).is_empty());
    }

    proptest! {
        #[test]
        fn never_emits_shallow_variations(depth in 1usize..30, count in 0usize..12) {
            let moves: Vec<String> = (0..count).map(|i| format!("D{}", i % 19 + 1)).collect();
            let line = format!("D4 -> 7 (V: 50.00%) PV: {}", moves.join(" "));
            let variations = parse_variations(&line, depth);
            prop_assert_eq!(variations.len(), usize::from(count >= MIN_VARIATION_MOVES));
            for variation in variations {
                prop_assert!(variation.moves.len() <= depth);
            }
        }
    }
}
