use crate::variations::Variation;
use genmovelog_protocol::{coord_to_point, Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeLayout {
    /// One node per move, colors alternating from the mover
    #[default]
    Nested,
    /// One node per variation holding the final stones and move numbers
    Flat,
}

/// Renders every variation as its own SGF game tree, concatenated in order.
pub fn render_variations(
    variations: &[Variation],
    mover: Color,
    board_size: usize,
    layout: TreeLayout,
) -> String {
    let mut out = String::new();
    for variation in variations {
        out.push_str("(;C[");
        out.push_str(&escape_text(&annotation(variation)));
        out.push(']');
        match layout {
            TreeLayout::Nested => push_nested(&mut out, variation, mover, board_size),
            TreeLayout::Flat => push_flat(&mut out, variation, mover, board_size),
        }
        out.push(')');
    }
    out
}

fn annotation(variation: &Variation) -> String {
    let visits = variation
        .visits
        .map_or_else(|| "NaN".to_string(), |v| v.to_string());
    let mut lines = vec![format!("- `{visits}` visits")];
    lines.extend(
        variation
            .stats
            .iter()
            .map(|stat| format!("  - **{}** `{}`", stat.key, stat.value)),
    );
    lines.join("\n")
}

fn color_at(mover: Color, index: usize) -> Color {
    if index % 2 == 0 {
        mover
    } else {
        mover.opponent()
    }
}

fn push_nested(out: &mut String, variation: &Variation, mover: Color, board_size: usize) {
    let nodes: Vec<String> = variation
        .moves
        .iter()
        .enumerate()
        .map(|(idx, vertex)| {
            format!(
                "{}[{}]",
                color_at(mover, idx).as_sgf(),
                coord_to_point(vertex, board_size)
            )
        })
        .collect();
    out.push_str(&nodes.join(";"));
}

fn push_flat(out: &mut String, variation: &Variation, mover: Color, board_size: usize) {
    let mut black = Vec::new();
    let mut white = Vec::new();
    let mut order = Vec::new();

    for (idx, vertex) in variation.moves.iter().enumerate() {
        let point = coord_to_point(vertex, board_size);
        if point.is_empty() {
            continue;
        }
        order.push(format!("{point}:{}", idx + 1));
        match color_at(mover, idx) {
            Color::Black => black.push(point),
            Color::White => white.push(point),
        }
    }

    for (property, values) in [("AB", black), ("AW", white), ("LB", order)] {
        if values.is_empty() {
            continue;
        }
        out.push_str(property);
        out.push('[');
        out.push_str(&values.join("]["));
        out.push(']');
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variations::Stat;
    use pretty_assertions::assert_eq;

    fn variation(visits: Option<u64>, moves: &[&str]) -> Variation {
        Variation {
            visits,
            stats: vec![
                Stat {
                    key: "V".to_string(),
                    value: "54.32%".to_string(),
                },
                Stat {
                    key: "N".to_string(),
                    value: "12.3%".to_string(),
                },
            ],
            moves: moves.iter().map(|m| m.to_string()).collect(),
        }
    }

    const COMMENT: &str = "C[- `400` visits\n  - **V** `54.32%`\n  - **N** `12.3%`]";

    #[test]
    fn nested_alternates_from_mover() {
        let sgf = render_variations(
            &[variation(Some(400), &["D4", "Q16", "C3", "D5"])],
            Color::White,
            19,
            TreeLayout::Nested,
        );
        assert_eq!(sgf, format!("(;{COMMENT}W[dp];B[pd];W[cq];B[do])"));
    }

    #[test]
    fn nested_renders_pass_as_empty_point() {
        let sgf = render_variations(
            &[variation(Some(400), &["D4", "pass", "C3", "D5"])],
            Color::Black,
            19,
            TreeLayout::Nested,
        );
        assert!(sgf.ends_with("B[dp];W[];B[cq];W[do])"), "{sgf}");
    }

    #[test]
    fn flat_splits_colors_and_numbers_moves() {
        let sgf = render_variations(
            &[variation(Some(400), &["D4", "Q16", "C3", "D5"])],
            Color::Black,
            19,
            TreeLayout::Flat,
        );
        assert_eq!(
            sgf,
            format!("(;{COMMENT}AB[dp][cq]AW[pd][do]LB[dp:1][pd:2][cq:3][do:4])")
        );
    }

    #[test]
    fn flat_skips_passes_but_keeps_numbering() {
        let sgf = render_variations(
            &[variation(Some(1), &["D4", "pass", "C3", "D5"])],
            Color::Black,
            19,
            TreeLayout::Flat,
        );
        assert!(sgf.contains("AB[dp][cq]AW[do]LB[dp:1][cq:3][do:4]"), "{sgf}");
    }

    #[test]
    fn concatenates_without_separator_and_marks_bad_visits() {
        let sgf = render_variations(
            &[
                variation(None, &["D4", "Q16", "C3", "D5"]),
                variation(Some(3), &["Q4", "D16", "R3", "C16"]),
            ],
            Color::Black,
            19,
            TreeLayout::Nested,
        );
        assert!(sgf.starts_with("(;C[- `NaN` visits"));
        assert!(sgf.contains(")(;C[- `3` visits"));
        assert_eq!(sgf.matches("(;").count(), 2);
    }

    #[test]
    fn escapes_closing_brackets_in_comment() {
        let mut v = variation(Some(1), &["D4", "Q16", "C3", "D5"]);
        v.stats = vec![Stat {
            key: "X".to_string(),
            value: "a]b".to_string(),
        }];
        let sgf = render_variations(&[v], Color::Black, 19, TreeLayout::Nested);
        assert!(sgf.contains("`a\\]b`"), "{sgf}");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(
            render_variations(&[], Color::Black, 19, TreeLayout::Flat),
            ""
        );
    }
}
