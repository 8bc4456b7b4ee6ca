/// GTP column letters; `I` is skipped.
const GTP_COLUMNS: &str = "ABCDEFGHJKLMNOPQRSTUVWXYZ";
const SGF_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

pub const MAX_BOARD_SIZE: usize = 25;

/// Converts a GTP vertex (`D4`, `q16`) into an SGF point (`dp`, `pd`).
///
/// `pass`, `resign`, malformed tokens and vertices outside the board yield an
/// empty string, which SGF reads as a pass.
pub fn coord_to_point(token: &str, board_size: usize) -> String {
    vertex(token, board_size)
        .map(|(x, y)| {
            let mut point = String::with_capacity(2);
            point.push(char::from(SGF_LETTERS[x]));
            point.push(char::from(SGF_LETTERS[y]));
            point
        })
        .unwrap_or_default()
}

fn vertex(token: &str, board_size: usize) -> Option<(usize, usize)> {
    if !(1..=MAX_BOARD_SIZE).contains(&board_size) {
        return None;
    }
    let token = token.trim();
    let mut chars = token.chars();
    let column = chars.next()?.to_ascii_uppercase();
    let x = GTP_COLUMNS.find(column)?;
    let row = chars.as_str().parse::<usize>().ok()?;
    if x >= board_size || row == 0 || row > board_size {
        return None;
    }
    Some((x, board_size - row))
}
