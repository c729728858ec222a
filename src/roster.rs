//! Participant list parsing

/// Ball colours, assigned by entry index (0xRRGGBB)
pub const PALETTE: [u32; 20] = [
    0xff6b6b, 0xfeca57, 0x48dbfb, 0xff9ff3, 0x54a0ff, 0x5f27cd, 0x00d2d3, 0xff6b9d, 0xc8d6e5,
    0x10ac84, 0xee5a24, 0x0abde3, 0xf368e0, 0x576574, 0x01a3a4, 0x9b59b6, 0x3498db, 0xe74c3c,
    0x2ecc71, 0xf39c12,
];

/// Colour for the `i`-th entrant
#[inline]
pub fn color_for(i: usize) -> u32 {
    PALETTE[i % PALETTE.len()]
}

/// Split free-form text into entrant names
///
/// Entries are separated by newlines or commas. `name*N` expands to N copies
/// of `name`; a malformed count keeps the entry verbatim.
pub fn parse_participants(text: &str) -> Vec<String> {
    let mut names = Vec::new();

    for entry in text.split(['\n', ',']).map(str::trim).filter(|s| !s.is_empty()) {
        match split_repeat(entry) {
            Some((name, count)) => names.extend(std::iter::repeat_n(name.to_string(), count)),
            None => names.push(entry.to_string()),
        }
    }

    names
}

/// `"Bob*3"` -> `("Bob", 3)`
fn split_repeat(entry: &str) -> Option<(&str, usize)> {
    let (name, count) = entry.rsplit_once('*')?;
    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, count.parse().ok()?))
}
