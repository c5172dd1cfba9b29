//! Parsing of A1-style addresses and ranges.
//!
//! Range text arrives from hand-edited configuration, so it may carry a sheet
//! prefix (`Data!B2:B9`), absolute markers (`$B$2`) or lower-case letters.
//! [`normalize`] reduces all of these to a canonical `TOPLEFT:BOTTOMRIGHT`
//! string and [`RangeRef::decode`] turns that into zero-based coordinates.

use std::fmt;

/// A zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), u64::from(self.row) + 1)
    }
}

/// An inclusive rectangular span of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRef {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl RangeRef {
    /// Normalizes and decodes range text in one step.
    pub fn parse(text: &str) -> Option<RangeRef> {
        Self::decode(&normalize(text)?)
    }

    /// Decodes a canonical `A1:B2` string. Returns `None` when either
    /// address is malformed or the span is empty (end before start).
    pub fn decode(canonical: &str) -> Option<RangeRef> {
        let (first, last) = canonical.split_once(':')?;
        let start = parse_address(first)?;
        let end = parse_address(last)?;
        if end.row < start.row || end.col < start.col {
            return None;
        }
        Some(RangeRef { start, end })
    }

    pub fn rows(&self) -> usize {
        (self.end.row - self.start.row) as usize + 1
    }

    pub fn cols(&self) -> usize {
        (self.end.col - self.start.col) as usize + 1
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Reduces address or range text to canonical `TOPLEFT:BOTTOMRIGHT` form.
///
/// A lone address such as `b10` becomes `B10:B10`. Returns `None` for
/// anything that is not one address or two addresses joined by `:`.
pub fn normalize(text: &str) -> Option<String> {
    let without_sheet = match text.rfind('!') {
        Some(pos) => &text[pos + 1..],
        None => text,
    };

    let cleaned: String = without_sheet
        .trim()
        .chars()
        .filter(|ch| *ch != '$')
        .map(|ch| ch.to_ascii_uppercase())
        .collect();

    let mut tokens = cleaned.split(':');
    let first = tokens.next()?;
    match (tokens.next(), tokens.next()) {
        (None, _) if is_address_token(first) => Some(format!("{first}:{first}")),
        (Some(second), None) if is_address_token(first) && is_address_token(second) => {
            Some(format!("{first}:{second}"))
        }
        _ => None,
    }
}

/// Matches `letters+digits`, e.g. `B10` or `AA3`.
fn is_address_token(token: &str) -> bool {
    let digits_at = token
        .find(|ch: char| !ch.is_ascii_uppercase())
        .unwrap_or(token.len());
    let (letters, digits) = token.split_at(digits_at);
    !letters.is_empty() && !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

fn parse_address(token: &str) -> Option<CellAddress> {
    if !is_address_token(token) {
        return None;
    }
    let digits_at = token.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = token.split_at(digits_at);

    let col = column_letters_to_index(letters)?;
    let row = digits.parse::<u32>().ok()?.checked_sub(1)?;
    Some(CellAddress { row, col })
}

/// `A` → 0, `Z` → 25, `AA` → 26.
fn column_letters_to_index(letters: &str) -> Option<u32> {
    let mut result: u32 = 0;
    for ch in letters.chars() {
        let value = (ch as u32).checked_sub('A' as u32)? + 1;
        result = result.checked_mul(26)?.checked_add(value)?;
    }
    result.checked_sub(1)
}

fn column_name(mut col: u32) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
