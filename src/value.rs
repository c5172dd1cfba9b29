use crate::model::Cell;

const CURRENCY_SYMBOLS: [char; 6] = ['$', '€', '£', '¥', '₹', '₩'];

/// Coerces a raw cell into a finite number.
///
/// Text is accepted in accounting notation: `"$1,234.50"` parses to
/// `1234.5` and `"(500)"` to `-500`. Returns `None` for anything that is
/// not numeric. Zero is a valid result.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(value) => value.is_finite().then_some(*value),
        Cell::Text(text) => parse_text(text),
        Cell::Empty | Cell::Bool(_) | Cell::Date(_) => None,
    }
}

fn parse_text(text: &str) -> Option<f64> {
    let mut text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }

    let negative = text.len() >= 2 && text.starts_with('(') && text.ends_with(')');
    if negative {
        text = &text[1..text.len() - 1];
    }

    let cleaned: String = text
        .chars()
        .filter(|ch| !CURRENCY_SYMBOLS.contains(ch) && *ch != ',' && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value = cleaned.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(if negative { -value } else { value })
}
