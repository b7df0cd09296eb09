/// Parse a typed answer reference: `1`-based digits or a letter (`a`/`A`
/// for the first answer). Returns `None` when it does not address one of
/// `answer_count` answers.
#[must_use]
pub fn parse_choice(input: &str, answer_count: usize) -> Option<usize> {
    let input = input.trim();
    let index = if let Ok(number) = input.parse::<usize>() {
        number.checked_sub(1)?
    } else {
        let mut chars = input.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !letter.is_ascii_uppercase() {
            return None;
        }
        usize::from(letter as u8 - b'A')
    };
    (index < answer_count).then_some(index)
}

/// Letter label for an answer position (`0` → `A`).
#[must_use]
pub fn choice_label(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'A' + i))
}

/// Selection after moving up from `current`; nothing selected jumps to the
/// last answer, the first answer stays put.
#[must_use]
pub fn cycle_up(current: Option<usize>, answer_count: usize) -> Option<usize> {
    match current {
        None => answer_count.checked_sub(1),
        Some(idx) if idx > 0 => Some(idx - 1),
        Some(idx) => Some(idx),
    }
}

/// Selection after moving down from `current`; nothing selected jumps to the
/// first answer, the last answer stays put.
#[must_use]
pub fn cycle_down(current: Option<usize>, answer_count: usize) -> Option<usize> {
    match current {
        None => (answer_count > 0).then_some(0),
        Some(idx) if idx + 1 < answer_count => Some(idx + 1),
        Some(idx) => Some(idx),
    }
}
