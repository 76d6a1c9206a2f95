pub mod header;

/// Character classes the boundary rules look at. Only ASCII letters and
/// digits take part in word boundaries; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Lower,
    Digit,
    Upper,
    LineFeed,
    Other,
}

impl CharClass {
    pub fn of(ch: char) -> Self {
        match ch {
            'a'..='z' => CharClass::Lower,
            '0'..='9' => CharClass::Digit,
            'A'..='Z' => CharClass::Upper,
            '\n' => CharClass::LineFeed,
            _ => CharClass::Other,
        }
    }
}

/// Whether a `_` goes between `prev` and `cur`, given the character after `cur`.
///
/// Rule A: lowercase or digit followed by uppercase (`catName`, `a1B`).
/// Rule B: anything but a line feed followed by a capitalized word
/// (`PedigreeID` keeps `ID` whole, `HTTPServer` splits before `Server`).
pub fn boundary_before(prev: char, cur: char, next: Option<char>) -> bool {
    if CharClass::of(cur) != CharClass::Upper {
        return false;
    }
    let prev = CharClass::of(prev);
    let after_lower_or_digit = matches!(prev, CharClass::Lower | CharClass::Digit);
    let starts_word = prev != CharClass::LineFeed
        && next.map_or(false, |c| CharClass::of(c) == CharClass::Lower);
    after_lower_or_digit || starts_word
}

/// Convert PascalCase / camelCase to snake_case.
///
/// Surrounding whitespace is trimmed first. Uppercase runs are only split by
/// the two boundary rules, so a bare acronym like `FFJCU` stays whole.
pub fn to_snake(s: &str) -> String {
    let chars: Vec<char> = s.trim().chars().collect();
    let mut result = String::with_capacity(chars.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 && boundary_before(chars[i - 1], ch, chars.get(i + 1).copied()) {
            result.push('_');
        }
        result.push(ch);
    }
    result.to_lowercase()
}
