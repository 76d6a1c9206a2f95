/// One physical record of the source as the CSV reader will see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLine {
    /// An empty line. The `csv` reader skips these, so they are re-emitted
    /// as empty rows by the converter.
    Blank,
    /// A line (or several, when a quoted field spans newlines) holding a record.
    Record,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Start,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Split `text` into blank lines and records, in file order.
///
/// A quote only opens a quoted field at the start of a field, and line
/// breaks inside a quoted field do not end the record. `\r\n`, `\n` and a
/// lone `\r` each end one line.
pub fn raw_lines(text: &str) -> Vec<RawLine> {
    let mut lines = Vec::new();
    let mut state = Field::Start;
    let mut has_content = false;
    let mut after_cr = false;

    for b in text.bytes() {
        if after_cr {
            after_cr = false;
            if b == b'\n' {
                continue;
            }
        }
        if matches!(b, b'\n' | b'\r') && !matches!(state, Field::Quoted) {
            lines.push(if has_content {
                RawLine::Record
            } else {
                RawLine::Blank
            });
            has_content = false;
            state = Field::Start;
            after_cr = b == b'\r';
            continue;
        }
        has_content = true;
        state = match (state, b) {
            (Field::Quoted, b'"') => Field::QuoteInQuoted,
            (Field::Quoted, _) => Field::Quoted,
            (Field::QuoteInQuoted, b'"') => Field::Quoted,
            (Field::Start, b'"') => Field::Quoted,
            (_, b',') => Field::Start,
            _ => Field::Unquoted,
        };
    }
    if has_content {
        lines.push(RawLine::Record);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::{raw_lines, RawLine::*};

    #[test]
    fn test_plain_records() {
        assert_eq!(raw_lines("a,b\nc,d\n"), vec![Record, Record]);
        assert_eq!(raw_lines("a,b\nc,d"), vec![Record, Record]);
        assert_eq!(raw_lines(""), vec![]);
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(raw_lines("\n"), vec![Blank]);
        assert_eq!(raw_lines("a\n\nb\n"), vec![Record, Blank, Record]);
        assert_eq!(raw_lines("\na\n\n\n"), vec![Blank, Record, Blank, Blank]);
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(raw_lines("a\r\n\r\nb\r\n"), vec![Record, Blank, Record]);
        assert_eq!(raw_lines("a\r\rb"), vec![Record, Blank, Record]);
    }

    #[test]
    fn test_quoted_newlines_stay_in_record() {
        assert_eq!(raw_lines("a,\"x\n\ny\"\nb\n"), vec![Record, Record]);
        assert_eq!(raw_lines("\"say \"\"hi\"\"\n\"\n\n"), vec![Record, Blank]);
    }

    #[test]
    fn test_quote_inside_field_is_literal() {
        assert_eq!(raw_lines("a\"b\n\nc\n"), vec![Record, Blank, Record]);
    }

    #[test]
    fn test_delimiters_only_is_a_record() {
        assert_eq!(raw_lines(",\n"), vec![Record]);
    }
}
