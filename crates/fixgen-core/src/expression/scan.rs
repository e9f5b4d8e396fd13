//! Bracket-aware string scanning shared by the lexers and the parser

/// Characters allowed in function, parameter, variable and property names
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters allowed in fixture ids inside references
pub(crate) fn is_reference_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '/'
}

fn opens_quote(previous: Option<char>) -> bool {
    matches!(previous, None | Some('(') | Some(',') | Some('[') | Some('{'))
}

/// Byte offsets of every top-level occurrence of `pattern`.
///
/// Occurrences nested inside `()`, `[]` or `{}`, or inside a quoted
/// argument (`'...'` / `"..."` starting right after an opening bracket or a
/// comma), are ignored.
pub(crate) fn top_level_matches(input: &str, pattern: &str) -> Vec<usize> {
    let mut matches = Vec::new();
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut previous: Option<char> = None;

    for (offset, c) in input.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            previous = Some(c);
            continue;
        }

        match c {
            '\'' | '"' if opens_quote(previous) => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }

        if depth == 0 && quote.is_none() && input[offset..].starts_with(pattern) {
            matches.push(offset);
        }

        if !c.is_whitespace() {
            previous = Some(c);
        }
    }

    matches
}

/// First top-level occurrence of `pattern`
pub(crate) fn find_top_level(input: &str, pattern: &str) -> Option<usize> {
    top_level_matches(input, pattern).into_iter().next()
}

/// Split on top-level occurrences of `separator`, trimming every part.
///
/// An empty or blank input yields no parts.
pub(crate) fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    if input.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut start = 0;
    let mut buf = [0u8; 4];
    for offset in top_level_matches(input, separator.encode_utf8(&mut buf)) {
        parts.push(input[start..offset].trim());
        start = offset + separator.len_utf8();
    }
    parts.push(input[start..].trim());
    parts
}

/// Whether the bracket opened at the first character closes on the last one
pub(crate) fn is_enclosed(input: &str, open: char, close: char) -> bool {
    if !input.starts_with(open) || !input.ends_with(close) || input.len() < 2 {
        return false;
    }

    let mut depth = 0usize;
    let last = input.len() - close.len_utf8();
    for (offset, c) in input.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return offset == last;
            }
        }
    }
    false
}

/// Strip matching single or double quotes around a literal argument
pub(crate) fn unquote(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return Some(&input[1..input.len() - 1]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_nested_separators() {
        assert_eq!(
            split_top_level("1, <numberBetween(1, 5)>, [a, b]", ','),
            vec!["1", "<numberBetween(1, 5)>", "[a, b]"]
        );
    }

    #[test]
    fn test_split_ignores_quoted_separators() {
        assert_eq!(split_top_level("'a, b', c", ','), vec!["'a, b'", "c"]);
        assert_eq!(split_top_level("it's, fine", ','), vec!["it's", "fine"]);
    }

    #[test]
    fn test_split_blank_input() {
        assert!(split_top_level("  ", ',').is_empty());
        assert_eq!(split_top_level("a,", ','), vec!["a", ""]);
    }

    #[test]
    fn test_find_top_level() {
        assert_eq!(find_top_level("a : b", " : "), Some(1));
        assert_eq!(find_top_level("<f(a : b)>", " : "), None);
    }

    #[test]
    fn test_is_enclosed() {
        assert!(is_enclosed("[a, [b]]", '[', ']'));
        assert!(!is_enclosed("[a] and [b]", '[', ']'));
        assert!(!is_enclosed("[", '[', ']'));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'abc'"), Some("abc"));
        assert_eq!(unquote("\"\""), Some(""));
        assert_eq!(unquote("'abc\""), None);
        assert_eq!(unquote("'"), None);
    }
}
