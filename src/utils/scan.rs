//! Bracket- and string-aware scanning over expression text.
//!
//! Template attribute values, loop headers, contract shapes and interpolations
//! all embed host-language expressions. Splitting them on a separator or
//! finding a closing bracket has to skip over string literals and nested
//! brackets, and for shapes also over comments. [`scan`] does that walk once
//! and reports every code character together with its nesting depth.

use std::ops::ControlFlow;

/// State left after scanning a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Net bracket depth. Negative when there are more closers than openers.
    pub depth: isize,
    /// Scanning ended inside a string literal.
    pub in_string: bool,
    /// Scanning ended inside a block comment.
    pub in_comment: bool,
}

impl ScanState {
    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && !self.in_string && !self.in_comment
    }
}

fn is_opener(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{')
}

fn is_closer(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}')
}

/// Walk `text`, calling `visit(byte_index, ch, depth)` for every character that
/// is not inside a string literal (or comment, when `comments` is set).
///
/// `depth` is the nesting depth surrounding the character: an opening bracket
/// and its matching closer are both reported at the depth outside them.
/// Returning `ControlFlow::Break` stops the walk early.
pub fn scan<F>(text: &str, comments: bool, mut visit: F) -> ScanState
where
    F: FnMut(usize, char, usize) -> ControlFlow<()>,
{
    let mut depth: isize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut line_comment = false;
    let mut block_comment = false;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if line_comment {
            if ch == '\n' {
                line_comment = false;
            }
            continue;
        }
        if block_comment {
            if ch == '*' && matches!(chars.peek(), Some((_, '/'))) {
                chars.next();
                block_comment = false;
            }
            continue;
        }
        if comments && ch == '/' {
            match chars.peek() {
                Some((_, '/')) => {
                    line_comment = true;
                    continue;
                }
                Some((_, '*')) => {
                    chars.next();
                    block_comment = true;
                    continue;
                }
                _ => {}
            }
        }

        let outside = if is_closer(ch) {
            depth -= 1;
            depth
        } else {
            depth
        };
        let flow = visit(idx, ch, outside.max(0) as usize);

        if matches!(ch, '"' | '\'' | '`') {
            quote = Some(ch);
        } else if is_opener(ch) {
            depth += 1;
        }
        if flow.is_break() {
            break;
        }
    }

    ScanState {
        depth,
        in_string: quote.is_some(),
        in_comment: block_comment,
    }
}

/// Index of the bracket closing the one at `open`, if any.
pub fn find_matching(text: &str, open: usize) -> Option<usize> {
    let tail = text.get(open..)?;
    let first = tail.chars().next()?;
    if !is_opener(first) {
        return None;
    }
    let mut found = None;
    scan(tail, false, |idx, ch, depth| {
        if idx > 0 && depth == 0 && is_closer(ch) {
            found = Some(open + idx);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

/// `text` up to a trailing `//` comment outside string literals.
pub fn strip_line_comment(text: &str) -> &str {
    let mut last_slash = None;
    let mut start = None;
    scan(text, false, |idx, ch, _| {
        if ch == '/' {
            if last_slash.is_some_and(|slash| slash + 1 == idx) {
                start = last_slash;
                return ControlFlow::Break(());
            }
            last_slash = Some(idx);
        }
        ControlFlow::Continue(())
    });
    match start {
        Some(start) => text[..start].trim_end(),
        None => text,
    }
}

/// Split `text` on `sep` occurrences at bracket depth zero outside strings.
/// Pieces are returned untrimmed.
pub fn split_top_level(text: &str, sep: char, comments: bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    scan(text, comments, |idx, ch, depth| {
        if depth == 0 && ch == sep {
            pieces.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
        ControlFlow::Continue(())
    });
    pieces.push(&text[start..]);
    pieces
}

/// Byte index of the first top-level occurrence of `needle`.
pub fn find_top_level(text: &str, needle: &str) -> Option<usize> {
    let mut found = None;
    scan(text, false, |idx, _, depth| {
        if depth == 0 && text[idx..].starts_with(needle) {
            found = Some(idx);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

/// Remove `//` and `/* */` comments that are outside string literals.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match (ch, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => {
                if matches!(ch, '"' | '\'' | '`') {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }
    out
}
