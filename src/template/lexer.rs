//! Line splitting and text interpolation for Pug sources.
//!
//! Pug structure is carried by indentation, so the lexer works on physical
//! lines: each [`SourceLine`] records its 1-based number, indentation width
//! and the text after the indentation. Inline constructs (`#{expr}`,
//! `!{expr}`) are split out of text by [`split_interpolation`].

use crate::utils::scan::find_matching;

/// One physical line of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Count of leading whitespace characters.
    pub indent: usize,
    /// Line content after indentation, without trailing `\r`.
    pub text: &'a str,
}

impl SourceLine<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split `source` into lines. Blank lines are kept so numbering stays exact.
pub fn lines(source: &str) -> Vec<SourceLine<'_>> {
    source
        .split('\n')
        .enumerate()
        .map(|(idx, raw)| {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let text = raw.trim_start_matches([' ', '\t']);
            SourceLine {
                number: idx + 1,
                indent: raw.len() - text.len(),
                text,
            }
        })
        .collect()
}

/// A piece of interpolated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Expression {
        value: String,
        escaped: bool,
    },
}

/// Split text into literal and `#{}` / `!{}` expression segments.
///
/// `\#{` is an escaped literal. An unterminated interpolation is an error
/// carrying the byte offset where it starts.
pub fn split_interpolation(text: &str) -> Result<Vec<Segment>, usize> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;
    let mut offset = 0;

    while let Some(pos) = rest.find(['#', '!']) {
        let marker = &rest[pos..];
        if !marker[1..].starts_with('{') {
            literal.push_str(&rest[..=pos]);
            rest = &rest[pos + 1..];
            offset += pos + 1;
            continue;
        }
        if pos > 0 && rest.as_bytes()[pos - 1] == b'\\' {
            literal.push_str(&rest[..pos - 1]);
            literal.push_str(&marker[..2]);
            rest = &marker[2..];
            offset += pos + 2;
            continue;
        }

        literal.push_str(&rest[..pos]);
        let Some(close) = find_matching(marker, 1) else {
            return Err(offset + pos);
        };
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Expression {
            value: marker[2..close].trim().to_string(),
            escaped: marker.starts_with('#'),
        });
        rest = &marker[close + 1..];
        offset += pos + close + 1;
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// True when `word` starts `text` and is followed by whitespace, end of text,
/// or one of `extra`.
pub fn starts_with_keyword(text: &str, word: &str, extra: &[char]) -> bool {
    match text.strip_prefix(word) {
        Some(rest) => rest.chars().next().is_none_or(|c| c.is_whitespace() || extra.contains(&c)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_measure_indent() {
        let src = "html\n  body\r\n\n\tp hi";
        let lines = lines(src);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].indent, 2);
        assert_eq!(lines[1].text, "body");
        assert!(lines[2].is_blank());
        assert_eq!(lines[3].indent, 1);
        assert_eq!(lines[3].number, 4);
    }

    #[test]
    fn test_split_interpolation() {
        let segments = split_interpolation("Hi #{user.name}, you have !{count} new").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("Hi ".into()),
                Segment::Expression {
                    value: "user.name".into(),
                    escaped: true
                },
                Segment::Literal(", you have ".into()),
                Segment::Expression {
                    value: "count".into(),
                    escaped: false
                },
                Segment::Literal(" new".into()),
            ]
        );
    }

    #[test]
    fn test_split_interpolation_nested_braces_and_escape() {
        let segments = split_interpolation(r"\#{raw} #{fmt({a: 1})}!").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("#{raw} ".into()),
                Segment::Expression {
                    value: "fmt({a: 1})".into(),
                    escaped: true
                },
                Segment::Literal("!".into()),
            ]
        );
    }

    #[test]
    fn test_split_interpolation_unterminated() {
        assert_eq!(split_interpolation("a #{oops"), Err(2));
    }

    #[test]
    fn test_keyword_boundary() {
        assert!(starts_with_keyword("each x in y", "each", &[]));
        assert!(starts_with_keyword("else", "else", &[]));
        assert!(!starts_with_keyword("elsewhere", "else", &[]));
        assert!(starts_with_keyword("include:markdown a.md", "include", &[':']));
    }
}
