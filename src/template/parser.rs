//! Indentation-based parser for the Pug subset the checker understands.
//!
//! The parser is total: malformed lines become [`SyntaxError`]s and parsing
//! continues with the next line, so a single typo never hides the rest of a
//! template from type checking. Nodes come out unstamped; the resolver stamps
//! origins once it knows the file path.

use std::ops::ControlFlow;

use super::lexer::{self, Segment, SourceLine, split_interpolation, starts_with_keyword};
use super::node::{Attribute, NodeKind, RegionMode, TemplateNode};
use crate::utils::scan::{find_matching, find_top_level, scan, split_top_level};

/// A malformed template line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

/// Parser output: the raw tree plus any non-fatal syntax errors.
#[derive(Debug, Clone, Default)]
pub struct ParsedTemplate {
    pub nodes: Vec<TemplateNode>,
    pub errors: Vec<SyntaxError>,
}

/// Parse template source into an unstamped node tree.
pub fn parse(source: &str) -> ParsedTemplate {
    let mut parser = Parser {
        lines: lexer::lines(source),
        pos: 0,
        errors: Vec::new(),
    };
    let nodes = parser.parse_block(None);
    ParsedTemplate {
        nodes,
        errors: parser.errors,
    }
}

struct Parser<'a> {
    lines: Vec<SourceLine<'a>>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser<'_> {
    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.errors.push(SyntaxError {
            line,
            message: message.into(),
        });
    }

    /// Parse sibling lines indented deeper than `parent_indent`.
    fn parse_block(&mut self, parent_indent: Option<usize>) -> Vec<TemplateNode> {
        let mut nodes: Vec<TemplateNode> = Vec::new();
        let mut block_indent: Option<usize> = None;

        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.is_blank() {
                self.pos += 1;
                continue;
            }
            if parent_indent.is_some_and(|parent| line.indent <= parent) {
                break;
            }
            let indent = *block_indent.get_or_insert(line.indent);
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                self.error(line.number, "unexpected indentation");
                let stray = self.parse_block(Some(indent));
                match nodes.last_mut() {
                    Some(last) => last.children.extend(stray),
                    None => nodes.extend(stray),
                }
                continue;
            }

            self.pos += 1;
            self.parse_line(line.number, line.indent, line.text, &mut nodes);
        }

        nodes
    }

    /// Consume every following line that is blank or indented deeper than `indent`.
    fn take_raw_block(&mut self, indent: usize) -> Vec<(usize, String)> {
        let mut raw = Vec::new();
        while let Some(line) = self.lines.get(self.pos) {
            if !line.is_blank() && line.indent <= indent {
                break;
            }
            if !line.is_blank() {
                raw.push((line.number, line.text.trim_end().to_string()));
            }
            self.pos += 1;
        }
        raw
    }

    fn parse_line(&mut self, number: usize, indent: usize, text: &str, nodes: &mut Vec<TemplateNode>) {
        let text = text.trim_end();

        if let Some(comment) = text.strip_prefix("//") {
            let (buffered, value) = match comment.strip_prefix('-') {
                Some(unbuffered) => (false, unbuffered),
                None => (true, comment),
            };
            self.take_raw_block(indent);
            nodes.push(TemplateNode::new(
                NodeKind::Comment {
                    value: value.trim().to_string(),
                    buffered,
                },
                number,
            ));
            return;
        }

        if let Some(piped) = text.strip_prefix('|') {
            let piped = piped.strip_prefix(' ').unwrap_or(piped);
            nodes.extend(self.text_nodes(piped, number));
            return;
        }

        if text.starts_with('<') {
            nodes.extend(self.text_nodes(text, number));
            return;
        }

        if let Some(code) = text.strip_prefix('-') {
            let code = code.trim();
            if code.is_empty() {
                for (line, value) in self.take_raw_block(indent) {
                    nodes.push(TemplateNode::new(
                        NodeKind::Code {
                            value: value.trim().to_string(),
                            buffered: false,
                            escaped: false,
                        },
                        line,
                    ));
                }
            } else {
                let children = self.parse_block(Some(indent));
                nodes.push(
                    TemplateNode::new(
                        NodeKind::Code {
                            value: code.to_string(),
                            buffered: false,
                            escaped: false,
                        },
                        number,
                    )
                    .with_children(children),
                );
            }
            return;
        }

        if let Some(expr) = text.strip_prefix("!=") {
            nodes.push(buffered_code(expr, false, number));
            return;
        }
        if let Some(expr) = text.strip_prefix('=') {
            nodes.push(buffered_code(expr, true, number));
            return;
        }

        if let Some(filter) = text.strip_prefix(':') {
            let name = filter.split_whitespace().next().unwrap_or_default();
            self.take_raw_block(indent);
            nodes.push(TemplateNode::new(
                NodeKind::Filter {
                    name: name.to_string(),
                },
                number,
            ));
            return;
        }

        if let Some(call) = text.strip_prefix('+') {
            if let Some(node) = self.parse_mixin_call(call, number, indent) {
                nodes.push(node);
            }
            return;
        }

        if starts_with_keyword(text, "doctype", &[]) {
            nodes.push(TemplateNode::new(
                NodeKind::Doctype {
                    value: text["doctype".len()..].trim().to_string(),
                },
                number,
            ));
            return;
        }

        for keyword in ["extends", "extend"] {
            if starts_with_keyword(text, keyword, &[]) {
                let target = text[keyword.len()..].trim();
                if target.is_empty() {
                    self.error(number, format!("`{keyword}` requires a template path"));
                } else {
                    nodes.push(TemplateNode::new(
                        NodeKind::Inherits {
                            target: target.to_string(),
                        },
                        number,
                    ));
                }
                return;
            }
        }

        if starts_with_keyword(text, "include", &[':']) {
            let rest = &text["include".len()..];
            let (filter, target) = match rest.strip_prefix(':') {
                Some(filtered) => {
                    let mut parts = filtered.splitn(2, char::is_whitespace);
                    let name = parts.next().unwrap_or_default().to_string();
                    (Some(name), parts.next().unwrap_or_default().trim())
                }
                None => (None, rest.trim()),
            };
            if target.is_empty() {
                self.error(number, "`include` requires a path");
            } else {
                nodes.push(TemplateNode::new(
                    NodeKind::Include {
                        target: target.to_string(),
                        filter,
                    },
                    number,
                ));
            }
            return;
        }

        if starts_with_keyword(text, "block", &[]) {
            let rest = text["block".len()..].trim();
            let (mode, name) = if starts_with_keyword(rest, "append", &[]) {
                (RegionMode::Append, rest["append".len()..].trim())
            } else if starts_with_keyword(rest, "prepend", &[]) {
                (RegionMode::Prepend, rest["prepend".len()..].trim())
            } else {
                (RegionMode::Replace, rest)
            };
            nodes.push(self.region(name, mode, number, indent));
            return;
        }
        for (keyword, mode) in [("append", RegionMode::Append), ("prepend", RegionMode::Prepend)] {
            if starts_with_keyword(text, keyword, &[]) && text.len() > keyword.len() {
                let name = text[keyword.len()..].trim();
                nodes.push(self.region(name, mode, number, indent));
                return;
            }
        }

        if starts_with_keyword(text, "mixin", &[]) {
            let signature = text["mixin".len()..].trim();
            let (name, args) = split_call(signature);
            if name.is_empty() {
                self.error(number, "mixin definition requires a name");
                self.parse_block(Some(indent));
                return;
            }
            let children = self.parse_block(Some(indent));
            nodes.push(
                TemplateNode::new(
                    NodeKind::MixinDefinition {
                        name: name.to_string(),
                        args,
                    },
                    number,
                )
                .with_children(children),
            );
            return;
        }

        for keyword in ["each", "for"] {
            if starts_with_keyword(text, keyword, &[]) {
                let header = text[keyword.len()..].trim();
                let children = self.parse_block(Some(indent));
                match parse_loop_header(header) {
                    Some((item, key, collection)) => nodes.push(
                        TemplateNode::new(
                            NodeKind::Loop {
                                item,
                                key,
                                collection,
                                alternate: Vec::new(),
                            },
                            number,
                        )
                        .with_children(children),
                    ),
                    None => {
                        self.error(number, format!("malformed `{keyword}`: expected `{keyword} item[, key] in collection`"));
                        nodes.extend(children);
                    }
                }
                return;
            }
        }

        if starts_with_keyword(text, "while", &['(']) {
            let test = text["while".len()..].trim();
            let children = self.parse_block(Some(indent));
            nodes.push(
                TemplateNode::new(
                    NodeKind::While {
                        test: test.to_string(),
                    },
                    number,
                )
                .with_children(children),
            );
            return;
        }

        for (keyword, negated) in [("if", false), ("unless", true)] {
            if starts_with_keyword(text, keyword, &['(']) {
                let test = text[keyword.len()..].trim();
                if test.is_empty() {
                    self.error(number, format!("`{keyword}` requires a condition"));
                }
                nodes.push(self.conditional(test, negated, number, indent));
                return;
            }
        }

        if starts_with_keyword(text, "else", &[]) {
            let rest = text["else".len()..].trim();
            let branch = if starts_with_keyword(rest, "if", &['(']) {
                vec![self.conditional(rest["if".len()..].trim(), false, number, indent)]
            } else {
                if !rest.is_empty() {
                    self.error(number, format!("unexpected text after `else`: {rest}"));
                }
                self.parse_block(Some(indent))
            };
            let attached = match nodes.last_mut() {
                Some(last) => attach_else(last, branch),
                None => Err(branch),
            };
            if let Err(branch) = attached {
                self.error(number, "`else` without a matching `if`, `unless` or `each`");
                nodes.extend(branch);
            }
            return;
        }

        self.parse_element(number, indent, text, nodes);
    }

    fn region(&mut self, name: &str, mode: RegionMode, number: usize, indent: usize) -> TemplateNode {
        let children = self.parse_block(Some(indent));
        TemplateNode::new(
            NodeKind::Region {
                name: name.to_string(),
                mode,
            },
            number,
        )
        .with_children(children)
    }

    fn conditional(&mut self, test: &str, negated: bool, number: usize, indent: usize) -> TemplateNode {
        let children = self.parse_block(Some(indent));
        TemplateNode::new(
            NodeKind::Conditional {
                test: test.to_string(),
                negated,
                alternate: Vec::new(),
            },
            number,
        )
        .with_children(children)
    }

    fn parse_mixin_call(&mut self, call: &str, number: usize, indent: usize) -> Option<TemplateNode> {
        let (name, args) = split_call(call);
        if name.is_empty() {
            self.error(number, "mixin call requires a name");
            return None;
        }
        let mut rest = call[name.len()..].trim_start();
        if args.is_some() {
            rest = skip_group(rest);
        }
        // Attribute group passed to the mixin.
        rest = skip_group(rest);

        let mut children = match rest.strip_prefix(' ').map(str::trim) {
            Some(inline) if !inline.is_empty() => self.text_nodes(inline, number),
            _ => Vec::new(),
        };
        children.extend(self.parse_block(Some(indent)));
        Some(
            TemplateNode::new(
                NodeKind::MixinCall {
                    name: name.to_string(),
                    args,
                },
                number,
            )
            .with_children(children),
        )
    }

    fn parse_element(&mut self, number: usize, indent: usize, text: &str, nodes: &mut Vec<TemplateNode>) {
        let mut source = text.to_string();
        let head = loop {
            match parse_tag_head(&source) {
                Ok(head) => break head,
                Err(TagError::Unclosed) => match self.lines.get(self.pos) {
                    Some(next) => {
                        source.push('\n');
                        source.push_str(next.text.trim_end());
                        self.pos += 1;
                    }
                    None => {
                        self.error(number, "unclosed attribute list");
                        return;
                    }
                },
                Err(TagError::Invalid(message)) => {
                    self.error(number, message);
                    let children = self.parse_block(Some(indent));
                    nodes.extend(children);
                    return;
                }
            }
        };

        let mut children = Vec::new();
        match head.rest {
            TagRest::Empty => children.extend(self.parse_block(Some(indent))),
            TagRest::Text(inline) => {
                children.extend(self.text_nodes(&inline, number));
                children.extend(self.parse_block(Some(indent)));
            }
            TagRest::Buffered {
                value,
                escaped,
            } => {
                children.push(buffered_code(&value, escaped, number));
                children.extend(self.parse_block(Some(indent)));
            }
            TagRest::DotBlock => {
                for (line, raw) in self.take_raw_block(indent) {
                    children.extend(self.text_nodes(&raw, line));
                }
            }
            TagRest::Expansion(inner) => self.parse_line(number, indent, &inner, &mut children),
            TagRest::SelfClosing => {}
        }

        nodes.push(
            TemplateNode::new(
                NodeKind::Element {
                    name: head.name,
                    attributes: head.attributes,
                    attribute_blocks: head.attribute_blocks,
                },
                number,
            )
            .with_children(children),
        );
    }

    fn text_nodes(&mut self, text: &str, number: usize) -> Vec<TemplateNode> {
        let segments = match split_interpolation(text) {
            Ok(segments) => segments,
            Err(offset) => {
                self.error(number, format!("unterminated interpolation at column {}", offset + 1));
                vec![Segment::Literal(text.to_string())]
            }
        };
        segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Literal(value) => TemplateNode::new(
                    NodeKind::Text {
                        value,
                    },
                    number,
                ),
                Segment::Expression {
                    value,
                    escaped,
                } => TemplateNode::new(
                    NodeKind::Code {
                        value,
                        buffered: true,
                        escaped,
                    },
                    number,
                ),
            })
            .collect()
    }
}

fn buffered_code(expr: &str, escaped: bool, number: usize) -> TemplateNode {
    TemplateNode::new(
        NodeKind::Code {
            value: expr.trim().to_string(),
            buffered: true,
            escaped,
        },
        number,
    )
}

/// Attach an `else` branch to the trailing conditional chain or loop.
fn attach_else(target: &mut TemplateNode, branch: Vec<TemplateNode>) -> Result<(), Vec<TemplateNode>> {
    match &mut target.kind {
        NodeKind::Conditional {
            alternate,
            ..
        } => {
            if alternate.is_empty() {
                *alternate = branch;
                return Ok(());
            }
            match alternate.as_mut_slice() {
                [nested]
                    if matches!(
                        nested.kind,
                        NodeKind::Conditional {
                            ..
                        }
                    ) =>
                {
                    attach_else(nested, branch)
                }
                _ => Err(branch),
            }
        }
        NodeKind::Loop {
            alternate,
            ..
        } if alternate.is_empty() => {
            *alternate = branch;
            Ok(())
        }
        _ => Err(branch),
    }
}

/// Split `name(args)` into the name and the argument text.
fn split_call(signature: &str) -> (&str, Option<String>) {
    let end = signature.find(|c: char| c == '(' || c.is_whitespace()).unwrap_or(signature.len());
    let name = &signature[..end];
    let args = if signature[end..].starts_with('(') {
        find_matching(signature, end).map(|close| signature[end + 1..close].trim().to_string())
    } else {
        None
    };
    (name, args)
}

/// Skip one leading parenthesized group, if present.
fn skip_group(text: &str) -> &str {
    if text.starts_with('(')
        && let Some(close) = find_matching(text, 0)
    {
        return &text[close + 1..];
    }
    text
}

/// Parse `item[, key] in collection`.
fn parse_loop_header(header: &str) -> Option<(String, Option<String>, String)> {
    let split = find_top_level(header, " in ")?;
    let variables = header[..split].trim();
    let collection = header[split + " in ".len()..].trim();
    if variables.is_empty() || collection.is_empty() {
        return None;
    }

    let parts = split_top_level(variables, ',', false);
    let item = parts.first().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    let key = match parts.get(1).map(|s| s.trim()) {
        Some("") => return None,
        Some(key) => Some(key.to_string()),
        None => None,
    };
    if parts.len() > 2 {
        return None;
    }
    Some((item, key, collection.to_string()))
}

#[derive(Debug)]
enum TagError {
    Unclosed,
    Invalid(String),
}

#[derive(Debug, PartialEq, Eq)]
enum TagRest {
    Empty,
    Text(String),
    Buffered {
        value: String,
        escaped: bool,
    },
    DotBlock,
    Expansion(String),
    SelfClosing,
}

#[derive(Debug)]
struct TagHead {
    name: String,
    attributes: Vec<Attribute>,
    attribute_blocks: Vec<String>,
    rest: TagRest,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

fn read_ident(text: &str) -> &str {
    let end = text.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-')).unwrap_or(text.len());
    &text[..end]
}

fn parse_tag_head(text: &str) -> Result<TagHead, TagError> {
    let shorthand = text.starts_with(['.', '#']) && text[1..].starts_with(is_ident_start);
    let name = if shorthand {
        "div".to_string()
    } else {
        if !text.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let preview: String = text.chars().take(20).collect();
            return Err(TagError::Invalid(format!("unexpected text `{preview}`")));
        }
        let mut end = 0;
        let bytes = text.as_bytes();
        while end < bytes.len() {
            let c = bytes[end];
            let namespaced = c == b':' && bytes.get(end + 1).is_some_and(|n| n.is_ascii_alphanumeric());
            if c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || namespaced {
                end += 1;
            } else {
                break;
            }
        }
        text[..end].to_string()
    };

    let mut attributes = Vec::new();
    let mut attribute_blocks = Vec::new();
    let mut i = if shorthand { 0 } else { name.len() };

    let rest = loop {
        let tail = &text[i..];
        let Some(c) = tail.chars().next() else {
            break TagRest::Empty;
        };
        match c {
            '.' | '#' if tail[1..].starts_with(is_ident_start) => {
                let ident = read_ident(&tail[1..]);
                attributes.push(Attribute {
                    name: if c == '.' { "class" } else { "id" }.to_string(),
                    value: format!("\"{ident}\""),
                    escaped: true,
                });
                i += 1 + ident.len();
            }
            '.' if tail[1..].trim().is_empty() => break TagRest::DotBlock,
            '(' => {
                let close = find_matching(text, i).ok_or(TagError::Unclosed)?;
                attributes.extend(parse_attributes(&text[i + 1..close])?);
                i = close + 1;
            }
            '&' if tail.starts_with("&attributes(") => {
                let open = i + "&attributes".len();
                let close = find_matching(text, open).ok_or(TagError::Unclosed)?;
                attribute_blocks.push(text[open + 1..close].trim().to_string());
                i = close + 1;
            }
            ':' => {
                let inner = tail[1..].trim_start();
                if inner.is_empty() {
                    return Err(TagError::Invalid("expected a nested tag after `:`".to_string()));
                }
                break TagRest::Expansion(inner.to_string());
            }
            '!' if tail.starts_with("!=") => {
                break TagRest::Buffered {
                    value: tail[2..].trim().to_string(),
                    escaped: false,
                };
            }
            '=' => {
                break TagRest::Buffered {
                    value: tail[1..].trim().to_string(),
                    escaped: true,
                };
            }
            '/' => break TagRest::SelfClosing,
            ' ' | '\t' => {
                let inline = &tail[1..];
                break if inline.trim().is_empty() {
                    TagRest::Empty
                } else {
                    TagRest::Text(inline.to_string())
                };
            }
            other => {
                return Err(TagError::Invalid(format!("unexpected character `{other}` after tag `{name}`")));
            }
        }
    };

    Ok(TagHead {
        name,
        attributes,
        attribute_blocks,
        rest,
    })
}

fn parse_attributes(inner: &str) -> Result<Vec<Attribute>, TagError> {
    let mut attributes = Vec::new();
    let mut rest = inner;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let (name, after) = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let close = rest[1..].find(q).ok_or(TagError::Unclosed)? + 1;
                (&rest[1..close], &rest[close + 1..])
            }
            _ => {
                let end = attribute_name_end(rest);
                (&rest[..end], &rest[end..])
            }
        };
        if name.is_empty() {
            return Err(TagError::Invalid(format!("malformed attribute list `{inner}`")));
        }

        let trimmed = after.trim_start();
        let (escaped, value_src) = if let Some(value) = trimmed.strip_prefix("!=") {
            (false, value)
        } else if let Some(value) = trimmed.strip_prefix('=') {
            (true, value)
        } else {
            attributes.push(Attribute {
                name: name.to_string(),
                value: "true".to_string(),
                escaped: true,
            });
            rest = after;
            continue;
        };

        let value_src = value_src.trim_start();
        let end = attribute_value_end(value_src);
        let value = value_src[..end].trim();
        if value.is_empty() {
            return Err(TagError::Invalid(format!("attribute `{name}` is missing a value")));
        }
        attributes.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
            escaped,
        });
        rest = &value_src[end..];
    }

    Ok(attributes)
}

fn attribute_name_end(text: &str) -> usize {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let bang_eq = c == '!' && matches!(chars.peek(), Some((_, '=')));
        if c.is_whitespace() || c == ',' || c == '=' || bang_eq {
            return idx;
        }
    }
    text.len()
}

/// End of an attribute value: a top-level comma, or top-level whitespace
/// followed by something that looks like the next attribute.
fn attribute_value_end(text: &str) -> usize {
    let mut end = text.len();
    scan(text, false, |idx, c, depth| {
        if depth == 0 && (c == ',' || (c.is_whitespace() && starts_new_attribute(&text[idx..]))) {
            end = idx;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    end
}

fn starts_new_attribute(text: &str) -> bool {
    let text = text.trim_start();
    if text.is_empty() {
        return true;
    }
    let after = match text.chars().next() {
        Some(q @ ('"' | '\'')) => match text[1..].find(q) {
            Some(close) => &text[close + 2..],
            None => return false,
        },
        Some(c) if c.is_ascii_alphabetic() || matches!(c, '_' | ':' | '@' | '[' | '(') => {
            let end = text
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '@' | '.' | '[' | ']' | '(' | ')')))
                .unwrap_or(text.len());
            &text[end..]
        }
        _ => return false,
    };
    let after = after.trim_start();
    after.is_empty()
        || after.starts_with(',')
        || after.starts_with("!=")
        || (after.starts_with('=') && !after.starts_with("=="))
}
