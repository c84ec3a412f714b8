//! Line map between a generated program and template sources.
//!
//! Entry `i` of a [`LineMap`] describes line `i + 1` of the generated text.
//! [`SourceBuilder`] is the only way to append to both, which keeps them the
//! same length.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::CONTRACT_ORIGIN;
use crate::template::{Origin, TemplateNode};

const INDENT: &str = "  ";

/// Template location of one generated line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappedLine {
    pub file: PathBuf,
    /// 1-based template line; `0` for lines that come from the contract.
    pub line: usize,
}

impl MappedLine {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Tag for lines produced from the contract (imports, header).
    pub fn contract() -> Self {
        Self::new(CONTRACT_ORIGIN, 0)
    }

    pub fn is_contract(&self) -> bool {
        self.file.as_os_str() == CONTRACT_ORIGIN
    }

    /// Tag for a node, falling back to `fallback` for unstamped nodes.
    pub fn of_node(node: &TemplateNode, fallback: &Path) -> Self {
        match node.origin() {
            Some(Origin {
                file,
                line,
            }) => Self::new(file, line),
            None => Self::new(fallback, node.line),
        }
    }
}

/// Ordered generated-line → template-location table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMap {
    entries: Vec<MappedLine>,
}

impl LineMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Location of 1-based generated line `line`.
    pub fn get(&self, line: usize) -> Option<&MappedLine> {
        line.checked_sub(1).and_then(|idx| self.entries.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappedLine> {
        self.entries.iter()
    }
}

/// Builds generated text and its [`LineMap`] in lockstep.
#[derive(Debug, Default)]
pub struct SourceBuilder {
    source: String,
    map: LineMap,
    depth: usize,
}

impl SourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` at the current indentation. Every physical line of
    /// `text` gets its own map entry with the same `origin`.
    pub fn push(&mut self, text: &str, origin: &MappedLine) {
        for line in split_lines(text) {
            if !line.is_empty() {
                for _ in 0..self.depth {
                    self.source.push_str(INDENT);
                }
            }
            self.source.push_str(line);
            self.source.push('\n');
            self.map.entries.push(origin.clone());
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn finish(self) -> (String, LineMap) {
        (self.source, self.map)
    }
}

/// Split on every ECMAScript line terminator: `\n`, `\r\n`, a lone `\r`,
/// U+2028 and U+2029.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if !matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
            continue;
        }
        lines.push(&text[start..index]);
        start = index + c.len_utf8();
        if c == '\r' && chars.next_if(|&(_, next)| next == '\n').is_some() {
            start += 1;
        }
    }
    lines.push(&text[start..]);
    lines
}
