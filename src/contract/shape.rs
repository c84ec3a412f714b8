//! Syntactic reading of `//@ expect` shapes.
//!
//! The checker never evaluates types; it only needs the top-level field names
//! of an object-literal shape so the generated `render` function can
//! destructure them. Everything else is left to the engine.

use serde::{Deserialize, Serialize};

use crate::utils::scan::{find_matching, split_top_level, strip_comments};

/// One top-level member of an object-literal shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeField {
    pub name: String,
    pub type_text: String,
    pub optional: bool,
}

impl ShapeField {
    /// Whether the name can appear in a destructuring pattern as-is.
    pub fn is_identifier(&self) -> bool {
        is_identifier(&self.name)
    }
}

/// Parsed form of an expected-input shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectShape {
    pub fields: Vec<ShapeField>,
    /// The text was a single object literal. Named or composite types are not.
    pub object_literal: bool,
}

impl ExpectShape {
    /// Extract top-level fields from shape text such as `{ a: A; b?: B, 'c-d': C }`.
    pub fn parse(text: &str) -> Self {
        let cleaned = strip_comments(text);
        let trimmed = cleaned.trim().trim_end_matches(';').trim_end();

        let is_literal = trimmed.starts_with('{') && find_matching(trimmed, 0) == Some(trimmed.len() - 1);
        if !is_literal {
            return Self::default();
        }

        let inner = &trimmed[1..trimmed.len() - 1];
        let fields = split_top_level(inner, ';', false)
            .into_iter()
            .flat_map(|member| split_top_level(member, ',', false))
            .filter_map(parse_member)
            .collect();

        Self {
            fields,
            object_literal: true,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&ShapeField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn parse_member(member: &str) -> Option<ShapeField> {
    let member = member.trim();
    if member.is_empty() || member.starts_with('[') {
        return None;
    }

    let colon = split_top_level(member, ':', false);
    let (head, type_text) = match colon.as_slice() {
        [head, rest @ ..] if !rest.is_empty() => (head.trim(), rest.join(":").trim().to_string()),
        _ => return None,
    };

    let head = head.strip_prefix("readonly ").map(str::trim).unwrap_or(head);
    // Method signature: `format(value: number)`.
    let (head, type_text) = match head.find('(') {
        Some(paren) => (head[..paren].trim(), format!("{}: {type_text}", &head[paren..])),
        None => (head, type_text),
    };

    let (head, optional) = match head.strip_suffix('?') {
        Some(name) => (name.trim_end(), true),
        None => (head, false),
    };
    let name = unquote(head);
    if name.is_empty() {
        return None;
    }

    Some(ShapeField {
        name: name.to_string(),
        type_text,
        optional,
    })
}

fn unquote(text: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner;
        }
    }
    text
}

/// Loose ECMAScript identifier check (ASCII plus `$` and `_`).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
