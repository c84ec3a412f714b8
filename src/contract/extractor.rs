//! Directive extraction.
//!
//! Reads `//@ import` and `//@ expect` directives out of raw template text and
//! records the template's `extends` / `include` references. Problems are
//! reported as [`TemplateError`]s and never stop the scan.

use std::ops::ControlFlow;
use std::path::Path;

use tracing::{debug, warn};

use super::import::ImportRecord;
use super::shape::ExpectShape;
use super::{Contract, resolve_target};
use crate::constants::DIRECTIVE_MARKER;
use crate::diagnostics::{ErrorKind, TemplateError};
use crate::template::{self, NodeKind, lexer::starts_with_keyword};
use crate::utils::scan::{scan, strip_line_comment};

/// Extract the contract of one template.
pub fn extract(source: &str, template_path: &Path, views_root: &Path) -> (Contract, Vec<TemplateError>) {
    let mut contract = Contract::new(template_path);
    let mut errors = Vec::new();
    let lines: Vec<&str> = source.lines().collect();

    let mut idx = 0;
    while idx < lines.len() {
        let number = idx + 1;
        let Some(rule) = directive_body(lines[idx]) else {
            idx += 1;
            continue;
        };
        idx += 1;

        if starts_with_keyword(rule, "import", &['{', '*']) {
            match ImportRecord::parse(rule, template_path, number) {
                Ok(record) => {
                    if !record.type_only {
                        warn!(
                            "{}:{number}: consider `import type` so contracts carry no runtime imports: {rule}",
                            template_path.display()
                        );
                    }
                    contract.imports.push(record);
                }
                Err(reason) => errors.push(TemplateError::at(ErrorKind::DirectiveShape, template_path, number, reason)),
            }
        } else if starts_with_keyword(rule, "expect", &['{']) {
            let mut shape = strip_line_comment(rule["expect".len()..].trim()).to_string();
            if shape.is_empty() {
                errors.push(TemplateError::at(
                    ErrorKind::DirectiveShape,
                    template_path,
                    number,
                    "`expect` requires a shape, e.g. `//@ expect { title: string }`",
                ));
                continue;
            }

            let mut terminated = is_balanced(&shape);
            while !terminated {
                let Some(continuation) = lines.get(idx).and_then(|line| directive_body(line)) else {
                    break;
                };
                shape.push('\n');
                shape.push_str(strip_line_comment(continuation));
                idx += 1;
                terminated = is_balanced(&shape);
            }
            if !terminated {
                errors.push(TemplateError::at(
                    ErrorKind::DirectiveShape,
                    template_path,
                    number,
                    "unterminated `expect` shape: brackets or quotes are not balanced",
                ));
                continue;
            }

            match contract.expects_line {
                Some(first) => errors.push(TemplateError::at(
                    ErrorKind::DirectiveShape,
                    template_path,
                    number,
                    format!("multiple `expect` directives; only one is allowed (first declared on line {first})"),
                )),
                None => {
                    contract.shape = ExpectShape::parse(&shape);
                    contract.raw_expects = shape;
                    contract.expects_line = Some(number);
                }
            }
        } else if !rule.is_empty() {
            let keyword = rule.split_whitespace().next().unwrap_or(rule);
            warn!("{}:{number}: ignoring unknown directive `{DIRECTIVE_MARKER}{keyword}`", template_path.display());
        }
    }

    collect_references(source, template_path, views_root, &mut contract);
    debug!(
        "Extracted contract for {}: {} import(s), {} extends, {} include(s)",
        template_path.display(),
        contract.imports.len(),
        contract.extends.len(),
        contract.includes.len()
    );

    (contract, errors)
}

/// Text after the directive marker, if `line` is a directive line.
fn directive_body(line: &str) -> Option<&str> {
    line.trim().strip_prefix(DIRECTIVE_MARKER).map(str::trim)
}

fn is_balanced(text: &str) -> bool {
    scan(text, true, |_, _, _| ControlFlow::Continue(())).is_balanced()
}

/// Record top-level `extends` and `include`s at any depth.
fn collect_references(source: &str, template_path: &Path, views_root: &Path, contract: &mut Contract) {
    let parsed = template::parse(source);

    for node in &parsed.nodes {
        if let NodeKind::Inherits {
            target,
        } = &node.kind
        {
            contract.raw_extends.push(target.clone());
            contract.extends.push(resolve_target(target, template_path, views_root));
        }
    }

    template::walk_all(&parsed.nodes, &mut |node| {
        if let NodeKind::Include {
            target,
            ..
        } = &node.kind
        {
            contract.raw_includes.push(target.clone());
            contract.includes.push(resolve_target(target, template_path, views_root));
        }
    });
}
