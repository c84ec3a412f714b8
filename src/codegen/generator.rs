//! Synthetic program generation.
//!
//! The generated program is a single `render` function whose parameter is
//! typed with the template's `expect` shape. Every expression the template
//! evaluates is placed where it would run, so the engine checks each one in
//! the scope the template gives it: loop variables, mixin parameters and
//! unbuffered code declarations are all in scope.
//!
//! The output is never executed. Markup is dropped and values are wrapped in
//! `void (...)` so only their types matter.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::line_map::{LineMap, MappedLine, SourceBuilder};
use crate::constants::RENDER_FUNCTION;
use crate::contract::Contract;
use crate::shared_locals::SharedLocals;
use crate::template::{NodeKind, TemplateNode};
use crate::utils::scan::split_top_level;

/// Elements whose children are raw text for another language.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A generated program together with the map back to template lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticProgram {
    pub template_path: PathBuf,
    pub source: String,
    pub line_map: LineMap,
}

impl SyntheticProgram {
    pub fn line_count(&self) -> usize {
        self.line_map.len()
    }

    /// Source with each line prefixed by its generated line number and the
    /// template location it maps to.
    pub fn annotated(&self, base: &Path) -> String {
        let width = self.line_count().to_string().len();
        let mut out = String::new();
        for (idx, (line, origin)) in self.source.lines().zip(self.line_map.iter()).enumerate() {
            let location = if origin.is_contract() {
                "contract".to_string()
            } else {
                let file = origin.file.strip_prefix(base).unwrap_or(&origin.file);
                format!("{}:{}", file.display(), origin.line)
            };
            out.push_str(&format!("{:>width$} | {line:<60} // {location}\n", idx + 1));
        }
        out
    }
}

/// Generate the program for a resolved tree.
///
/// Generation never fails: node kinds without a typed rendition produce a
/// placeholder comment line.
pub fn generate(tree: &[TemplateNode], contract: &Contract, shared: Option<&SharedLocals>) -> SyntheticProgram {
    let template = contract.template_path.as_path();
    let mut builder = SourceBuilder::new();
    let contract_origin = MappedLine::contract();

    builder.push(&format!("// pugcheck: generated from {}", template.display()), &contract_origin);
    for import in &contract.imports {
        builder.push(&import.absolute_statement(), &contract_origin);
    }
    if let Some(shared) = shared {
        builder.push(&shared.import_statement(), &contract_origin);
    }

    let signature_origin = MappedLine::new(template, contract.expects_line.unwrap_or(1));
    let locals_type = match shared {
        Some(shared) => format!("{} & {}", contract.raw_expects, shared.type_name),
        None => contract.raw_expects.clone(),
    };
    builder.push(&format!("export function {RENDER_FUNCTION}(locals: {locals_type}) {{"), &signature_origin);
    builder.indent();

    let mut names: Vec<&str> = Vec::new();
    for field in contract.shape.fields.iter().filter(|field| field.is_identifier()) {
        if !names.contains(&field.name.as_str()) {
            names.push(&field.name);
        }
    }
    if let Some(shared) = shared {
        for name in &shared.fields {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }
    builder.push(&format!("const {{ {} }} = locals;", names.join(", ")), &signature_origin);

    let mut emitter = Emitter {
        builder,
        fallback: template,
    };
    emitter.nodes(tree);

    let mut builder = emitter.builder;
    builder.dedent();
    builder.push("}", &signature_origin);

    let (source, line_map) = builder.finish();
    debug!("Generated {} line(s) for {}", line_map.len(), template.display());
    SyntheticProgram {
        template_path: template.to_path_buf(),
        source,
        line_map,
    }
}

struct Emitter<'a> {
    builder: SourceBuilder,
    fallback: &'a Path,
}

impl Emitter<'_> {
    fn nodes(&mut self, nodes: &[TemplateNode]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn origin(&self, node: &TemplateNode) -> MappedLine {
        MappedLine::of_node(node, self.fallback)
    }

    /// `head`, the children indented, then `}`; all tagged with `origin`.
    fn block(&mut self, head: &str, children: &[TemplateNode], origin: &MappedLine) {
        self.builder.push(head, origin);
        self.builder.indent();
        self.nodes(children);
        self.builder.dedent();
        self.builder.push("}", origin);
    }

    fn node(&mut self, node: &TemplateNode) {
        let origin = self.origin(node);
        match &node.kind {
            NodeKind::Element {
                name,
                attributes,
                attribute_blocks,
            } => {
                for attribute in attributes {
                    self.builder.push(&format!("void ({});", attribute.value.trim()), &origin);
                }
                for expression in attribute_blocks {
                    self.builder.push(&format!("void ({});", expression.trim()), &origin);
                }
                if !RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    self.nodes(&node.children);
                }
            }
            NodeKind::Text {
                value,
            } => {
                self.builder.push(&format!("void `{}`;", escape_template_literal(value)), &origin);
            }
            NodeKind::Code {
                value,
                buffered: true,
                ..
            } => {
                let expression = value.trim().trim_end_matches(';').trim_end();
                self.builder.push(&format!("void ({expression});"), &origin);
                self.nodes(&node.children);
            }
            NodeKind::Code {
                value,
                ..
            } => {
                let statement = value.trim_end();
                if node.children.is_empty() || statement.ends_with('{') {
                    self.builder.push(statement, &origin);
                    self.nodes(&node.children);
                } else {
                    self.block(&format!("{statement} {{"), &node.children, &origin);
                }
            }
            NodeKind::Loop {
                item,
                key,
                collection,
                alternate,
            } => {
                let head = match key {
                    Some(key) => format!("for (const [{key}, {item}] of Object.entries({collection})) {{"),
                    None => format!("for (const {item} of {collection}) {{"),
                };
                self.block(&head, &node.children, &origin);
                if !alternate.is_empty() {
                    let else_origin = self.origin(&alternate[0]);
                    self.block("{", alternate, &else_origin);
                }
            }
            NodeKind::While {
                test,
            } => self.block(&format!("while ({test}) {{"), &node.children, &origin),
            NodeKind::Conditional {
                test,
                negated,
                alternate,
            } => {
                let head = if *negated {
                    format!("if (!({test})) {{")
                } else {
                    format!("if ({test}) {{")
                };
                self.builder.push(&head, &origin);
                self.builder.indent();
                self.nodes(&node.children);
                self.builder.dedent();
                if let Some(first) = alternate.first() {
                    let else_origin = self.origin(first);
                    self.builder.push("} else {", &else_origin);
                    self.builder.indent();
                    self.nodes(alternate);
                    self.builder.dedent();
                }
                self.builder.push("}", &origin);
            }
            NodeKind::Region {
                ..
            } => self.nodes(&node.children),
            NodeKind::MixinDefinition {
                name,
                args,
            } => {
                let head = format!(
                    "function {}({}) {{",
                    mixin_function(name),
                    mixin_parameters(args.as_deref().unwrap_or_default())
                );
                self.builder.push(&head, &origin);
                self.builder.indent();
                self.builder.push(
                    "const attributes: Record<string, any> = {}; const block = undefined as undefined | (() => void);",
                    &origin,
                );
                self.nodes(&node.children);
                self.builder.dedent();
                self.builder.push("}", &origin);
            }
            NodeKind::MixinCall {
                name,
                args,
            } => {
                self.builder.push(
                    &format!("{}({});", mixin_function(name), args.as_deref().unwrap_or_default().trim()),
                    &origin,
                );
                self.nodes(&node.children);
            }
            NodeKind::Comment {
                ..
            } => {}
            NodeKind::Filter {
                ..
            }
            | NodeKind::Doctype {
                ..
            }
            | NodeKind::Inherits {
                ..
            }
            | NodeKind::Include {
                ..
            } => {
                self.builder.push(&format!("// pugcheck: {} skipped", node.kind.name()), &origin);
            }
        }
    }
}

/// Escape text for use inside a template literal. Line terminators other
/// than `\n` are escaped so the program keeps one line per map entry.
fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
        .replace('\r', "\\r")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Function name for a mixin; mixin names may contain `-`.
fn mixin_function(name: &str) -> String {
    let sanitized: String =
        name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' }).collect();
    format!("mixin_{sanitized}")
}

/// Mixin parameters with untyped ones made optional `any`, plus a trailing
/// rest parameter unless one is declared. Mixins accept any number of
/// arguments.
fn mixin_parameters(args: &str) -> String {
    let mut params = Vec::new();
    let mut has_rest = false;
    for param in split_top_level(args, ',', false) {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        if let Some(rest) = param.strip_prefix("...") {
            has_rest = true;
            if rest.contains(':') {
                params.push(param.to_string());
            } else {
                params.push(format!("...{}: any[]", rest.trim()));
            }
        } else if param.contains(':') || param.contains('=') {
            params.push(param.to_string());
        } else {
            params.push(format!("{param}?: any"));
        }
    }
    if !has_rest {
        params.push("..._rest: any[]".to_string());
    }
    params.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ExpectShape, ImportRecord};
    use crate::template::{parse, stamp_origin};
    use std::sync::Arc;

    fn contract(expect: Option<(&str, usize)>) -> Contract {
        let mut contract = Contract::new(Path::new("/v/page.pug"));
        if let Some((shape, line)) = expect {
            contract.raw_expects = shape.to_string();
            contract.expects_line = Some(line);
            contract.shape = ExpectShape::parse(shape);
        }
        contract
    }

    fn tree(source: &str) -> Vec<TemplateNode> {
        let file: Arc<Path> = Arc::from(Path::new("/v/page.pug"));
        stamp_origin(parse(source).nodes, &file)
    }

    fn line_of(program: &SyntheticProgram, needle: &str) -> usize {
        program.source.lines().position(|line| line.contains(needle)).map(|idx| idx + 1).unwrap()
    }

    #[test]
    fn test_expect_only_template_is_aligned() {
        let contract = contract(Some(("{ title: string }", 1)));
        let program = generate(&[], &contract, None);

        assert_eq!(program.source.lines().count(), program.line_map.len());
        assert_eq!(
            program.source,
            "// pugcheck: generated from /v/page.pug\nexport function render(locals: { title: string }) {\n  const { title } = locals;\n}\n"
        );
        assert!(program.line_map.get(1).unwrap().is_contract());
        assert_eq!(program.line_map.get(2), Some(&MappedLine::new("/v/page.pug", 1)));
    }

    #[test]
    fn test_imports_and_shared_locals() {
        let mut contract = contract(Some(("{ user: User; title: string }", 2)));
        contract
            .imports
            .push(ImportRecord::parse("import type { User } from \"../types/user\"", Path::new("/v/page.pug"), 1).unwrap());
        let shared = SharedLocals {
            import_path: PathBuf::from("/p/types/shared.d.ts"),
            type_name: "Shared".to_string(),
            fields: vec!["csrf".to_string(), "title".to_string()],
        };

        let program = generate(&[], &contract, Some(&shared));
        let lines: Vec<&str> = program.source.lines().collect();
        assert_eq!(lines[1], "import type { User } from \"/types/user\";");
        assert_eq!(lines[2], "import type { Shared } from \"/p/types/shared\";");
        assert_eq!(lines[3], "export function render(locals: { user: User; title: string } & Shared) {");
        assert_eq!(lines[4], "  const { user, title, csrf } = locals;");
        assert!(program.line_map.get(2).unwrap().is_contract());
        assert_eq!(program.line_map.get(4).unwrap().line, 2);
    }

    #[test]
    fn test_control_flow_and_expressions() {
        let source = "ul\n  each item, i in items\n    li(class=item.cls)= item.name\n  else\n    li none\nif user\n  p Hello #{user.name}\nelse\n  p anon\nunless done\n  | `todo` ${x}";
        let program = generate(&tree(source), &contract(None), None);
        let text = &program.source;

        assert!(text.contains("for (const [i, item] of Object.entries(items)) {"));
        assert!(text.contains("void (item.cls);"));
        assert!(text.contains("void (item.name);"));
        assert!(text.contains("if (user) {"));
        assert!(text.contains("void (user.name);"));
        assert!(text.contains("} else {"));
        assert!(text.contains("if (!(done)) {"));
        assert!(text.contains("void `\\`todo\\` \\${x}`;"));

        assert_eq!(program.line_map.get(line_of(&program, "void (item.name)")).unwrap().line, 3);
        assert_eq!(program.line_map.get(line_of(&program, "void `none`")).unwrap().line, 5);
        assert_eq!(program.line_map.get(line_of(&program, "} else {")).unwrap().line, 9);
        assert_eq!(program.source.lines().count(), program.line_map.len());
    }

    #[test]
    fn test_code_mixins_and_placeholders() {
        let source = "doctype html\n- const total = items.length\n//- hidden\nmixin nav-item(href, label = 'x')\n  a(href=href)= label\n+nav-item('/', 'Home')\nscript.\n  let notTyped = 1\n:markdown\n  # hi";
        let program = generate(&tree(source), &contract(None), None);
        let text = &program.source;

        assert!(text.contains("// pugcheck: doctype skipped"));
        assert!(text.contains("const total = items.length"));
        assert!(!text.contains("hidden"));
        assert!(text.contains("function mixin_nav_item(href?: any, label = 'x', ..._rest: any[]) {"));
        assert!(text.contains("mixin_nav_item('/', 'Home');"));
        assert!(!text.contains("notTyped"));
        assert!(text.contains("// pugcheck: filter skipped"));
        assert_eq!(program.line_map.get(line_of(&program, "mixin_nav_item('/'")).unwrap().line, 6);
    }

    #[test]
    fn test_unbuffered_code_with_block() {
        let source = "- for (let i = 0; i < n; i++)\n  p= i\n- items.forEach(function (item) {\n  p= item\n- })";
        let program = generate(&tree(source), &contract(None), None);
        let lines: Vec<&str> = program.source.lines().map(str::trim).collect();

        let start = lines.iter().position(|l| *l == "for (let i = 0; i < n; i++) {").unwrap();
        assert_eq!(lines[start + 1], "void (i);");
        assert_eq!(lines[start + 2], "}");
        assert!(lines.contains(&"items.forEach(function (item) {"));
        assert!(lines.contains(&"})"));
    }

    #[test]
    fn test_unicode_line_separators_in_text_stay_on_one_line() {
        let program = generate(&tree("p a\u{2028}b\rc\u{2029}d\np= user.nmae"), &contract(None), None);

        let terminators = program.source.chars().filter(|c| matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')).count();
        assert_eq!(terminators, program.line_map.len());
        assert!(program.source.contains("void `a\\u2028b\\rc\\u2029d`;"));
        assert_eq!(program.line_map.get(line_of(&program, "void (user.nmae)")).unwrap().line, 2);
    }

    #[test]
    fn test_mixin_parameters() {
        assert_eq!(mixin_parameters(""), "..._rest: any[]");
        assert_eq!(mixin_parameters("a, b: string"), "a?: any, b: string, ..._rest: any[]");
        assert_eq!(mixin_parameters("first, ...items"), "first?: any, ...items: any[]");
        assert_eq!(mixin_parameters("opts = { a: 1, b: 2 }"), "opts = { a: 1, b: 2 }, ..._rest: any[]");
    }
}
