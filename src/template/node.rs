//! Template node tree.
//!
//! A [`TemplateNode`] is one construct of a Pug template: an element, a line
//! of text, an embedded code statement, a control-flow block, a directive, and
//! so on. Nodes own their children exclusively; every transformation in the
//! resolver builds a new tree instead of mutating a shared one.
//!
//! Each node carries the 1-based line it was parsed from and, once stamped,
//! the absolute path of the file it came from. Together they form the node's
//! [`Origin`], which is what the code generator records in the line map.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a node came from: absolute file path plus 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub file: PathBuf,
    pub line: usize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// How a child's named region combines with the parent's region of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionMode {
    /// `block name` - the child's content replaces the parent's.
    #[default]
    Replace,
    /// `block append name` / `append name`
    Append,
    /// `block prepend name` / `prepend name`
    Prepend,
}

/// A single attribute on an element, e.g. `href=user.url`.
///
/// `value` is the raw host-language expression text. Class and id shorthands
/// (`.btn`, `#main`) become attributes whose value is a quoted string literal;
/// boolean attributes without a value get `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub escaped: bool,
}

/// Kind-specific payload of a [`TemplateNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attributes: Vec<Attribute>,
        /// Expressions passed through `&attributes(...)`.
        attribute_blocks: Vec<String>,
    },
    Text {
        value: String,
    },
    Code {
        value: String,
        /// Buffered code (`=`, `!=`, `#{}`) prints its value; unbuffered (`-`) runs it.
        buffered: bool,
        escaped: bool,
    },
    Loop {
        item: String,
        key: Option<String>,
        collection: String,
        /// Body of an `else` attached to the loop (rendered when the collection is empty).
        alternate: Vec<TemplateNode>,
    },
    While {
        test: String,
    },
    Conditional {
        test: String,
        /// `unless` rather than `if`.
        negated: bool,
        /// `else` / `else if` branch. An `else if` is a single nested conditional.
        alternate: Vec<TemplateNode>,
    },
    Inherits {
        target: String,
    },
    Include {
        target: String,
        filter: Option<String>,
    },
    Region {
        name: String,
        mode: RegionMode,
    },
    MixinDefinition {
        name: String,
        args: Option<String>,
    },
    MixinCall {
        name: String,
        args: Option<String>,
    },
    Comment {
        value: String,
        buffered: bool,
    },
    Filter {
        name: String,
    },
    Doctype {
        value: String,
    },
}

impl NodeKind {
    /// Short lowercase name used in logs and placeholder output.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Element {
                ..
            } => "element",
            NodeKind::Text {
                ..
            } => "text",
            NodeKind::Code {
                ..
            } => "code",
            NodeKind::Loop {
                ..
            } => "each",
            NodeKind::While {
                ..
            } => "while",
            NodeKind::Conditional {
                ..
            } => "conditional",
            NodeKind::Inherits {
                ..
            } => "extends",
            NodeKind::Include {
                ..
            } => "include",
            NodeKind::Region {
                ..
            } => "block",
            NodeKind::MixinDefinition {
                ..
            } => "mixin",
            NodeKind::MixinCall {
                ..
            } => "mixin-call",
            NodeKind::Comment {
                ..
            } => "comment",
            NodeKind::Filter {
                ..
            } => "filter",
            NodeKind::Doctype {
                ..
            } => "doctype",
        }
    }

    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            NodeKind::Inherits {
                ..
            } | NodeKind::Include {
                ..
            }
        )
    }
}

/// One node of a template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    pub kind: NodeKind,
    pub children: Vec<TemplateNode>,
    /// 1-based source line.
    pub line: usize,
    /// Absolute path of the originating file. `None` until stamped.
    pub file: Option<Arc<Path>>,
}

impl TemplateNode {
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Self {
            kind,
            children: Vec::new(),
            line,
            file: None,
        }
    }

    pub fn with_children(mut self, children: Vec<TemplateNode>) -> Self {
        self.children = children;
        self
    }

    /// The node's origin, if it has been stamped.
    pub fn origin(&self) -> Option<Origin> {
        self.file.as_ref().map(|file| Origin {
            file: file.to_path_buf(),
            line: self.line,
        })
    }

    /// Region name, if this node is a named region.
    pub fn region_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Region {
                name,
                ..
            } if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    /// Alternate branch for conditionals and loops.
    pub fn alternate(&self) -> &[TemplateNode] {
        match &self.kind {
            NodeKind::Conditional {
                alternate,
                ..
            }
            | NodeKind::Loop {
                alternate,
                ..
            } => alternate,
            _ => &[],
        }
    }

    /// Every nested node list: the children and, for branching kinds, the alternate.
    pub fn child_lists(&self) -> impl Iterator<Item = &[TemplateNode]> {
        [self.children.as_slice(), self.alternate()].into_iter().filter(|list| !list.is_empty())
    }

    /// Rebuild this node by passing every nested node list through `f`.
    ///
    /// The kind and origin are preserved; only `children` and the alternate
    /// branch are replaced.
    pub fn try_map_lists<E, F>(self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(Vec<TemplateNode>) -> Result<Vec<TemplateNode>, E>,
    {
        let TemplateNode {
            kind,
            children,
            line,
            file,
        } = self;

        let kind = match kind {
            NodeKind::Conditional {
                test,
                negated,
                alternate,
            } => NodeKind::Conditional {
                test,
                negated,
                alternate: f(alternate)?,
            },
            NodeKind::Loop {
                item,
                key,
                collection,
                alternate,
            } => NodeKind::Loop {
                item,
                key,
                collection,
                alternate: f(alternate)?,
            },
            other => other,
        };

        Ok(TemplateNode {
            kind,
            children: f(children)?,
            line,
            file,
        })
    }

    /// Visit this node and every descendant depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TemplateNode)) {
        visit(self);
        for list in self.child_lists() {
            for child in list {
                child.walk(visit);
            }
        }
    }
}

/// Stamp `file` onto every node in `nodes`, recursively.
///
/// Existing origins are overwritten; the resolver uses this both for freshly
/// parsed trees and for re-tagging a child's region overrides.
pub fn stamp_origin(nodes: Vec<TemplateNode>, file: &Arc<Path>) -> Vec<TemplateNode> {
    nodes.into_iter().map(|node| stamp_node(node, file)).collect()
}

fn stamp_node(node: TemplateNode, file: &Arc<Path>) -> TemplateNode {
    let stamped = node.try_map_lists::<std::convert::Infallible, _>(|list| Ok(stamp_origin(list, file)));
    match stamped {
        Ok(mut node) => {
            node.file = Some(Arc::clone(file));
            node
        }
        Err(never) => match never {},
    }
}

/// Visit every node in a list of trees.
pub fn walk_all<'a>(nodes: &'a [TemplateNode], visit: &mut impl FnMut(&'a TemplateNode)) {
    for node in nodes {
        node.walk(visit);
    }
}

/// Render a tree as indented text, one node per line. Used by `pugcheck generate --tree`
/// and in test failure output.
pub fn render_tree(nodes: &[TemplateNode]) -> String {
    let mut out = String::new();
    render_into(nodes, 0, &mut out);
    out
}

fn render_into(nodes: &[TemplateNode], depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let label = match &node.kind {
            NodeKind::Element {
                name,
                ..
            } => name.clone(),
            NodeKind::Text {
                value,
            } => format!("| {value}"),
            NodeKind::Code {
                value,
                buffered: true,
                ..
            } => format!("= {value}"),
            NodeKind::Code {
                value,
                ..
            } => format!("- {value}"),
            NodeKind::Loop {
                item,
                key,
                collection,
                ..
            } => match key {
                Some(key) => format!("each {item}, {key} in {collection}"),
                None => format!("each {item} in {collection}"),
            },
            NodeKind::While {
                test,
            } => format!("while {test}"),
            NodeKind::Conditional {
                test,
                negated,
                ..
            } => format!("{} {test}", if *negated { "unless" } else { "if" }),
            NodeKind::Inherits {
                target,
            } => format!("extends {target}"),
            NodeKind::Include {
                target,
                ..
            } => format!("include {target}"),
            NodeKind::Region {
                name,
                ..
            } => format!("block {name}"),
            NodeKind::MixinDefinition {
                name,
                args,
            } => format!("mixin {name}({})", args.as_deref().unwrap_or_default()),
            NodeKind::MixinCall {
                name,
                args,
            } => format!("+{name}({})", args.as_deref().unwrap_or_default()),
            NodeKind::Comment {
                value,
                ..
            } => format!("// {value}"),
            NodeKind::Filter {
                name,
            } => format!(":{name}"),
            NodeKind::Doctype {
                value,
            } => format!("doctype {value}"),
        };
        let origin = node
            .file
            .as_ref()
            .and_then(|f| f.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "?".to_string());
        out.push_str(&format!("{indent}{label}  [{origin}:{}]\n", node.line));
        render_into(&node.children, depth + 1, out);
        let alternate = node.alternate();
        if !alternate.is_empty() {
            out.push_str(&format!("{indent}else\n"));
            render_into(alternate, depth + 1, out);
        }
    }
}
