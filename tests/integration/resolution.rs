//! Inheritance, inclusion and cycle handling through the checker.

use anyhow::Result;
use pretty_assertions::assert_eq;
use pugcheck_cli::diagnostics::ErrorKind;
use pugcheck_cli::engine::NoopEngine;
use pugcheck_cli::template::{NodeKind, walk_all};
use pugcheck_cli::test_utils::TemplateProject;

const BASE: &str = "html\n  body\n    block content\n      p default\n    block footer\n      p= footer\n";

#[test]
fn test_child_region_replaces_parent_default() -> Result<()> {
    let project = TemplateProject::new()?;
    let base = project.view("layouts/base.pug", BASE)?;
    let home = project.view(
        "pages/home.pug",
        "//@ expect { title: string; footer: string }\nextends ../layouts/base\n\nblock content\n  h1= title\n",
    )?;

    let mut checker = project.checker(NoopEngine)?;
    let generated = checker.generate(&home)?;
    assert_eq!(generated.errors, vec![]);

    let tree = generated.tree.expect("tree");
    let mut texts = Vec::new();
    walk_all(&tree, &mut |node| {
        if let NodeKind::Text {
            value,
        } = &node.kind
        {
            texts.push(value.clone());
        }
    });
    assert!(!texts.contains(&"default".to_string()), "parent default survived: {texts:?}");

    let program = generated.program.expect("program");
    let title = program.source.lines().position(|line| line.contains("void (title);")).unwrap() + 1;
    let footer = program.source.lines().position(|line| line.contains("void (footer);")).unwrap() + 1;

    let title_origin = program.line_map.get(title).unwrap();
    assert_eq!(title_origin.file, home);
    assert_eq!(title_origin.line, 5);

    let footer_origin = program.line_map.get(footer).unwrap();
    assert_eq!(footer_origin.file, base);
    assert_eq!(footer_origin.line, 6);
    Ok(())
}

#[test]
fn test_include_nodes_keep_their_own_origin() -> Result<()> {
    let project = TemplateProject::new()?;
    let nav = project.view("partials/nav.pug", "nav\n  a(href=home.url)= home.label\n")?;
    let page = project.view("page.pug", "//@ expect { home: { url: string; label: string } }\ndiv\n  include partials/nav\n")?;

    let mut checker = project.checker(NoopEngine)?;
    let generated = checker.generate(&page)?;
    assert!(generated.errors.is_empty(), "{:?}", generated.errors);

    let program = generated.program.unwrap();
    let line = program.source.lines().position(|line| line.contains("void (home.label);")).unwrap() + 1;
    let origin = program.line_map.get(line).unwrap();
    assert_eq!(origin.file, nav);
    assert_eq!(origin.line, 2);
    assert!(checker.graph().get(&page).contains(&nav));
    Ok(())
}

#[test]
fn test_missing_parent_is_reported_once_at_extends_line() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view("page.pug", "//@ expect {}\nextends /layouts/missing\n\nblock content\n  p hi\n")?;

    let mut checker = project.checker(NoopEngine)?;
    let errors = checker.scan_file(&page);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ErrorKind::MissingFile);
    assert_eq!(errors[0].file, page);
    assert_eq!(errors[0].line, Some(2));
    // The edge is recorded even though the parent is missing.
    assert!(checker.graph().get(&page).contains(&project.view_path("layouts/missing.pug")));
    Ok(())
}

#[test]
fn test_inheritance_cycle_yields_exactly_one_error() -> Result<()> {
    let project = TemplateProject::new()?;
    let a = project.view("a.pug", "extends b\n\nblock content\n  p a\n")?;
    let b = project.view("b.pug", "extends a\n\nblock content\n  p b\n")?;

    let mut checker = project.checker(NoopEngine)?;
    let errors = checker.scan_file(&a);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ErrorKind::Cycle);
    assert_eq!(errors[0].file, b);
    assert_eq!(errors[0].line, Some(1));
    assert_eq!(checker.graph().cycles(), vec![vec![a, b]]);
    Ok(())
}

#[test]
fn test_include_cycle_through_self() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view("loop.pug", "div\n  include loop\n")?;

    let mut checker = project.checker(NoopEngine)?;
    let errors = checker.scan_file(&page);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ErrorKind::Cycle);
    assert_eq!(errors[0].line, Some(2));
    Ok(())
}
