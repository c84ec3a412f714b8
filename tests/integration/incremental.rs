//! Change notification and dependent propagation.

use std::collections::BTreeSet;

use anyhow::Result;
use pretty_assertions::assert_eq;
use pugcheck_cli::diagnostics::ErrorKind;
use pugcheck_cli::test_utils::{ScriptedEngine, TemplateProject};

#[test]
fn test_changed_layout_rechecks_every_dependent() -> Result<()> {
    let project = TemplateProject::new()?;
    let base = project.view("layouts/base.pug", "html\n  body\n    block content\n")?;
    let admin = project.view("layouts/admin.pug", "extends base\n\nblock content\n  nav admin\n")?;
    let home = project.view("home.pug", "extends layouts/base\n\nblock content\n  p home\n")?;
    let users = project.view("users.pug", "extends layouts/admin\n")?;
    let about = project.view("about.pug", "p standalone\n")?;

    let engine = ScriptedEngine::new();
    let calls = engine.calls();
    let mut checker = project.checker(engine)?;
    let report = checker.scan_all(&[])?;
    assert_eq!(report.template_count(), 5);
    assert!(!report.has_errors());

    calls.borrow_mut().clear();
    let processed = checker.notify_changed(&base);

    let processed: BTreeSet<_> = processed.into_iter().collect();
    let expected: BTreeSet<_> = [base.clone(), admin.clone(), home.clone(), users.clone()].into_iter().collect();
    assert_eq!(processed, expected);
    assert!(!calls.borrow().contains(&about));
    assert!(checker.cache().stale_files().is_empty());
    Ok(())
}

#[test]
fn test_changed_type_module_rechecks_importers() -> Result<()> {
    let project = TemplateProject::new()?;
    let types = project.write("src/types/user.ts", "export type User = { name: string };\n")?;
    let page = project.view("page.pug", "//@ import type { User } from \"../types/user\"\n//@ expect { user: User }\np= user.name\n")?;
    project.view("other.pug", "p other\n")?;

    let mut checker = project.checker(ScriptedEngine::new())?;
    checker.scan_all(&[])?;

    assert_eq!(checker.notify_changed(&types), vec![page]);
    Ok(())
}

#[test]
fn test_deleted_partial_surfaces_in_includer() -> Result<()> {
    let project = TemplateProject::new()?;
    let nav = project.view("partials/nav.pug", "nav menu\n")?;
    let page = project.view("page.pug", "div\n  include partials/nav\n")?;

    let mut checker = project.checker(ScriptedEngine::new())?;
    assert!(!checker.scan_all(&[])?.has_errors());

    std::fs::remove_file(&nav)?;
    let processed = checker.notify_changed(&nav);
    assert_eq!(processed, vec![page.clone()]);
    assert!(checker.cache().get(&nav).is_none());

    let errors = &checker.cache().get(&page).unwrap().errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MissingFile);
    assert_eq!(errors[0].line, Some(2));
    Ok(())
}

#[test]
fn test_fixing_a_template_clears_its_errors() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view("page.pug", "extends /layouts/base\n")?;

    let mut checker = project.checker(ScriptedEngine::new())?;
    assert!(checker.scan_all(&[])?.has_errors());

    let base = project.view("layouts/base.pug", "html\n")?;
    let processed = checker.notify_changed(&base);

    assert_eq!(processed, vec![base, page.clone()]);
    assert!(checker.cache().get(&page).unwrap().errors.is_empty());
    Ok(())
}
