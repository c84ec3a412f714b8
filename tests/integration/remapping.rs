//! Engine diagnostics reported at the template lines that caused them.

use anyhow::Result;
use pretty_assertions::assert_eq;
use pugcheck_cli::diagnostics::ErrorKind;
use pugcheck_cli::test_utils::{ScriptedEngine, TemplateProject};

#[test]
fn test_type_error_lands_on_template_line() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view(
        "page.pug",
        "//@ expect { user: { name: string } }\ndiv\n  h1 Welcome\n  p= user.nmae\n",
    )?;

    let engine = ScriptedEngine::new().fail_on("user.nmae", 2551, "Property 'nmae' does not exist.");
    let mut checker = project.checker(engine)?;
    let errors = checker.scan_file(&page);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ErrorKind::TypeCheck);
    assert_eq!(errors[0].file, page);
    assert_eq!(errors[0].line, Some(4));
    assert_eq!(errors[0].code, Some(2551));
    Ok(())
}

#[test]
fn test_error_in_parent_points_at_parent_file() -> Result<()> {
    let project = TemplateProject::new()?;
    let base = project.view("layouts/base.pug", "html\n  head\n    title= pageTitle\n  body\n    block content\n")?;
    let page = project.view("page.pug", "//@ expect { heading: string }\nextends layouts/base\n\nblock content\n  h1= heading\n")?;

    let engine = ScriptedEngine::new().fail_on("pageTitle", 2304, "Cannot find name 'pageTitle'.");
    let mut checker = project.checker(engine)?;
    let errors = checker.scan_file(&page);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].file, base);
    assert_eq!(errors[0].line, Some(3));
    Ok(())
}

#[test]
fn test_contract_error_points_at_signature_line() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view("page.pug", "p hi\n//@ expect { items: Itemz[] }\n")?;

    let engine = ScriptedEngine::new().fail_on("Itemz", 2304, "Cannot find name 'Itemz'.");
    let mut checker = project.checker(engine)?;
    let errors = checker.scan_file(&page);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].line, Some(2));
    Ok(())
}

#[test]
fn test_engine_failure_is_a_template_error() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view("page.pug", "p hi\n")?;

    let mut checker = project.checker(ScriptedEngine::new().broken("tsc exited with signal 9"))?;
    let errors = checker.scan_file(&page);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Engine);
    assert!(errors[0].message.contains("signal 9"));
    assert_eq!(errors[0].line, None);
    Ok(())
}
