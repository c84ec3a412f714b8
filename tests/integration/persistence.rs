//! Saving and reloading the parse result cache across runs.

use anyhow::Result;
use pretty_assertions::assert_eq;
use pugcheck_cli::config::SharedLocalsConfig;
use pugcheck_cli::engine::NoopEngine;
use pugcheck_cli::test_utils::{ScriptedEngine, TemplateProject};

#[test]
fn test_reload_skips_unchanged_templates() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("partials/nav.pug", "nav= menu\n")?;
    project.view("page.pug", "//@ expect { menu: string }\ndiv\n  include partials/nav\n")?;
    project.view("about.pug", "p about\n")?;

    let mut first = project.checker(ScriptedEngine::new().fail_on("menu", 2304, "Cannot find name 'menu'."))?;
    let report = first.scan_all(&[])?;
    assert_eq!(report.processed.len(), 3);
    first.save_cache()?;
    assert!(project.config().cache_path.is_file());

    let engine = ScriptedEngine::new();
    let calls = engine.calls();
    let mut second = project.checker(engine)?;
    second.load_cache();
    let reloaded = second.scan_all(&[])?;

    assert!(reloaded.processed.is_empty());
    assert!(calls.borrow().is_empty());
    assert_eq!(reloaded.results, report.results);
    assert_eq!(second.graph().edges(), first.graph().edges());
    Ok(())
}

#[test]
fn test_reload_reprocesses_changed_file_and_dependents() -> Result<()> {
    let project = TemplateProject::new()?;
    let nav = project.view("partials/nav.pug", "nav menu\n")?;
    let page = project.view("page.pug", "div\n  include partials/nav\n")?;
    project.view("about.pug", "p about\n")?;

    let mut first = project.checker(ScriptedEngine::new())?;
    first.scan_all(&[])?;
    first.save_cache()?;

    project.touch(&nav, 1_000_000)?;

    let mut second = project.checker(ScriptedEngine::new())?;
    second.load_cache();
    let mut stale = second.cache().stale_files();
    stale.sort();
    assert_eq!(stale, vec![page.clone(), nav.clone()]);

    let report = second.scan_all(&[])?;
    let mut processed = report.processed.clone();
    processed.sort();
    assert_eq!(processed, vec![page, nav]);
    Ok(())
}

#[test]
fn test_reload_evicts_deleted_templates() -> Result<()> {
    let project = TemplateProject::new()?;
    let old = project.view("old.pug", "p old\n")?;
    project.view("page.pug", "p page\n")?;

    let mut first = project.checker(ScriptedEngine::new())?;
    first.scan_all(&[])?;
    first.save_cache()?;
    std::fs::remove_file(&old)?;

    let mut second = project.checker(ScriptedEngine::new())?;
    second.load_cache();
    assert!(second.cache().get(&old).is_none());
    assert_eq!(second.cache().len(), 1);
    Ok(())
}

#[test]
fn test_corrupt_cache_is_ignored() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("page.pug", "p page\n")?;
    project.write(".tmp/pug.parseResults.json", "{ not json")?;

    let mut checker = project.checker(ScriptedEngine::new())?;
    checker.load_cache();
    assert!(checker.cache().is_empty());
    assert_eq!(checker.scan_all(&[])?.processed.len(), 1);
    Ok(())
}

#[test]
fn test_results_without_typecheck_are_not_reused_by_typecheck() -> Result<()> {
    let project = TemplateProject::new()?;
    project.write("src/types/user.ts", "export type User = { name: string };\n")?;
    let page = project.view("page.pug", "//@ import type { User } from \"../types/user\"\n//@ expect { user: User }\np= user.nmae\n")?;

    let mut structural = project.checker(NoopEngine)?;
    assert!(!structural.scan_all(&[])?.has_errors());
    structural.save_cache()?;

    let engine = ScriptedEngine::new().fail_on("user.nmae", 2339, "Property 'nmae' does not exist on type 'User'.");
    let calls = engine.calls();
    let mut typed = project.checker(engine)?;
    typed.load_cache();
    let report = typed.scan_all(&[])?;

    assert_eq!(report.processed, vec![page.clone()]);
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(report.results[&page].len(), 1);
    assert_eq!(report.results[&page][0].code, Some(2339));
    Ok(())
}

#[test]
fn test_reload_reprocesses_importers_of_changed_type_module() -> Result<()> {
    let project = TemplateProject::new()?;
    let types = project.write("src/types/user.ts", "export type User = { name: string };\n")?;
    let page = project.view("page.pug", "//@ import type { User } from \"../types/user\"\n//@ expect { user: User }\np= user.name\n")?;
    project.view("about.pug", "p about\n")?;
    project.touch(&types, 1_000_000)?;

    let mut first = project.checker(ScriptedEngine::new())?;
    first.scan_all(&[])?;
    first.save_cache()?;

    project.write("src/types/user.ts", "export type User = { fullName: string };\n")?;
    project.touch(&types, 2_000_000)?;

    let mut second = project.checker(ScriptedEngine::new())?;
    second.load_cache();
    assert_eq!(second.cache().stale_files(), vec![page.clone()]);
    assert_eq!(second.scan_all(&[])?.processed, vec![page]);
    Ok(())
}

#[test]
fn test_reload_reprocesses_when_shared_locals_change() -> Result<()> {
    let project = TemplateProject::new()?;
    let shared = project.write("src/types/locals.d.ts", "export type SharedLocals = { csrf: string };\n")?;
    project.view("page.pug", "p= csrf\n")?;
    project.view("about.pug", "p about\n")?;
    project.touch(&shared, 1_000_000)?;

    let mut config = project.config();
    config.shared_locals = Some(SharedLocalsConfig {
        import_path: shared.clone(),
        type_name: "SharedLocals".to_string(),
    });

    let mut first = project.checker_with(config.clone(), ScriptedEngine::new())?;
    first.scan_all(&[])?;
    first.save_cache()?;

    project.touch(&shared, 2_000_000)?;

    let mut second = project.checker_with(config, ScriptedEngine::new())?;
    second.load_cache();
    assert_eq!(second.scan_all(&[])?.processed.len(), 2);
    Ok(())
}
