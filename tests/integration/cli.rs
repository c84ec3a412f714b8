//! The `pugcheck` binary, run with `--no-typecheck` so no compiler is needed.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use pugcheck_cli::test_utils::TemplateProject;

fn pugcheck(project: &TemplateProject) -> Command {
    let mut cmd = Command::cargo_bin("pugcheck").unwrap();
    cmd.current_dir(&project.root).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_check_clean_project_succeeds() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("layouts/base.pug", "html\n  body\n    block content\n")?;
    project.view("page.pug", "//@ expect { title: string }\nextends layouts/base\n\nblock content\n  h1= title\n")?;

    pugcheck(&project)
        .args(["check", "--no-typecheck"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 2 templates, no errors"));

    assert!(project.root.join(".tmp/pug.parseResults.json").is_file());
    Ok(())
}

#[test]
fn test_check_reports_missing_include_and_fails() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("page.pug", "div\n  include partials/gone\n")?;

    pugcheck(&project)
        .args(["check", "--no-typecheck", "--no-cache"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("src/views/page.pug:2"))
        .stdout(predicate::str::contains("missing file error"))
        .stdout(predicate::str::contains("1 error(s) in 1 file(s)"));

    assert!(!project.root.join(".tmp/pug.parseResults.json").exists());
    Ok(())
}

#[test]
fn test_check_json_output() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("page.pug", "extends /nope\n")?;

    let output = pugcheck(&project).args(["check", "--no-typecheck", "--format", "json"]).output()?;
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["templates"], 1);
    assert_eq!(json["errors"], 1);
    assert_eq!(json["results"][0]["errors"][0]["kind"], "missing-file");
    Ok(())
}

#[test]
fn test_check_uses_config_file() -> Result<()> {
    let project = TemplateProject::new()?;
    project.write("pugcheck.toml", "views_root = \"templates\"\ntemplate_paths = [\"templates\"]\n")?;
    project.write("templates/page.pug", "p hi\n")?;
    project.view("ignored.pug", "include nope\n")?;

    pugcheck(&project)
        .args(["check", "--no-typecheck"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 1 template, no errors"));
    Ok(())
}

#[test]
fn test_bad_config_reports_friendly_error() -> Result<()> {
    let project = TemplateProject::new()?;
    project.write("pugcheck.toml", "views = 3\n")?;

    pugcheck(&project)
        .args(["check", "--no-typecheck"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pugcheck.toml"));
    Ok(())
}

#[test]
fn test_generate_prints_annotated_program() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("page.pug", "//@ expect { name: string }\np Hello #{name}\n")?;

    pugcheck(&project)
        .args(["generate", "src/views/page.pug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export function render(locals: { name: string }) {"))
        .stdout(predicate::str::contains("src/views/page.pug:2"));

    pugcheck(&project)
        .args(["generate", "src/views/page.pug", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("// src/views").not());
    Ok(())
}

#[test]
fn test_deps_shows_tree_and_dependents() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("layouts/base.pug", "html\n  body\n    block content\n")?;
    project.view("page.pug", "extends layouts/base\n")?;

    pugcheck(&project)
        .args(["deps", "src/views/layouts/base.pug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dependents:"))
        .stdout(predicate::str::contains("src/views/page.pug"));

    pugcheck(&project)
        .args(["deps", "src/views/page.pug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("└── src/views/layouts/base.pug"));
    Ok(())
}

#[test]
fn test_cache_clear_removes_file() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("page.pug", "p hi\n")?;

    pugcheck(&project).args(["check", "--no-typecheck"]).assert().success();
    let cache = project.root.join(".tmp/pug.parseResults.json");
    assert!(cache.is_file());

    pugcheck(&project)
        .args(["cache", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Templates:  1"));

    pugcheck(&project).args(["cache", "clear"]).assert().success();
    assert!(!cache.exists());
    Ok(())
}
