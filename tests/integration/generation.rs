//! Determinism and line-map totality of generated programs.

use anyhow::Result;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use pugcheck_cli::engine::NoopEngine;
use pugcheck_cli::test_utils::TemplateProject;

#[test]
fn test_generation_is_deterministic() -> Result<()> {
    let project = TemplateProject::new()?;
    project.view("layouts/base.pug", "html\n  body\n    block content\n")?;
    project.view("partials/item.pug", "li= item.name\n")?;
    let page = project.view(
        "page.pug",
        "//@ import type { Item } from \"../types/item\"\n//@ expect { items: Item[] }\nextends layouts/base\n\nblock content\n  ul\n    each item in items\n      include partials/item\n",
    )?;
    project.write("src/types/item.ts", "export type Item = { name: string };\n")?;

    let mut first = project.checker(NoopEngine)?;
    let mut second = project.checker(NoopEngine)?;
    let a = first.generate(&page)?;
    let b = second.generate(&page)?;
    let again = first.generate(&page)?;

    assert!(a.errors.is_empty(), "{:?}", a.errors);
    let a = a.program.unwrap();
    assert_eq!(Some(&a), b.program.as_ref());
    assert_eq!(Some(&a), again.program.as_ref());
    assert!(a.source.contains(&format!("from \"{}\";", project.root.join("src/types/item").display())));
    Ok(())
}

#[test]
fn test_unresolved_type_import_is_reported_at_directive() -> Result<()> {
    let project = TemplateProject::new()?;
    let page = project.view("page.pug", "//@ import type { Gone } from \"./gone\"\n//@ expect { g: Gone }\np= g\n")?;

    let mut checker = project.checker(NoopEngine)?;
    let errors = checker.scan_file(&page);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].line, Some(1));
    Ok(())
}

const LINES: &[&str] = &[
    "p hello",
    "p= title",
    "div(class=cls)",
    "| plain text #{name}",
    "- const n = 1",
    "if flag",
    "else",
    "each x in xs",
    "//- a comment",
    "+card(title)",
    "span: b= label",
    "",
];

fn template() -> impl Strategy<Value = String> {
    prop::collection::vec((0usize..3, prop::sample::select(LINES)), 0..24).prop_map(|lines| {
        lines
            .into_iter()
            .map(|(depth, line)| format!("{}{line}", "  ".repeat(depth)))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_generated_line_maps_into_the_template(body in template()) {
        let project = TemplateProject::new().unwrap();
        let source = format!("//@ expect {{ title: string }}\n{body}\n");
        let page = project.view("page.pug", &source).unwrap();
        let template_lines = source.lines().count();

        let mut checker = project.checker(NoopEngine).unwrap();
        let generated = checker.generate(&page).unwrap();
        let program = generated.program.unwrap();

        prop_assert_eq!(program.source.lines().count(), program.line_map.len());
        for (idx, origin) in program.line_map.iter().enumerate() {
            if origin.is_contract() {
                continue;
            }
            prop_assert_eq!(&origin.file, &page, "line {} of\n{}", idx + 1, program.source);
            prop_assert!(origin.line >= 1 && origin.line <= template_lines, "line {} -> {}", idx + 1, origin.line);
        }
    }
}
