//! Terminal rendering of template errors.

use std::path::Path;

use colored::Colorize;

use super::error::TemplateError;

/// Plain-language explanation of common engine error codes.
pub fn describe_code(code: u32) -> Option<&'static str> {
    Some(match code {
        2304 => "a name is used that is not in scope; declare it in the template's expect shape",
        2322 => "a value does not match the declared type",
        2339 => "a property is read that the declared type does not have",
        2345 => "an argument does not match the parameter type",
        2551 | 2552 => "a name or property looks like a typo of an existing one",
        2693 => "a type is used where a value is expected",
        7006 => "a parameter has an implicit any type",
        7031 => "a destructured binding has an implicit any type",
        7053 => "an index expression has an implicit any type",
        _ => return None,
    })
}

/// Render one error with a source snippet when the line is readable.
///
/// Paths are shown relative to `base`.
pub fn format_error(error: &TemplateError, base: &Path) -> String {
    let file = error.file.strip_prefix(base).unwrap_or(&error.file);
    let location = match error.line {
        Some(line) => format!("{}:{line}", file.display()),
        None => file.display().to_string(),
    };
    let label = match error.code {
        Some(code) => format!("error TS{code}"),
        None => format!("{} error", error.kind),
    };

    let mut out = format!("{} {} {}\n", location.bold(), label.red().bold(), error.message);
    if let Some(line) = error.line
        && let Some(text) = source_line(&error.file, line)
    {
        let number = line.to_string();
        out.push_str(&format!("  {} {} {}\n", number.blue(), "|".blue(), text));
    }
    if let Some(hint) = error.code.and_then(describe_code) {
        out.push_str(&format!("  {}: {hint}\n", "hint".green()));
    }
    out
}

/// One-line run summary.
pub fn format_summary(templates: usize, errors: usize, failed: usize) -> String {
    let noun = if templates == 1 { "template" } else { "templates" };
    if errors == 0 {
        format!("{} Checked {templates} {noun}, no errors", "✓".green())
    } else {
        format!(
            "{} Checked {templates} {noun}: {} in {failed} file(s)",
            "✗".red(),
            format!("{errors} error(s)").red().bold()
        )
    }
}

fn source_line(file: &Path, line: usize) -> Option<String> {
    let text = std::fs::read_to_string(file).ok()?;
    text.lines().nth(line.checked_sub(1)?).map(|l| l.trim_end().to_string())
}
