//! A fake type-checking engine.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Result, bail};

use crate::codegen::SyntheticProgram;
use crate::diagnostics::{EngineDiagnostic, Severity};
use crate::engine::TypeCheckEngine;

/// Reports a diagnostic on every generated line containing a scripted
/// needle, and records which templates it was asked to check.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    rules: Vec<(String, u32, String)>,
    failure: Option<String>,
    calls: Rc<RefCell<Vec<PathBuf>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `code: message` on lines containing `needle`.
    pub fn fail_on(mut self, needle: &str, code: u32, message: &str) -> Self {
        self.rules.push((needle.to_string(), code, message.to_string()));
        self
    }

    /// Make every check fail as if the engine crashed.
    pub fn broken(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Shared log of checked templates; stays valid after the engine is
    /// moved into a checker.
    pub fn calls(&self) -> Rc<RefCell<Vec<PathBuf>>> {
        Rc::clone(&self.calls)
    }
}

impl TypeCheckEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn check(&self, program: &SyntheticProgram) -> Result<Vec<EngineDiagnostic>> {
        self.calls.borrow_mut().push(program.template_path.clone());
        if let Some(reason) = &self.failure {
            bail!("{reason}");
        }

        let file = self.program_file(program);
        let mut diagnostics = Vec::new();
        for (idx, line) in program.source.lines().enumerate() {
            for (needle, code, message) in &self.rules {
                if let Some(column) = line.find(needle.as_str()) {
                    diagnostics.push(EngineDiagnostic {
                        file: file.clone(),
                        line: idx + 1,
                        column: column + 1,
                        code: Some(*code),
                        severity: Severity::Error,
                        message: message.clone(),
                    });
                }
            }
        }
        Ok(diagnostics)
    }
}
