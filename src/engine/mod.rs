//! Type-checking engines.
//!
//! An engine takes a [`SyntheticProgram`] and reports diagnostics in the
//! program's own coordinates; [`crate::diagnostics::remap`] translates them.
//!
//! [`TscEngine`] drives the TypeScript compiler. Each program is written to
//! the temp directory together with a `tsconfig` that extends the project's,
//! so path aliases, `lib` and strictness settings match the application code.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::json;
use tracing::{debug, trace};

use crate::codegen::SyntheticProgram;
use crate::core::PugcheckError;
use crate::diagnostics::{EngineDiagnostic, Severity};
use crate::utils::fs::{atomic_write, normalize_path};

/// A type checker for synthetic programs.
pub trait TypeCheckEngine {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Path the engine reports for `program`'s own diagnostics.
    fn program_file(&self, program: &SyntheticProgram) -> PathBuf {
        program.template_path.with_extension("ts")
    }

    /// Check `program`. An `Err` means the engine itself failed; type errors
    /// are returned as diagnostics.
    fn check(&self, program: &SyntheticProgram) -> Result<Vec<EngineDiagnostic>>;
}

/// Performs no type checking; only structural errors are reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEngine;

impl TypeCheckEngine for NoopEngine {
    fn name(&self) -> &str {
        "none"
    }

    fn check(&self, _program: &SyntheticProgram) -> Result<Vec<EngineDiagnostic>> {
        Ok(Vec::new())
    }
}

/// The TypeScript compiler, run once per program.
#[derive(Debug, Clone)]
pub struct TscEngine {
    executable: PathBuf,
    project_path: PathBuf,
    tmp_dir: PathBuf,
    tsconfig: Option<PathBuf>,
}

impl TscEngine {
    pub fn new(executable: PathBuf, project_path: &Path, tmp_dir: &Path, tsconfig: Option<&Path>) -> Self {
        Self {
            executable,
            project_path: normalize_path(project_path),
            tmp_dir: normalize_path(tmp_dir),
            tsconfig: tsconfig.filter(|path| path.is_file()).map(normalize_path),
        }
    }

    /// Locate `tsc`: the project's `node_modules/.bin` first, then `PATH`.
    pub fn discover(project_path: &Path, tmp_dir: &Path, tsconfig: Option<&Path>) -> Result<Self> {
        let local = project_path.join("node_modules").join(".bin").join(if cfg!(windows) { "tsc.cmd" } else { "tsc" });
        let executable = if local.is_file() {
            local
        } else {
            which::which("tsc").map_err(|_| PugcheckError::EngineNotFound {
                name: "tsc".to_string(),
            })?
        };
        debug!(target: "engine", "Using tsc at {}", executable.display());
        Ok(Self::new(executable, project_path, tmp_dir, tsconfig))
    }

    /// Write the `tsconfig` for one program file and return its path.
    fn write_config(&self, program_file: &Path) -> Result<PathBuf> {
        let stem = program_file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let config_path = self.tmp_dir.join(format!("{stem}.tsconfig.json"));

        let mut config = json!({
            "compilerOptions": {
                "noEmit": true,
                "noUnusedLocals": false,
                "noUnusedParameters": false,
            },
            "files": [program_file.to_string_lossy()],
            "include": [],
        });
        match &self.tsconfig {
            Some(base) => config["extends"] = json!(base.to_string_lossy()),
            None => config["compilerOptions"]["strict"] = json!(true),
        }

        let text = serde_json::to_string_pretty(&config)?;
        atomic_write(&config_path, text.as_bytes())?;
        Ok(config_path)
    }
}

impl TypeCheckEngine for TscEngine {
    fn name(&self) -> &str {
        "tsc"
    }

    fn program_file(&self, program: &SyntheticProgram) -> PathBuf {
        let relative = program.template_path.strip_prefix(&self.project_path).unwrap_or(&program.template_path);
        let flattened: String = relative
            .to_string_lossy()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.tmp_dir.join(format!("{}.ts", flattened.trim_start_matches('_')))
    }

    fn check(&self, program: &SyntheticProgram) -> Result<Vec<EngineDiagnostic>> {
        let program_file = self.program_file(program);
        atomic_write(&program_file, program.source.as_bytes())
            .with_context(|| format!("Failed to write generated program for {}", program.template_path.display()))?;
        let config = self.write_config(&program_file)?;

        debug!(
            target: "engine",
            "Executing command: {} --noEmit --pretty false -p {}",
            self.executable.display(),
            config.display()
        );
        let output = Command::new(&self.executable)
            .args(["--noEmit", "--pretty", "false", "-p"])
            .arg(&config)
            .current_dir(&self.project_path)
            .output()
            .with_context(|| format!("Failed to execute {}", self.executable.display()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(target: "engine", "tsc stdout:\n{stdout}");

        let diagnostics = parse_output(&stdout, &self.project_path);
        if !output.status.success() && diagnostics.is_empty() {
            let combined = format!("{}{}", stdout.trim(), stderr.trim());
            return Err(PugcheckError::EngineFailed {
                code: output.status.code(),
                output: combined,
            }
            .into());
        }
        Ok(diagnostics)
    }
}

/// Parse `file(line,col): error TSxxxx: message` lines. Indented lines
/// continue the previous message. Relative paths resolve against `base`.
pub fn parse_output(output: &str, base: &Path) -> Vec<EngineDiagnostic> {
    let Ok(pattern) = Regex::new(r"^(.+?)\((\d+),(\d+)\): (error|warning) TS(\d+): (.*)$") else {
        return Vec::new();
    };

    let mut diagnostics: Vec<EngineDiagnostic> = Vec::new();
    for line in output.lines() {
        if let Some(caps) = pattern.captures(line) {
            let file = PathBuf::from(&caps[1]);
            let file = if file.is_absolute() {
                normalize_path(&file)
            } else {
                normalize_path(&base.join(file))
            };
            diagnostics.push(EngineDiagnostic {
                file,
                line: caps[2].parse().unwrap_or(0),
                column: caps[3].parse().unwrap_or(0),
                code: caps[5].parse().ok(),
                severity: if &caps[4] == "warning" {
                    Severity::Warning
                } else {
                    Severity::Error
                },
                message: caps[6].to_string(),
            });
        } else if line.starts_with(' ')
            && let Some(last) = diagnostics.last_mut()
        {
            last.message.push('\n');
            last.message.push_str(line.trim_end());
        }
    }
    diagnostics
}
