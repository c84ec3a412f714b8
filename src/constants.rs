//! Global constants used throughout the pugcheck codebase.
//!
//! Directive syntax, default file locations, and the markers written into
//! generated programs live here so every module agrees on them.

/// Prefix of contract directive comments (`//@ import ...`, `//@ expect ...`).
pub const DIRECTIVE_MARKER: &str = "//@";

/// Extension of Pug templates, appended to extension-less references.
pub const TEMPLATE_EXTENSION: &str = "pug";

/// Shape used when a template has no `expect` directive.
pub const EMPTY_SHAPE: &str = "{}";

/// Origin recorded for generated lines that come from the contract rather
/// than from a template line (imports).
pub const CONTRACT_ORIGIN: &str = "contract";

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pugcheck.toml";

/// Default directory for generated programs and the engine's tsconfig.
pub const DEFAULT_TMP_DIR: &str = ".tmp";

/// Default location of the persisted parse-result cache.
pub const DEFAULT_CACHE_FILE: &str = ".tmp/pug.parseResults.json";

/// Default directory holding templates.
pub const DEFAULT_VIEWS_ROOT: &str = "./src/views";

/// Default shared-locals declaration file.
pub const DEFAULT_SHARED_LOCALS_PATH: &str = "./src/types/viewSharedLocals.d.ts";

/// Default shared-locals type name.
pub const DEFAULT_SHARED_LOCALS_TYPE: &str = "SharedLocals";

/// Name of the generated entry point in every synthetic program.
pub const RENDER_FUNCTION: &str = "render";

/// Version of the persisted cache document layout.
pub const CACHE_FORMAT_VERSION: u32 = 2;
