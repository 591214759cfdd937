//! Pipeline configuration.
//!
//! Options can be loaded from a JSON file; every field is optional:
//!
//! ```json
//! {
//!   "language": "reason",
//!   "workspace_root": ".reason-render/workspaces",
//!   "assets_dir": "templates/builtin",
//!   "styles": { "card": "templates/card.html" },
//!   "preludes": { "counter": "templates/counter.js" },
//!   "compiler": { "program": "bsb", "args": ["-make-world"] },
//!   "bundler": { "program": "npx", "args": ["webpack"] },
//!   "compile_timeout_secs": 300,
//!   "build": { "bs-dependencies": ["reason-react", "bs-css"] }
//! }
//! ```
//!
//! Relative paths in a file are resolved against the file's directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compile::{
    BuildConfig, CommandCompiler, CommandSpec, Timeouts, WebpackBundler, default_externals,
};
use crate::embed::TemplateRegistry;
use crate::error::{Error, Result};

/// Language tag of the code blocks to compile.
pub const DEFAULT_LANGUAGE: &str = "reason";

/// Sandbox root for workspaces, relative to the project directory.
pub const DEFAULT_WORKSPACE_ROOT: &str = ".reason-render/workspaces";

/// Configuration for the snippet pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Code blocks with this language tag are compiled.
    pub language: String,

    /// Directory under which workspaces are created.
    pub workspace_root: PathBuf,

    /// Directory overriding the built-in `embed/` and `prelude/` templates,
    /// which are otherwise read from the binary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,

    /// Extra embed styles (name → template file).
    pub styles: BTreeMap<String, PathBuf>,

    /// Extra preludes (name → template file).
    pub preludes: BTreeMap<String, PathBuf>,

    /// Compiler command, run inside the workspace.
    pub compiler: CommandSpec,

    /// Bundler command, run inside the workspace.
    pub bundler: CommandSpec,

    /// Modules the host page provides as globals.
    pub externals: BTreeMap<String, String>,

    pub compile_timeout_secs: u64,
    pub bundle_timeout_secs: u64,

    /// Base build configuration every snippet derives from.
    pub build: BuildConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            assets_dir: None,
            styles: BTreeMap::new(),
            preludes: BTreeMap::new(),
            compiler: CommandSpec::bsb(),
            bundler: CommandSpec::webpack(),
            externals: default_externals(),
            compile_timeout_secs: timeouts.compile.as_secs(),
            bundle_timeout_secs: timeouts.bundle.as_secs(),
            build: BuildConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration with workspaces inside `project_dir`.
    pub fn for_project(project_dir: &Path) -> Self {
        Self {
            workspace_root: project_dir.join(DEFAULT_WORKSPACE_ROOT),
            ..Self::default()
        }
    }

    /// Load options from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON for
    /// this structure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::fs(path, e))?;
        let mut config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Make relative paths relative to `base` instead of the working directory.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        resolve(&mut self.workspace_root);
        if let Some(dir) = self.assets_dir.as_mut() {
            resolve(dir);
        }
        self.styles.values_mut().for_each(resolve);
        self.preludes.values_mut().for_each(resolve);
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            compile: Duration::from_secs(self.compile_timeout_secs),
            bundle: Duration::from_secs(self.bundle_timeout_secs),
        }
    }

    /// Built-in styles with the configured ones layered on top.
    pub fn style_registry(&self) -> TemplateRegistry {
        layer(self.builtins(TemplateRegistry::builtin_styles()), &self.styles)
    }

    /// Built-in preludes with the configured ones layered on top.
    pub fn prelude_registry(&self) -> TemplateRegistry {
        layer(self.builtins(TemplateRegistry::builtin_preludes()), &self.preludes)
    }

    fn builtins(&self, registry: TemplateRegistry) -> TemplateRegistry {
        match &self.assets_dir {
            Some(dir) => registry.with_assets_dir(dir),
            None => registry,
        }
    }

    pub fn command_compiler(&self) -> CommandCompiler {
        CommandCompiler::new(self.compiler.clone())
    }

    pub fn webpack_bundler(&self) -> WebpackBundler {
        WebpackBundler::new(self.bundler.clone()).with_externals(self.externals.clone())
    }
}

fn layer(mut registry: TemplateRegistry, extra: &BTreeMap<String, PathBuf>) -> TemplateRegistry {
    for (name, path) in extra {
        if registry.insert(name.clone(), path.clone()).is_some() {
            tracing::debug!(
                "Configured {} `{}` overrides the built-in one",
                registry.kind(),
                name
            );
        }
    }
    registry
}
