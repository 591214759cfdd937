//! Snippet compiler.
//!
//! Drives one compile-and-bundle cycle in a fresh workspace and returns the
//! bundled script.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::workspace::Workspace;

use super::build_config::BuildConfig;
use super::bundler::Bundler;
use super::toolchain::Compiler;

/// Build configuration written for the compiler.
pub const CONFIG_FILE: &str = "bsconfig.json";

/// Snippet source file.
pub const SOURCE_FILE: &str = "Snippet.re";

/// Prelude written as the bundler's entry point.
pub const ENTRY_FILE: &str = "embed.js";

/// Bundler output.
pub const OUTPUT_FILE: &str = "compiled.js";

/// Upper bounds for the external steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub compile: Duration,
    pub bundle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            compile: Duration::from_secs(120),
            bundle: Duration::from_secs(120),
        }
    }
}

/// Result of compiling a snippet.
#[derive(Debug, Clone)]
pub struct CompiledSnippet {
    /// The bundled, self-contained script.
    pub artifact: String,

    /// Non-fatal bundler warnings.
    pub warnings: Vec<String>,

    /// Identifier of the workspace that was used.
    pub workspace_id: String,

    /// Compilation time in milliseconds
    pub compile_time_ms: u64,
}

/// Compiles snippets with an external compiler and bundler.
pub struct SnippetCompiler<C, B> {
    compiler: C,
    bundler: B,
    workspace_root: PathBuf,
    timeouts: Timeouts,
}

impl<C: Compiler, B: Bundler> SnippetCompiler<C, B> {
    /// Create a snippet compiler placing workspaces under `workspace_root`.
    pub fn new(compiler: C, bundler: B, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            bundler,
            workspace_root: workspace_root.into(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Compile `source` with `config`, bundling through `prelude`.
    ///
    /// The workspace is released on success and failure alike. A failed
    /// release is logged and never replaces the compilation result.
    pub async fn compile(&self, source: &str, config: &BuildConfig, prelude: &str) -> Result<CompiledSnippet> {
        let start = Instant::now();
        let workspace = Workspace::acquire_unique(&self.workspace_root).await?;
        let workspace_id = workspace.id().to_string();

        let result = self.compile_in(&workspace, source, config, prelude).await;

        if let Err(e) = workspace.release().await {
            tracing::warn!("Failed to clean up workspace {}: {}", workspace_id, e);
        }

        let (artifact, warnings) = result?;
        let compile_time_ms = start.elapsed().as_millis() as u64;

        Ok(CompiledSnippet {
            artifact,
            warnings,
            workspace_id,
            compile_time_ms,
        })
    }

    async fn compile_in(
        &self,
        workspace: &Workspace,
        source: &str,
        config: &BuildConfig,
        prelude: &str,
    ) -> Result<(String, Vec<String>)> {
        workspace.write(CONFIG_FILE, config.to_json()?).await?;
        workspace.write(SOURCE_FILE, source).await?;

        within("compiler", self.timeouts.compile, self.compiler.compile(workspace)).await?;

        let entry = workspace.write(ENTRY_FILE, prelude).await?;
        let output = workspace.resolve(OUTPUT_FILE)?;

        let stats = within(
            "bundler",
            self.timeouts.bundle,
            self.bundler.bundle(workspace, &entry, &output),
        )
        .await?;

        if stats.has_errors() {
            for message in stats.error_messages() {
                tracing::error!("Bundler error: {}", message);
            }
            return Err(Error::Bundle {
                diagnostics: stats.errors_json(),
            });
        }

        let warnings = stats.warning_messages();
        for warning in &warnings {
            tracing::warn!("Bundler warning: {}", warning);
        }

        let artifact = workspace.read_to_string(OUTPUT_FILE).await?;
        Ok((artifact, warnings))
    }
}

/// Await `step`, failing with [`Error::CompileTimeout`] once `limit` passes.
async fn within<T>(stage: &str, limit: Duration, step: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, step)
        .await
        .map_err(|_| Error::CompileTimeout {
            stage: stage.to_string(),
            timeout: limit,
        })?
}
