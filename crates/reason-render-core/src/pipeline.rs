//! Document transformation pipeline.
//!
//! ```text
//! Node tree
//!     │
//!     ▼ locate_snippets
//! [SnippetRef] ──┬── annotations::parse ──► build_config
//!                ├── resolve_prelude
//!                ├── resolve_embed_style
//!                ▼
//!          SnippetCompiler (workspace → compiler → bundler)
//!                │
//!                ▼ EmbedTemplate::render
//!          html node inserted before the snippet
//! ```
//!
//! Snippets are processed one at a time in document order. The first
//! failure aborts the whole run.

use std::path::Path;
use std::time::Instant;

use crate::annotations;
use crate::compile::{
    BuildConfig, Bundler, CommandCompiler, Compiler, SnippetCompiler, WebpackBundler, build_config,
};
use crate::config::PipelineConfig;
use crate::document::{InsertionTracker, Node, locate_snippets};
use crate::embed::{TemplateRegistry, resolve_embed_style, resolve_prelude};
use crate::error::Result;

/// Turns target-language code blocks into embedded, runnable scripts.
pub struct Pipeline<C = CommandCompiler, B = WebpackBundler> {
    language: String,
    base_config: BuildConfig,
    styles: TemplateRegistry,
    preludes: TemplateRegistry,
    compiler: SnippetCompiler<C, B>,
}

impl Pipeline {
    /// Pipeline running the configured compiler and webpack.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::with_services(config, config.command_compiler(), config.webpack_bundler())
    }
}

impl<C: Compiler, B: Bundler> Pipeline<C, B> {
    /// Pipeline with explicit compiler and bundler implementations.
    pub fn with_services(config: &PipelineConfig, compiler: C, bundler: B) -> Self {
        Self {
            language: config.language.clone(),
            base_config: config.build.clone(),
            styles: config.style_registry(),
            preludes: config.prelude_registry(),
            compiler: SnippetCompiler::new(compiler, bundler, &config.workspace_root)
                .with_timeouts(config.timeouts()),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn workspace_root(&self) -> &Path {
        self.compiler.workspace_root()
    }

    /// Transform a document tree.
    ///
    /// Every non-empty code block tagged with the pipeline language gets an
    /// `html` sibling inserted directly before it holding the rendered
    /// script. The code blocks themselves are kept. The tree is consumed so
    /// that a failed run leaves no half-transformed document behind.
    pub async fn run(&self, mut document: Node) -> Result<Node> {
        let snippets = locate_snippets(&document, &self.language);
        if snippets.is_empty() {
            tracing::debug!("No `{}` code blocks found", self.language);
            return Ok(document);
        }

        tracing::info!("Rendering {} `{}` snippet(s)", snippets.len(), self.language);
        let start = Instant::now();

        let mut tracker = InsertionTracker::new();
        for snippet in &snippets {
            let html = self.render_snippet(snippet.trimmed()).await?;
            tracker.insert_before(&mut document, snippet, Node::html(html))?;
        }

        tracing::info!(
            "Rendered {} snippet(s) in {:.2}s",
            snippets.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(document)
    }

    /// Compile one snippet and wrap it in its embed style.
    ///
    /// Style and prelude are resolved before anything is compiled, so a
    /// misnamed template fails fast.
    pub async fn render_snippet(&self, source: &str) -> Result<String> {
        let annotations = annotations::parse(source);
        let config = build_config(&self.base_config, &annotations);
        let prelude = resolve_prelude(&annotations, &self.preludes).await?;
        let style = resolve_embed_style(&annotations, &self.styles).await?;

        let compiled = self.compiler.compile(source, &config, &prelude).await?;
        tracing::info!(
            "Compiled snippet in {} ({}ms, style {})",
            compiled.workspace_id,
            compiled.compile_time_ms,
            style.name
        );

        Ok(style.render(&compiled.artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::BundleStats;
    use crate::error::Error;
    use crate::workspace::Workspace;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct NoopCompiler;

    impl Compiler for NoopCompiler {
        async fn compile(&self, _workspace: &Workspace) -> Result<()> {
            Ok(())
        }
    }

    /// Emits the snippet source as the artifact.
    struct SourceBundler;

    impl Bundler for SourceBundler {
        async fn bundle(&self, workspace: &Workspace, _entry: &Path, output: &Path) -> Result<BundleStats> {
            let source = workspace.read_to_string("Snippet.re").await?;
            tokio::fs::write(output, format!("run({})", source.len()))
                .await
                .map_err(|e| Error::fs(output, e))?;
            Ok(BundleStats::default())
        }
    }

    fn pipeline(root: &Path) -> Pipeline<NoopCompiler, SourceBundler> {
        let config = PipelineConfig::for_project(root);
        Pipeline::with_services(&config, NoopCompiler, SourceBundler)
    }

    #[tokio::test]
    async fn test_document_without_snippets_is_unchanged() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let document = Node::root(vec![Node::code("js", "let x = 1;"), Node::text("hi")]);

        let output = pipeline(temp.path()).run(document.clone()).await.expect("run");
        assert_eq!(output, document);
        assert!(!temp.path().join(".reason-render").exists());
    }

    #[tokio::test]
    async fn test_render_snippet_wraps_artifact() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let html = pipeline(temp.path())
            .render_snippet("let x = 1;")
            .await
            .expect("render");

        assert!(html.starts_with("<script"));
        assert!(html.contains("run(10)"));
        assert!(!html.contains("%SNIPPET%"));
    }

    #[tokio::test]
    async fn test_unknown_prelude_fails_before_compiling() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let pipeline = pipeline(temp.path());

        let err = pipeline
            .render_snippet("/**\n * @prelude missing\n */")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "could not use prelude missing: prelude not defined"
        );
        assert!(!pipeline.workspace_root().exists());
    }

    #[test]
    fn test_from_config_uses_configured_language() {
        let config = PipelineConfig {
            language: "re".to_string(),
            workspace_root: PathBuf::from("/tmp/ws"),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.language(), "re");
        assert_eq!(pipeline.workspace_root(), Path::new("/tmp/ws"));
    }
}
