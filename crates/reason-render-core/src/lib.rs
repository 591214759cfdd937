//! Core engine for rendering Reason snippets in documents.
//!
//! This crate provides:
//! - Document tree model and snippet location
//! - Docblock annotation parsing
//! - Per-snippet build configuration
//! - Sandboxed compilation workspaces
//! - Compiler and bundler orchestration
//! - Embed style and prelude resolution

pub mod annotations;
pub mod compile;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod pipeline;
pub mod workspace;

pub use annotations::{Annotations, DirectiveValue};
pub use compile::{
    BuildConfig, BundleStats, Bundler, CommandCompiler, CommandSpec, CompiledSnippet, Compiler,
    SnippetCompiler, Timeouts, WebpackBundler,
};
pub use config::PipelineConfig;
pub use document::{InsertionTracker, Node, SnippetRef, locate_snippets};
pub use embed::{EmbedTemplate, TemplateRegistry, TemplateSource};
pub use error::{Error, Result, TemplateKind};
pub use pipeline::Pipeline;
pub use workspace::Workspace;
