//! Compilation pipeline for snippets.
//!
//! This module provides:
//! - Build configuration (`bsconfig.json`) derived per snippet
//! - Compiler invocation (`bsb -make-world` by default)
//! - Bundling (webpack by default) into one embeddable script
//! - The snippet compiler tying both together in an isolated workspace
//!
//! # Architecture
//!
//! ```text
//! Snippet.re + bsconfig.json ──► Compiler ──► Snippet.bs.js
//!                                                  │
//!                      prelude (embed.js) ──► Bundler ──► compiled.js ──► artifact
//! ```

mod build_config;
mod bundler;
mod snippet;
mod toolchain;

pub use build_config::{
    BuildConfig, DEPENDENCY_DIRECTIVE, PackageSpec, ReasonOptions, SourceDir, build_config,
};
pub use bundler::{BundleStats, Bundler, WEBPACK_CONFIG_FILE, WebpackBundler, default_externals};
pub use snippet::{
    CONFIG_FILE, CompiledSnippet, ENTRY_FILE, OUTPUT_FILE, SOURCE_FILE, SnippetCompiler, Timeouts,
};
pub use toolchain::{CommandCompiler, CommandSpec, Compiler, ProcessOutput, run_command};
