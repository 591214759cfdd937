//! Error types for reason-render-core.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for reason-render-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which kind of template a resolution error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Wrapper markup hosting the compiled artifact.
    Style,
    /// Bundler entry point mounting the compiled snippet.
    Prelude,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Style => f.write_str("style"),
            Self::Prelude => f.write_str("prelude"),
        }
    }
}

/// Errors that can occur while rendering snippets.
///
/// Every variant is fatal for the document being processed.
#[derive(Debug, Error)]
pub enum Error {
    /// A workspace path normalizes outside of the sandbox root.
    #[error("{} is outside of workspace root {}", path.display(), root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    /// The external compiler could not be spawned or exited unsuccessfully.
    #[error("compilation failed ({command}, {}){}{}",
        status.map(|code| format!("exit code {code}")).unwrap_or_else(|| "no exit code".to_string()),
        section("stdout", stdout),
        section("stderr", stderr))]
    Compile {
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// An external step did not finish in time.
    #[error("{stage} did not finish within {}s", timeout.as_secs())]
    CompileTimeout { stage: String, timeout: Duration },

    /// The bundler reported errors.
    #[error("bundling failed: {diagnostics}")]
    Bundle { diagnostics: String },

    /// The requested style or prelude is not registered.
    #[error("could not use {kind} {name}: {kind} not defined")]
    UnknownTemplate { kind: TemplateKind, name: String },

    /// The registered template file does not exist.
    #[error("could not use {kind} {name}: {} not found", path.display())]
    MissingTemplateFile {
        kind: TemplateKind,
        name: String,
        path: PathBuf,
    },

    /// The template file lacks its required token.
    #[error("could not find {token} in {kind} {name}")]
    MalformedTemplate {
        kind: TemplateKind,
        name: String,
        token: &'static str,
    },

    /// Read, write or delete failure.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A recorded snippet location no longer matches the tree.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Pipeline options could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

fn section(label: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        String::new()
    } else {
        format!("\n{label}:\n{text}")
    }
}

impl Error {
    /// Wrap an I/O error with the path it happened at.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Convenience constructor for unknown styles.
    pub fn unknown_style(name: impl Into<String>) -> Self {
        Self::UnknownTemplate {
            kind: TemplateKind::Style,
            name: name.into(),
        }
    }

    /// A short recovery hint for the user, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PathEscape { .. } => Some("workspace names must not contain `..` segments"),
            Self::Compile { status: None, .. } => {
                Some("check that the compiler is installed and on PATH (default: bsb)")
            }
            Self::CompileTimeout { .. } => {
                Some("raise compile_timeout_secs / bundle_timeout_secs in the options file")
            }
            Self::UnknownTemplate {
                kind: TemplateKind::Style,
                ..
            } => Some("register the style under `styles` in the options file"),
            Self::UnknownTemplate {
                kind: TemplateKind::Prelude,
                ..
            } => Some("register the prelude under `preludes` in the options file"),
            Self::MalformedTemplate { .. } => {
                Some("the template must contain the token named in the message")
            }
            _ => None,
        }
    }

    /// Render the error followed by its hint.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}
