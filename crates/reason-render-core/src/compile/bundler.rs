//! Bundling compiled modules into a single embeddable script.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::workspace::Workspace;

use super::toolchain::{CommandSpec, run_command};

/// Name of the generated webpack configuration file.
pub const WEBPACK_CONFIG_FILE: &str = "webpack.config.js";

/// Diagnostics reported by a bundler run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleStats {
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub warnings: Vec<Value>,
}

impl BundleStats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Human readable error messages.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(message).collect()
    }

    /// Human readable warning messages.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(message).collect()
    }

    /// Serialized error payload, as carried by [`Error::Bundle`].
    pub fn errors_json(&self) -> String {
        Value::Array(self.errors.clone()).to_string()
    }
}

/// Webpack 4 reports diagnostics as strings, webpack 5 as objects with a
/// `message` field.
fn message(diagnostic: &Value) -> String {
    match diagnostic {
        Value::String(text) => text.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(text)) => text.clone(),
            _ => diagnostic.to_string(),
        },
        other => other.to_string(),
    }
}

/// Bundles an entry file and everything it imports into one output file.
pub trait Bundler: Send + Sync {
    /// Bundle `entry` into `output`. Both paths lie inside `workspace`.
    ///
    /// Reported errors are returned in the stats rather than as `Err`; `Err`
    /// is reserved for failing to run the bundler at all.
    fn bundle(
        &self,
        workspace: &Workspace,
        entry: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<BundleStats>> + Send;
}

/// Runs the webpack CLI against a configuration generated per invocation.
#[derive(Debug, Clone)]
pub struct WebpackBundler {
    command: CommandSpec,
    externals: BTreeMap<String, String>,
}

impl WebpackBundler {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            externals: default_externals(),
        }
    }

    /// Replace the module → global mapping for libraries the page provides.
    pub fn with_externals(mut self, externals: BTreeMap<String, String>) -> Self {
        self.externals = externals;
        self
    }

    /// The webpack configuration for one bundle.
    pub fn config(&self, entry: &Path, output: &Path) -> Value {
        let output_dir = output.parent().unwrap_or(Path::new("."));
        let filename = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        json!({
            "mode": "development",
            "cache": false,
            "devtool": false,
            "entry": entry.to_string_lossy(),
            "output": {
                "path": output_dir.to_string_lossy(),
                "filename": filename,
            },
            "externals": self.externals,
        })
    }
}

impl Default for WebpackBundler {
    fn default() -> Self {
        Self::new(CommandSpec::webpack())
    }
}

/// Libraries loaded globally by the host page.
pub fn default_externals() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("react".to_string(), "React".to_string()),
        ("react-dom".to_string(), "ReactDOM".to_string()),
    ])
}

impl Bundler for WebpackBundler {
    async fn bundle(&self, workspace: &Workspace, entry: &Path, output: &Path) -> Result<BundleStats> {
        let config = serde_json::to_string_pretty(&self.config(entry, output))?;
        let config_path = workspace
            .write(WEBPACK_CONFIG_FILE, format!("module.exports = {};\n", config))
            .await?;
        let config_arg = config_path.to_string_lossy().into_owned();

        let result = run_command(
            &self.command,
            &["--config", config_arg.as_str(), "--json"],
            workspace.path(),
        )
        .await
        .map_err(|e| Error::Bundle {
            diagnostics: format!("failed to run `{}`: {}", self.command, e),
        })?;

        match serde_json::from_str::<BundleStats>(&result.stdout) {
            Ok(stats) => Ok(stats),
            Err(_) if !result.success => Err(Error::Bundle {
                diagnostics: if result.stderr.trim().is_empty() {
                    result.stdout
                } else {
                    result.stderr
                },
            }),
            Err(e) => {
                tracing::debug!("`{}` printed no stats: {}", self.command, e);
                Ok(BundleStats::default())
            }
        }
    }
}
