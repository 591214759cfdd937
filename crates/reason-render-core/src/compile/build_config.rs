//! BuckleScript project configuration.
//!
//! Every snippet gets its own copy of the base configuration, extended with
//! the dependencies it declares through `@dependency` directives.

use serde::{Deserialize, Serialize};

use crate::annotations::Annotations;
use crate::error::Result;

/// Directive naming an extra `bs-dependencies` entry.
pub const DEPENDENCY_DIRECTIVE: &str = "dependency";

/// Reason syntax options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonOptions {
    /// JSX transform version.
    #[serde(rename = "react-jsx")]
    pub react_jsx: u8,
}

/// A source directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDir {
    pub dir: String,
    pub subdirs: bool,
}

/// Output module format entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Module system (`es6`, `commonjs`).
    pub module: String,

    /// Emit output next to the sources.
    #[serde(rename = "in-source")]
    pub in_source: bool,
}

/// Contents of the `bsconfig.json` written into each workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project name.
    pub name: String,

    /// Language feature flags.
    pub reason: ReasonOptions,

    /// Extra compiler flags.
    #[serde(rename = "bsc-flags")]
    pub bsc_flags: Vec<String>,

    /// Source roots.
    pub sources: Vec<SourceDir>,

    /// Output module formats.
    #[serde(rename = "package-specs")]
    pub package_specs: Vec<PackageSpec>,

    /// Suffix of generated JavaScript files.
    pub suffix: String,

    /// Namespace generated modules.
    pub namespace: bool,

    /// Packages the snippet may use.
    #[serde(rename = "bs-dependencies")]
    pub dependencies: Vec<String>,

    /// Preprocessor executables.
    #[serde(rename = "ppx-flags")]
    pub ppx_flags: Vec<String>,

    /// Syntax version.
    pub refmt: u8,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            name: "tmp".to_string(),
            reason: ReasonOptions { react_jsx: 3 },
            bsc_flags: vec!["-bs-super-errors".to_string()],
            sources: vec![SourceDir {
                dir: ".".to_string(),
                subdirs: false,
            }],
            package_specs: vec![PackageSpec {
                module: "es6".to_string(),
                in_source: true,
            }],
            suffix: ".bs.js".to_string(),
            namespace: true,
            dependencies: vec!["reason-react".to_string()],
            ppx_flags: Vec::new(),
            refmt: 3,
        }
    }
}

impl BuildConfig {
    /// Serialize as the pretty-printed `bsconfig.json` document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Derive the configuration for one snippet.
///
/// `base` is left untouched; `@dependency` values are appended in the order
/// they were written. No other directive affects the build.
pub fn build_config(base: &BuildConfig, annotations: &Annotations) -> BuildConfig {
    let mut config = base.clone();
    config.dependencies.extend(
        annotations
            .texts(DEPENDENCY_DIRECTIVE)
            .map(str::to_string),
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{self, DirectiveValue};

    #[test]
    fn test_no_annotations_yields_equal_copy() {
        let base = BuildConfig::default();
        let mut derived = build_config(&base, &Annotations::new());
        assert_eq!(derived, base);

        derived.dependencies.push("bs-css".to_string());
        assert_eq!(base.dependencies, vec!["reason-react"]);
    }

    #[test]
    fn test_dependencies_are_appended_in_order() {
        let base = BuildConfig::default();
        let annotations = annotations::parse("/**\n * @dependency x\n * @dependency y\n */");

        let derived = build_config(&base, &annotations);
        assert_eq!(derived.dependencies, vec!["reason-react", "x", "y"]);
        assert_eq!(base.dependencies, vec!["reason-react"]);
    }

    #[test]
    fn test_dependency_flag_is_ignored() {
        let mut annotations = Annotations::new();
        annotations.push(DEPENDENCY_DIRECTIVE, DirectiveValue::Flag);

        let derived = build_config(&BuildConfig::default(), &annotations);
        assert_eq!(derived.dependencies, vec!["reason-react"]);
    }

    #[test]
    fn test_other_directives_do_not_change_config() {
        let annotations = annotations::parse("/**\n * @style inline-script\n * @prelude none\n */");
        assert_eq!(
            build_config(&BuildConfig::default(), &annotations),
            BuildConfig::default()
        );
    }

    #[test]
    fn test_json_uses_bsconfig_keys() {
        let json: serde_json::Value =
            serde_json::from_str(&BuildConfig::default().to_json().unwrap()).unwrap();

        assert_eq!(json["name"], "tmp");
        assert_eq!(json["reason"]["react-jsx"], 3);
        assert_eq!(json["bsc-flags"][0], "-bs-super-errors");
        assert_eq!(json["sources"][0]["subdirs"], false);
        assert_eq!(json["package-specs"][0]["module"], "es6");
        assert_eq!(json["package-specs"][0]["in-source"], true);
        assert_eq!(json["suffix"], ".bs.js");
        assert_eq!(json["namespace"], true);
        assert_eq!(json["bs-dependencies"][0], "reason-react");
        assert!(json["ppx-flags"].as_array().unwrap().is_empty());
        assert_eq!(json["refmt"], 3);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: BuildConfig =
            serde_json::from_str(r#"{ "bs-dependencies": ["reason-react", "bs-fetch"] }"#).unwrap();
        assert_eq!(config.dependencies, vec!["reason-react", "bs-fetch"]);
        assert_eq!(config.suffix, ".bs.js");
    }
}
