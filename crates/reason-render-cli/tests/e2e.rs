//! End-to-end tests for reason-render CLI commands.
//!
//! None of these need bsb or webpack on PATH: they cover documents without
//! snippets and failures that happen before anything is compiled.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// A temporary project directory holding one input file.
struct TestProject {
    temp_dir: TempDir,
    input_path: PathBuf,
}

impl TestProject {
    fn new(filename: &str, contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_path = temp_dir.path().join(filename);
        fs::write(&input_path, contents).expect("Failed to write input");

        Self {
            temp_dir,
            input_path,
        }
    }

    fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn input(&self) -> &PathBuf {
        &self.input_path
    }
}

fn reason_render() -> Command {
    Command::cargo_bin("reason-render").expect("Failed to find binary")
}

fn document(children: Value) -> String {
    json!({ "type": "root", "children": children }).to_string()
}

fn snippet_document(source: &str) -> String {
    document(json!([
        { "type": "paragraph", "children": [{ "type": "text", "value": "Demo" }] },
        { "type": "code", "lang": "reason", "value": source }
    ]))
}

// =============================================================================
// Annotations
// =============================================================================

#[test]
fn test_annotations_prints_directives() {
    let project = TestProject::new(
        "Snippet.re",
        "/**\n * @dependency bs-css\n * @style inline-script\n * @interactive\n */\nlet x = 1;\n",
    );

    let output = reason_render()
        .arg("annotations")
        .arg(project.input())
        .output()
        .expect("Failed to run");

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).expect("JSON output");
    assert_eq!(
        parsed,
        json!({
            "dependency": ["bs-css"],
            "interactive": [true],
            "style": ["inline-script"]
        })
    );
}

#[test]
fn test_annotations_from_stdin() {
    reason_render()
        .args(["annotations", "-"])
        .write_stdin("/**\n * @prelude none\n */\nlet x = 1;")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"prelude\""))
        .stdout(predicate::str::contains("\"none\""));
}

#[test]
fn test_annotations_missing_file() {
    reason_render()
        .args(["annotations", "does-not-exist.re"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
}

// =============================================================================
// Transform
// =============================================================================

#[test]
fn test_transform_without_snippets_is_unchanged() {
    let input = document(json!([
        { "type": "heading", "depth": 1, "children": [{ "type": "text", "value": "Title" }] },
        { "type": "code", "lang": "js", "value": "console.log(1);" },
        { "type": "code", "lang": "reason", "value": "   \n" }
    ]));
    let project = TestProject::new("doc.json", &input);

    let output = reason_render()
        .current_dir(project.dir())
        .arg("transform")
        .arg(project.input())
        .output()
        .expect("Failed to run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let transformed: Value = serde_json::from_slice(&output.stdout).expect("JSON output");
    let original: Value = serde_json::from_str(&input).unwrap();
    assert_eq!(transformed, original);
    assert!(!project.dir().join(".reason-render").exists());
}

#[test]
fn test_transform_reads_stdin_and_writes_output_file() {
    let project = TestProject::new("unused.txt", "");
    let out_path = project.dir().join("out.json");
    let input = document(json!([{ "type": "text", "value": "plain" }]));

    reason_render()
        .current_dir(project.dir())
        .args(["transform", "-", "-o"])
        .arg(&out_path)
        .write_stdin(input.clone())
        .assert()
        .success();

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&out_path).expect("output written")).unwrap();
    assert_eq!(written, serde_json::from_str::<Value>(&input).unwrap());
}

#[test]
fn test_transform_unknown_style_fails() {
    let project = TestProject::new(
        "doc.json",
        &snippet_document("/**\n * @style missing-style\n */\nlet x = 1;"),
    );

    reason_render()
        .current_dir(project.dir())
        .arg("transform")
        .arg(project.input())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not use style missing-style"))
        .stderr(predicate::str::contains("hint:"));

    let workspaces = project.dir().join(".reason-render").join("workspaces");
    assert!(!workspaces.exists() || fs::read_dir(&workspaces).unwrap().count() == 0);
}

#[test]
fn test_transform_uses_options_file() {
    let project = TestProject::new(
        "doc.json",
        &document(json!([
            { "type": "code", "lang": "re", "value": "/**\n * @prelude custom\n */\nlet x = 1;" }
        ])),
    );
    fs::write(project.dir().join("options.json"), r#"{ "language": "re" }"#).unwrap();

    reason_render()
        .arg("transform")
        .arg(project.input())
        .arg("--config")
        .arg(project.dir().join("options.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not use prelude custom: prelude not defined"));
}

#[test]
fn test_transform_invalid_options_file() {
    let project = TestProject::new("doc.json", &document(json!([])));
    fs::write(project.dir().join("options.json"), "{ not json").unwrap();

    reason_render()
        .arg("transform")
        .arg(project.input())
        .arg("--config")
        .arg(project.dir().join("options.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn test_transform_invalid_document() {
    let project = TestProject::new("doc.json", "[1, 2, 3]");

    reason_render()
        .current_dir(project.dir())
        .arg("transform")
        .arg(project.input())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid document tree"));
}
