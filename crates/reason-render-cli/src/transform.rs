//! Transform command implementation.
//!
//! Reads an mdast-style JSON tree, renders every Reason snippet in it and
//! writes the transformed tree back out.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use reason_render_core::{Node, Pipeline, PipelineConfig, locate_snippets};

use crate::colors;

/// Execute the transform command.
pub async fn execute(input: &str, output: Option<&str>, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::for_project(&std::env::current_dir()?),
    };

    let text = read_input(input)?;
    let document: Node = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Invalid document tree in {}: {}", input, e))?;

    let count = locate_snippets(&document, &config.language).len();
    eprintln!(
        "{}reason-render{} - {} `{}` snippet(s) in {}",
        colors::BOLD,
        colors::RESET,
        count,
        config.language,
        input
    );

    let start = Instant::now();
    let pipeline = Pipeline::from_config(&config);
    let transformed = pipeline.run(document).await?;

    let json = serde_json::to_string_pretty(&transformed)?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
        }
        None => println!("{}", json),
    }

    eprintln!(
        "  {}✓{} done {}({:.2}s){}",
        colors::GREEN,
        colors::RESET,
        colors::DIM,
        start.elapsed().as_secs_f64(),
        colors::RESET
    );

    Ok(())
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    let file = Path::new(path);
    if !file.exists() {
        anyhow::bail!("Input not found: {}", path);
    }
    Ok(std::fs::read_to_string(file)?)
}
