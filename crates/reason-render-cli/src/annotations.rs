//! Annotations command implementation.
//!
//! Shows what the pipeline reads from a snippet's docblocks.

use reason_render_core::annotations;

use crate::transform::read_input;

/// Execute the annotations command.
pub fn execute(snippet_path: &str) -> anyhow::Result<()> {
    let source = read_input(snippet_path)?;
    let parsed = annotations::parse(&source);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
