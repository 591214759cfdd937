//! reason-render CLI - Compile Reason snippets in documents into embedded scripts.

mod annotations;
mod colors;
mod transform;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reason-render")]
#[command(about = "Compile Reason snippets in documents into embedded scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a JSON document tree, inserting rendered snippets
    Transform {
        /// Path to the document tree (`-` for stdin)
        input: String,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Pipeline options file (JSON)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Print the docblock annotations of a snippet as JSON
    Annotations {
        /// Path to the snippet source (`-` for stdin)
        snippet: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for documents
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format reason-render-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<reason_render_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Transform {
            input,
            output,
            config,
        } => {
            transform::execute(&input, output.as_deref(), config.as_deref())
                .await
                .map_err(format_error)?;
        }

        Commands::Annotations { snippet } => {
            annotations::execute(&snippet).map_err(format_error)?;
        }
    }

    Ok(())
}
