//! Random CAD assembly generator.
//!
//! Writes a widget document (`{channels, tree, state}`) for the viewer, or
//! only its state table with `--state-only`.

use anyhow::Result;
use cadtree::{AssemblyGenerator, StateWriter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cadtree-gen", about = "CAD assembly tree generator")]
struct Args {
    /// Maximum nesting depth of groups
    #[arg(long, default_value_t = 4)]
    depth: usize,

    /// Maximum number of children per group
    #[arg(long, default_value_t = 6)]
    children: usize,

    /// Channel names, comma separated
    #[arg(long, value_delimiter = ',', default_value = "shape,mesh")]
    channels: Vec<String>,

    /// Probability that a non-first channel of a part is inapplicable
    #[arg(long, default_value_t = 0.2)]
    empty_ratio: f64,

    /// Probability that a channel starts unselected
    #[arg(long, default_value_t = 0.1)]
    hidden_ratio: f64,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Only write the state table
    #[arg(long)]
    state_only: bool,

    /// Output file (`.br` enables Brotli compression)
    #[arg(short, long, default_value = "assembly.json")]
    out: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let doc = AssemblyGenerator::with_config(args.depth, args.children, args.seed)
        .channels(args.channels)
        .empty_ratio(args.empty_ratio)
        .hidden_ratio(args.hidden_ratio)
        .generate();

    let mut writer = StateWriter::new(&args.out)?;
    if args.state_only {
        writer.write_table(&doc.state)?;
    } else {
        writer.write_document(&doc)?;
    }

    tracing::info!(
        out = %args.out,
        leaves = doc.state.len(),
        channels = doc.channel_count(),
        "assembly written"
    );
    Ok(())
}
