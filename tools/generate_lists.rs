/// Generate Lists — writes one counterbalanced trial-structure file per
/// participant.
///
/// Usage: generate_lists [--config <experiment.ron>] [--seed <n>] [--participants <n>]
///                       [--blocks <n>] [--output-dir <dir>] [--stimuli-dir <dir>] [-v]
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stimulus_lists::config::ExperimentConfig;
use stimulus_lists::core::loader::StimulusSources;
use stimulus_lists::core::pipeline::StimulusGeneratorBuilder;

#[derive(Parser)]
#[command(name = "generate_lists")]
#[command(version)]
#[command(about = "Generate counterbalanced stimulus lists for each participant")]
struct Cli {
    /// Experiment config (RON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of participants
    #[arg(long)]
    participants: Option<usize>,

    /// Number of presentation blocks
    #[arg(long)]
    blocks: Option<usize>,

    /// Directory for participant files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory holding the standard stimulus tables
    /// (animate_nouns.csv, inanimate_nouns.csv, adjectives.csv, critical_verbs.csv)
    #[arg(long, conflicts_with = "config")]
    stimuli_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::load_from_ron(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(n) = cli.participants {
        config.num_participants = n;
    }
    if let Some(n) = cli.blocks {
        config.num_blocks = n;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(dir) = cli.stimuli_dir {
        config.stimuli = StimulusSources::in_dir(&dir);
    }

    let mut generator = StimulusGeneratorBuilder::from_config(&config)?
        .build()
        .context("preparing stimulus generator")?;
    let report = generator.run().context("generating participant lists")?;

    let mut frames: Vec<_> = report.participants_per_frame.iter().collect();
    frames.sort();
    for (label, count) in frames {
        info!(frame = %label, participants = count, "frame assignment");
    }
    println!(
        "Wrote {} participant files ({} trials each) to '{}'",
        report.files.len(),
        report.trials_per_participant,
        config.output_dir.display()
    );
    Ok(())
}
