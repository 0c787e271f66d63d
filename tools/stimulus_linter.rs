/// Stimulus Linter — validates an experiment config and its stimulus tables.
///
/// Usage: stimulus_linter [--config <experiment.ron>]

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use rustc_hash::FxHashSet;
use tracing_subscriber::EnvFilter;

use stimulus_lists::config::ExperimentConfig;
use stimulus_lists::core::frame::{check_capacity, validate_slot_order};
use stimulus_lists::core::loader::load_pools;
use stimulus_lists::schema::stimulus::{StimulusPools, WordCategory};

#[derive(Parser)]
#[command(name = "stimulus_linter")]
#[command(about = "Check stimulus tables against an experiment config")]
struct Cli {
    /// Experiment config (RON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .init();

    let config = match &cli.config {
        Some(path) => ExperimentConfig::load_from_ron(path)?,
        None => ExperimentConfig::default(),
    };

    let (errors, warnings) = lint(&config);

    println!("\n=== Stimulus Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &warnings {
        println!("WARNING: {}", warning);
    }
    for error in &errors {
        println!("ERROR: {}", error);
    }
    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
    Ok(())
}

fn lint(config: &ExperimentConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let slot_order = match config.slot_order() {
        Ok(order) => order,
        Err(e) => {
            errors.push(e.to_string());
            return (errors, warnings);
        }
    };
    if let Err(e) = validate_slot_order(&slot_order) {
        errors.push(e.to_string());
    }

    if config.num_blocks == 0 {
        errors.push("num_blocks must be at least 1".to_string());
    }
    if config.frame_labels.is_empty() {
        errors.push("no frame labels configured".to_string());
    }
    let unique: FxHashSet<_> = config.frame_labels.iter().collect();
    if unique.len() != config.frame_labels.len() {
        errors.push("frame labels are not unique".to_string());
    }

    let pools = match load_pools(&config.stimuli) {
        Ok(pools) => pools,
        Err(e) => {
            errors.push(e.to_string());
            return (errors, warnings);
        }
    };

    println!("Loaded {} critical verb pairs", pools.critical.len());
    for category in WordCategory::SHUFFLE_ORDER {
        println!("Loaded {} {} words", pools.words(category).len(), category.tag());
    }

    for short in check_capacity(&pools, &slot_order) {
        errors.push(format!(
            "{} pool has {} words but {} trials need {}",
            short.category.tag(),
            short.available,
            pools.critical.len(),
            short.required
        ));
    }

    warnings.extend(duplicate_warnings(&pools));

    let trials = pools.critical.len();
    if trials == 0 {
        warnings.push("critical verb table is empty; participants get no trials".to_string());
    } else if config.num_blocks > trials {
        warnings.push(format!(
            "{} blocks for {} trials leaves some blocks empty",
            config.num_blocks, trials
        ));
    }
    if trials % 2 == 1 {
        warnings.push(format!(
            "{} trials cannot split evenly between intransitive and ditransitive",
            trials
        ));
    }
    if !config.frame_labels.is_empty() && config.num_participants % config.frame_labels.len() != 0
    {
        warnings.push(format!(
            "{} participants cannot split evenly across {} frames",
            config.num_participants,
            config.frame_labels.len()
        ));
    }

    (errors, warnings)
}

fn duplicate_warnings(pools: &StimulusPools) -> Vec<String> {
    let mut warnings = Vec::new();
    for category in WordCategory::SHUFFLE_ORDER {
        let mut seen = FxHashSet::default();
        for word in pools.words(category) {
            if !seen.insert(word.as_str()) {
                warnings.push(format!("{} pool repeats '{}'", category.tag(), word));
            }
        }
    }
    let mut seen = FxHashSet::default();
    for pair in &pools.critical {
        if !seen.insert(pair) {
            warnings.push(format!("critical verb pair {} appears more than once", pair));
        }
    }
    warnings
}
