//! `diarisk train`: fit the candidates and persist the selected bundle.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;

use diarisk_classifiers::config::{load_training_config, ImputationScope, TrainingConfig};
use diarisk_classifiers::io::{read_dataset_csv, sample_dataset};
use diarisk_classifiers::report::training_report;
use diarisk_classifiers::trainer::{run_training, TrainingOutcome};
use diarisk_classifiers::BundleStore;

use crate::util::{validate_csv_file, write_bytes_to_file};

pub const REPORT_FILE: &str = "training_report.html";
pub const CONFIG_FILE: &str = "training_config.json";

/// Load the JSON config (or defaults) and apply command-line overrides.
pub fn config_from_arguments(matches: &ArgMatches) -> Result<TrainingConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[diarisk::train] Using config: {:?}", path);
            load_training_config(path)?
        }
        None => {
            log::info!("[diarisk::train] No config provided; using defaults.");
            TrainingConfig::default()
        }
    };

    if let Some(data) = matches.get_one::<PathBuf>("data") {
        config.data = Some(data.clone());
    }
    if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = output_dir.clone();
    }
    if let Some(scope) = matches.get_one::<String>("imputation") {
        config.imputation = parse_imputation_scope(scope)?;
    }
    if let Some(folds) = matches.get_one::<usize>("cv_folds") {
        config.cv_folds = Some(*folds);
    }
    if matches.get_flag("no_report") {
        config.write_report = false;
    }
    Ok(config)
}

pub fn parse_imputation_scope(s: &str) -> Result<ImputationScope> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "full_dataset" | "full" => Ok(ImputationScope::FullDataset),
        "training_partition" | "train" => Ok(ImputationScope::TrainingPartition),
        other => anyhow::bail!(
            "Unknown imputation scope: {}. Valid options are: full_dataset, training_partition",
            other
        ),
    }
}

/// Train, save the bundle and (optionally) the HTML report into
/// `config.output_dir`. The effective config is saved alongside.
pub fn run_train(config: &TrainingConfig) -> Result<TrainingOutcome> {
    let dataset = match &config.data {
        Some(path) => {
            validate_csv_file(path)?;
            read_dataset_csv(path)?
        }
        None => {
            log::info!("[diarisk::train] No dataset given; training on the embedded sample.");
            sample_dataset()?
        }
    };

    let outcome = run_training(&dataset, config).context("Training failed")?;

    let out_dir: &Path = &config.output_dir;
    let store = BundleStore::new(out_dir);
    if store.exists() {
        log::warn!(
            "[diarisk::train] Replacing the model bundle in {}",
            store.dir().display()
        );
    }
    store
        .save(&outcome.bundle)
        .with_context(|| format!("Failed to save model to {}", out_dir.display()))?;

    let bytes = serde_json::to_vec_pretty(config)?;
    write_bytes_to_file(out_dir.join(CONFIG_FILE), &bytes)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    if config.write_report {
        training_report(&outcome).save_to_file(out_dir.join(REPORT_FILE))?;
    }
    Ok(outcome)
}

/// Human-readable summary of a finished training run.
pub fn format_summary(outcome: &TrainingOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<22}{:>10}{:>11}{:>9}{:>8}{:>8}\n",
        "Model", "Accuracy", "Precision", "Recall", "F1", "CV"
    ));
    for (i, c) in outcome.candidates.iter().enumerate() {
        let e = &c.evaluation;
        let marker = if i == outcome.selected {
            "*"
        } else if !c.eligible {
            "-"
        } else {
            " "
        };
        out.push_str(&format!(
            "{}{:<21}{:>10.4}{:>11.4}{:>9.4}{:>8.4}{:>8.4}\n",
            marker,
            c.name(),
            e.accuracy,
            e.precision,
            e.recall,
            e.f1_score,
            e.cv_score
        ));
    }
    out.push_str(&format!(
        "Selected {} (bundle {})\n",
        outcome.bundle.metrics.model_name, outcome.bundle.bundle_id
    ));
    out
}
