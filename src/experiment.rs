// Batch driver for the cross-validation experiment
//
// Datasets are visited in sorted name order so a single seed reproduces the
// whole batch. A dataset that fails a precondition is logged and skipped;
// storage failures abort the batch.

use crate::analysis::{collect_scores, DatasetSummary};
use crate::cv::{create_samples, SamplePaths};
use crate::cv_opt::CvOpt;
use crate::error::Result;
use crate::inference::{test_models, train_models};
use crate::report::plot_fold_scores;
use crate::runner::ProcessRunner;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

/// Dataset directories under `opt.msa_super_dir`, sorted by name
pub fn list_datasets(opt: &CvOpt) -> Result<Vec<(String, PathBuf)>> {
    let mut datasets = Vec::new();
    for entry in fs::read_dir(&opt.msa_super_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        datasets.push((name, entry.path()));
    }
    datasets.sort();
    Ok(datasets)
}

/// Run the full batch and return one summary per processed dataset
pub fn run_experiment(opt: &CvOpt, runner: &mut dyn ProcessRunner) -> Result<Vec<DatasetSummary>> {
    opt.validate()?;
    let mut rng = StdRng::seed_from_u64(opt.seed);
    let mut summaries = Vec::new();

    let datasets = list_datasets(opt)?;
    log::info!(
        "Cross-validating {} datasets from {} (kappa {}, {} folds, ratio {})",
        datasets.len(),
        opt.msa_super_dir.display(),
        opt.kappa,
        opt.num_samples,
        opt.ratio
    );

    for (ds_name, msa_dir) in datasets {
        let paths = SamplePaths::new(&msa_dir, opt);
        if !paths.has_sources() {
            log::debug!("{}: missing source alignments, skipping", ds_name);
            continue;
        }

        match create_samples(&msa_dir, opt, &mut rng) {
            Ok(_) => {}
            Err(e) if e.is_dataset_local() => {
                log::error!("{} Failed: {}", msa_dir.display(), e);
                continue;
            }
            Err(e) => return Err(e),
        }

        let target_dir = opt.raxmlng_super_dir.join(&ds_name);
        if opt.run_train {
            train_models(&msa_dir, &target_dir, opt, runner)?;
        }
        if opt.run_evaluate {
            test_models(&msa_dir, &target_dir, opt, runner)?;
        }

        let folds = collect_scores(&msa_dir, &target_dir, opt);
        if opt.make_plots {
            match plot_fold_scores(&opt.plots_super_dir, opt.kappa, &ds_name, &folds) {
                Ok(_) => {}
                Err(e) if e.is_dataset_local() => {
                    log::warn!("{}: could not draw chart: {}", ds_name, e)
                }
                Err(e) => return Err(e),
            }
        }
        summaries.push(DatasetSummary::from_folds(ds_name, &folds));
    }

    log::info!("Processed {} datasets", summaries.len());
    Ok(summaries)
}
