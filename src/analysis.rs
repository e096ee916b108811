// Aggregation of per-fold relative likelihoods
//
// Scores are relative log-likelihoods (per logical site). Missing runs read as
// NaN and propagate into the means, so an incomplete dataset is visible in
// the tables instead of silently averaging fewer folds.

use crate::cv::{SamplePaths, Split};
use crate::cv_opt::CvOpt;
use crate::inference::{result_prefix, Model};
use crate::results::relative_llh;
use std::path::Path;

/// Train/test relative log-likelihood of one model on one fold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelScore {
    pub train: f64,
    pub test: f64,
}

impl ModelScore {
    /// Relative generalisation gap: (train - test) / train
    pub fn difference(&self) -> f64 {
        (self.train - self.test) / self.train
    }
}

/// Scores of all models on one fold, indexed in [`Model::ALL`] order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldScores {
    pub scores: [ModelScore; 4],
}

impl FoldScores {
    pub fn get(&self, model: Model) -> ModelScore {
        self.scores[model_index(model)]
    }

    /// Flattened as train_BIN, test_BIN, train_COG, test_COG, ...
    pub fn flatten(&self) -> [f64; 8] {
        let mut out = [f64::NAN; 8];
        for (m, s) in self.scores.iter().enumerate() {
            out[m * 2] = s.train;
            out[m * 2 + 1] = s.test;
        }
        out
    }
}

/// Column headers matching [`FoldScores::flatten`]
pub fn score_labels() -> Vec<String> {
    Model::ALL
        .iter()
        .flat_map(|m| Split::ALL.iter().map(move |s| format!("{}_{}", s, m)))
        .collect()
}

/// Column headers matching [`mean_differences`]
pub fn difference_labels() -> Vec<String> {
    Model::ALL.iter().map(|m| format!("diff_{}", m)).collect()
}

fn model_index(model: Model) -> usize {
    match model {
        Model::Bin => 0,
        Model::Cog => 1,
        Model::Gtr => 2,
        Model::Mk => 3,
    }
}

/// Per-dataset aggregate shown in the result tables
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub name: String,
    pub means: [f64; 8],
    pub differences: [f64; 4],
}

impl DatasetSummary {
    pub fn from_folds(name: impl Into<String>, folds: &[FoldScores]) -> Self {
        DatasetSummary {
            name: name.into(),
            means: mean_scores(folds),
            differences: mean_differences(folds),
        }
    }
}

/// Read relative log-likelihoods of every fold and model for one dataset
pub fn collect_scores(msa_dir: &Path, target_dir: &Path, opt: &CvOpt) -> Vec<FoldScores> {
    let paths = SamplePaths::new(msa_dir, opt);
    (0..opt.num_samples)
        .map(|t| {
            let mut scores = [ModelScore {
                train: f64::NAN,
                test: f64::NAN,
            }; 4];
            for model in Model::ALL {
                let msa_type = model.msa_type(opt);
                let score = |split: Split| {
                    relative_llh(
                        &paths.sample(&msa_type, split, t),
                        &result_prefix(target_dir, &msa_type, split, t, model),
                        opt.kappa,
                        model,
                    )
                };
                scores[model_index(model)] = ModelScore {
                    train: score(Split::Train),
                    test: score(Split::Test),
                };
            }
            FoldScores { scores }
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Mean over folds of each flattened score column
pub fn mean_scores(folds: &[FoldScores]) -> [f64; 8] {
    let mut out = [f64::NAN; 8];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = mean(folds.iter().map(|f| f.flatten()[i]));
    }
    out
}

/// Mean over folds of each model's relative train/test gap
pub fn mean_differences(folds: &[FoldScores]) -> [f64; 4] {
    let mut out = [f64::NAN; 4];
    for (m, slot) in out.iter_mut().enumerate() {
        *slot = mean(folds.iter().map(|f| f.scores[m].difference()));
    }
    out
}
