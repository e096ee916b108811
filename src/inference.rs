// Driving raxml-ng over the cross-validation samples
//
// Train: infer a tree and model on every train alignment.
// Test: re-score every test alignment on the tree and model inferred from
// the matching train alignment, with model and branch optimisation off.

use crate::cv::{SamplePaths, Split};
use crate::cv_opt::CvOpt;
use crate::results::raxml_file;
use crate::runner::{path_arg, run_logged, Invocation, ProcessRunner};
use crate::utils::ensure_parent_dir;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Substitution models compared by the experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    /// Binary model on the expanded encoding
    Bin,
    /// Cognate model on the prototype encoding
    Cog,
    /// Multi-state GTR on the prototype encoding
    Gtr,
    /// Multi-state Mk on the prototype encoding
    Mk,
}

impl Model {
    pub const ALL: [Model; 4] = [Model::Bin, Model::Cog, Model::Gtr, Model::Mk];

    pub fn name(self) -> &'static str {
        match self {
            Model::Bin => "BIN",
            Model::Cog => "COG",
            Model::Gtr => "GTR",
            Model::Mk => "MK",
        }
    }

    /// Whether the model runs on the expanded (binary) encoding
    pub fn uses_binary_msa(self) -> bool {
        self == Model::Bin
    }

    /// Alignment file stem the model is evaluated on
    pub fn msa_type(self, opt: &CvOpt) -> String {
        if self.uses_binary_msa() {
            opt.bin_msa_type()
        } else {
            opt.prototype_msa_type()
        }
    }

    /// Model string passed to raxml-ng
    pub fn raxml_model(self, opt: &CvOpt) -> String {
        let states = opt.num_states();
        match self {
            Model::Bin => "BIN".to_string(),
            Model::Cog => format!("COG{}", states),
            Model::Gtr => format!("MULTI{}_GTR", states - 1),
            Model::Mk => format!("MULTI{}_MK", states - 1),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `<target_dir>/<msa_type>_cv_<split>_<fold>_<MODEL>`
pub fn result_prefix(
    target_dir: &Path,
    msa_type: &str,
    split: Split,
    fold: usize,
    model: Model,
) -> PathBuf {
    target_dir.join(format!("{}_cv_{}_{}_{}", msa_type, split, fold, model))
}

/// Tree inference on `msa` with `model_string`.
///
/// `--redo` is added when no best tree exists yet so stale checkpoints from an
/// aborted run are discarded.
pub fn inference_invocation(opt: &CvOpt, msa: &Path, model_string: &str, prefix: &Path) -> Invocation {
    let mut inv = Invocation::new(&opt.raxml_binary)
        .arg("--msa")
        .arg(path_arg(msa))
        .arg("--model")
        .arg(model_string)
        .arg("--prefix")
        .arg(path_arg(prefix))
        .args(["--threads", "auto", "--seed"])
        .arg(opt.inference_seed.to_string())
        .args(["--force", "model_lh_impr", "-blopt", "nr_safe"]);
    if !raxml_file(prefix, "bestTree").is_file() {
        inv = inv.arg("--redo");
    }
    inv
}

/// Likelihood evaluation of `msa` on a fixed tree and model
pub fn evaluate_invocation(
    opt: &CvOpt,
    msa: &Path,
    prefix: &Path,
    ref_prefix: &Path,
    model_string: &str,
) -> Invocation {
    Invocation::new(&opt.raxml_binary)
        .arg("--evaluate")
        .arg("--msa")
        .arg(path_arg(msa))
        .arg("--tree")
        .arg(path_arg(&raxml_file(ref_prefix, "bestTree")))
        .arg("--model")
        .arg(model_string)
        .arg("--prefix")
        .arg(path_arg(prefix))
        .args(["--threads", "auto", "--seed"])
        .arg(opt.inference_seed.to_string())
        .args(["--opt-model", "off", "--opt-branches", "off"])
}

/// Model string from the first line of `<ref_prefix>.raxml.bestModel`.
///
/// The line reads `<model>{params},<more>`; only the first comma field is used.
pub fn read_best_model(ref_prefix: &Path) -> io::Result<Option<String>> {
    let path = raxml_file(ref_prefix, "bestModel");
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    let model = line.trim_end().split(',').next().unwrap_or("").to_string();
    if model.is_empty() {
        return Ok(None);
    }
    Ok(Some(model))
}

/// Infer a tree for `msa`; skipped with a message when the alignment is missing.
pub fn run_inference(
    opt: &CvOpt,
    runner: &mut dyn ProcessRunner,
    msa: &Path,
    model_string: &str,
    prefix: &Path,
) -> io::Result<()> {
    if !msa.is_file() {
        log::warn!("MSA {} does not exist", msa.display());
        return Ok(());
    }
    ensure_parent_dir(prefix)?;
    let inv = inference_invocation(opt, msa, model_string, prefix);
    run_logged(runner, &inv);
    Ok(())
}

/// Evaluate `msa` against the results under `ref_prefix`; skipped when the
/// alignment or the reference model is missing.
pub fn run_evaluate(
    opt: &CvOpt,
    runner: &mut dyn ProcessRunner,
    msa: &Path,
    prefix: &Path,
    ref_prefix: &Path,
) -> io::Result<()> {
    if !msa.is_file() {
        log::warn!("MSA {} does not exist", msa.display());
        return Ok(());
    }
    ensure_parent_dir(prefix)?;
    let model_string = match read_best_model(ref_prefix)? {
        Some(m) => m,
        None => {
            log::debug!("No trained model at {}, skipping evaluation", ref_prefix.display());
            return Ok(());
        }
    };
    let inv = evaluate_invocation(opt, msa, prefix, ref_prefix, &model_string);
    run_logged(runner, &inv);
    Ok(())
}

fn sample_msa(paths: &SamplePaths, opt: &CvOpt, model: Model, split: Split, fold: usize) -> PathBuf {
    paths.sample(&model.msa_type(opt), split, fold)
}

/// Infer every model on every train sample of one dataset
pub fn train_models(
    msa_dir: &Path,
    target_dir: &Path,
    opt: &CvOpt,
    runner: &mut dyn ProcessRunner,
) -> io::Result<()> {
    let paths = SamplePaths::new(msa_dir, opt);
    for t in 0..opt.num_samples {
        for model in Model::ALL {
            let msa = sample_msa(&paths, opt, model, Split::Train, t);
            let prefix = result_prefix(target_dir, &model.msa_type(opt), Split::Train, t, model);
            run_inference(opt, runner, &msa, &model.raxml_model(opt), &prefix)?;
        }
    }
    Ok(())
}

/// Evaluate every trained model on the matching test sample of one dataset
pub fn test_models(
    msa_dir: &Path,
    target_dir: &Path,
    opt: &CvOpt,
    runner: &mut dyn ProcessRunner,
) -> io::Result<()> {
    let paths = SamplePaths::new(msa_dir, opt);
    for t in 0..opt.num_samples {
        for model in Model::ALL {
            let msa_type = model.msa_type(opt);
            let msa = sample_msa(&paths, opt, model, Split::Test, t);
            let ref_prefix = result_prefix(target_dir, &msa_type, Split::Train, t, model);
            let prefix = result_prefix(target_dir, &msa_type, Split::Test, t, model);
            run_evaluate(opt, runner, &msa, &prefix, &ref_prefix)?;
        }
    }
    Ok(())
}
