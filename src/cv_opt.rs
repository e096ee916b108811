use clap::Args;
use std::path::PathBuf;

use crate::defaults;
use crate::error::{CvError, Result};

// cognate-cv/src/cv_opt.rs
//
// Run options for the cross-validation experiment.

/// Options for one cross-validation batch.
///
/// Built once at the entry point and passed down by reference; nothing in the
/// library reads global state.
#[derive(Debug, Clone)]
pub struct CvOpt {
    // Sampling parameters
    pub num_samples: usize, // Number of folds per dataset
    pub ratio: f64,         // Fraction of sites assigned to the train split
    pub kappa: usize,       // Expanded columns per logical site
    pub seed: u64,          // Seed for the single process-wide RNG

    // Directory layout
    pub msa_super_dir: PathBuf,     // One sub-directory per dataset
    pub raxmlng_super_dir: PathBuf, // Inference results, mirrored per dataset
    pub plots_super_dir: PathBuf,   // Charts, grouped by kappa

    // External inference tool
    pub raxml_binary: PathBuf,
    pub inference_seed: u64,

    // Stage toggles
    pub run_train: bool,
    pub run_evaluate: bool,
    pub make_plots: bool,
}

impl Default for CvOpt {
    fn default() -> Self {
        CvOpt {
            num_samples: defaults::NUM_SAMPLES,
            ratio: defaults::TRAIN_RATIO,
            kappa: defaults::KAPPA,
            seed: defaults::SEED,

            msa_super_dir: PathBuf::from(defaults::MSA_SUPER_DIR),
            raxmlng_super_dir: PathBuf::from(defaults::RAXMLNG_SUPER_DIR),
            plots_super_dir: PathBuf::from(defaults::PLOTS_SUPER_DIR),

            raxml_binary: PathBuf::from(defaults::RAXML_BINARY),
            inference_seed: defaults::INFERENCE_SEED,

            run_train: false,
            run_evaluate: false,
            make_plots: true,
        }
    }
}

impl CvOpt {
    /// Reject parameter combinations the sampler cannot honour.
    pub fn validate(&self) -> Result<()> {
        check_ratio(self.ratio)?;
        if self.kappa == 0 {
            return Err(CvError::config("kappa must be at least 1"));
        }
        if self.num_samples == 0 {
            return Err(CvError::config("number of samples must be at least 1"));
        }
        // 2^kappa states must fit the model names handed to the inference tool
        if self.kappa >= usize::BITS as usize {
            return Err(CvError::config(format!("kappa {} is too large", self.kappa)));
        }
        Ok(())
    }

    /// File stem of the expanded (binary) encoding, e.g. `bin_part_3`
    pub fn bin_msa_type(&self) -> String {
        format!("bin_part_{}", self.kappa)
    }

    /// File stem of the collapsed (prototype) encoding, e.g. `prototype_part_3`
    pub fn prototype_msa_type(&self) -> String {
        format!("prototype_part_{}", self.kappa)
    }

    /// Number of character states a prototype site can take (2^kappa)
    pub fn num_states(&self) -> usize {
        1usize << self.kappa
    }

    /// Parse a train ratio from a string, e.g. "0.6"
    pub fn parse_ratio(s: &str) -> std::result::Result<f64, String> {
        let ratio = s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid train ratio: {}", s))?;
        check_ratio(ratio).map_err(|e| e.to_string())?;
        Ok(ratio)
    }

    pub fn from_cli(cli: &CvCliOptions) -> std::result::Result<Self, String> {
        let opt = CvOpt {
            num_samples: cli.num_samples,
            ratio: CvOpt::parse_ratio(&cli.ratio)?,
            kappa: cli.kappa,
            seed: cli.seed,
            msa_super_dir: cli.msa_dir.clone(),
            raxmlng_super_dir: cli.results_dir.clone(),
            plots_super_dir: cli.plots_dir.clone(),
            raxml_binary: cli.raxml_ng.clone(),
            inference_seed: cli.inference_seed,
            run_train: cli.train,
            run_evaluate: cli.evaluate,
            make_plots: !cli.no_plots,
        };
        opt.validate().map_err(|e| e.to_string())?;
        Ok(opt)
    }
}

fn check_ratio(ratio: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(CvError::config(format!(
            "train ratio must lie in [0, 1], got {}",
            ratio
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Args)]
pub struct CvCliOptions {
    // ===== Sampling Options =====
    /// Number of train/test folds per dataset
    #[arg(short = 'n', long, value_name = "INT", default_value_t = defaults::NUM_SAMPLES)]
    pub num_samples: usize,

    /// Fraction of sites placed in the train split
    #[arg(short = 'r', long, value_name = "FLOAT", default_value = "0.6")]
    pub ratio: String,

    /// Binary columns per prototype site
    #[arg(short = 'k', long, value_name = "INT", default_value_t = defaults::KAPPA)]
    pub kappa: usize,

    /// Seed for the column-split sampler
    #[arg(short = 's', long, value_name = "INT", default_value_t = defaults::SEED)]
    pub seed: u64,

    // ===== Directory Options =====
    /// Directory holding one sub-directory of alignments per dataset
    #[arg(long, value_name = "DIR", default_value = defaults::MSA_SUPER_DIR)]
    pub msa_dir: PathBuf,

    /// Directory receiving inference results
    #[arg(long, value_name = "DIR", default_value = defaults::RAXMLNG_SUPER_DIR)]
    pub results_dir: PathBuf,

    /// Directory receiving per-dataset charts
    #[arg(long, value_name = "DIR", default_value = defaults::PLOTS_SUPER_DIR)]
    pub plots_dir: PathBuf,

    // ===== Inference Options =====
    /// Path to the raxml-ng binary
    #[arg(long, value_name = "FILE", default_value = defaults::RAXML_BINARY)]
    pub raxml_ng: PathBuf,

    /// Seed handed to raxml-ng
    #[arg(long, value_name = "INT", default_value_t = defaults::INFERENCE_SEED)]
    pub inference_seed: u64,

    /// Infer trees and models on the train splits
    #[arg(long)]
    pub train: bool,

    /// Evaluate trained trees and models on the test splits
    #[arg(long)]
    pub evaluate: bool,

    /// Skip chart generation
    #[arg(long)]
    pub no_plots: bool,

    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
    pub verbosity: i32,
}

#[derive(Debug, Clone, Args)]
pub struct DifficultyCliOptions {
    /// Alignment to score
    #[arg(short = 'm', long, value_name = "MSA.PHY")]
    pub msa: PathBuf,

    /// Output file receiving the difficulty value
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: PathBuf,

    /// Path to the raxml-ng binary used by the predictor
    #[arg(short = 'r', long, value_name = "FILE")]
    pub raxmlng: PathBuf,

    /// Path to the serialized difficulty predictor
    #[arg(short = 'p', long, value_name = "FILE")]
    pub predictor: PathBuf,

    /// Difficulty predictor executable
    #[arg(long, value_name = "FILE", default_value = defaults::PYTHIA_BINARY)]
    pub pythia: PathBuf,

    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
    pub verbosity: i32,
}
