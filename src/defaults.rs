// src/defaults.rs

// Sampling Constants
pub const NUM_SAMPLES: usize = 10;
pub const TRAIN_RATIO: f64 = 0.6;
pub const KAPPA: usize = 3;
pub const SEED: u64 = 2;

// Directory Layout
pub const MSA_SUPER_DIR: &str = "data/lingdata_cognate/msa";
pub const RAXMLNG_SUPER_DIR: &str = "data/cross_validation";
pub const PLOTS_SUPER_DIR: &str = "data/cross_validation_plots";

// External Tools
pub const RAXML_BINARY: &str = "./bin/raxml-ng-multiple-force";
pub const INFERENCE_SEED: u64 = 2;
pub const PYTHIA_BINARY: &str = "pythia";

// Difficulty Padding
pub const PAD_BLOCK_WIDTH: usize = 10;

// Other Constants
pub const VERBOSITY: i32 = 3;
