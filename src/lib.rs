pub mod analysis; // Per-fold score aggregation
pub mod cv; // Column-split sampler and dual-encoding materializer
pub mod cv_opt;
pub mod defaults;
pub mod difficulty; // Difficulty prediction with padded retry
pub mod error;
pub mod experiment; // Batch driver over dataset directories
pub mod inference; // raxml-ng train/evaluate invocations
pub mod io;
pub mod report; // Tables and charts
pub mod results; // raxml-ng log parsing
pub mod runner; // External process execution
pub mod utils;
