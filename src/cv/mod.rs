//! Column-split cross-validation.
//!
//! [`split`] draws train/test site partitions; [`materialize`] applies one
//! partition to the collapsed and expanded encodings of a dataset and writes
//! the resulting alignments.

pub mod materialize;
pub mod split;

pub use materialize::{create_samples, split_alignments, FoldAlignments, SamplePaths, Split};
pub use split::{split_indices, train_size, Partition};
