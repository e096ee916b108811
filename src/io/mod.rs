//! Alignment file formats.

pub mod phylip;
