// Column-split sampler
//
// Each fold shuffles the full site index list independently and keeps the
// first ceil(num_sites * ratio) indices as the train set. Folds are not
// balanced or deduplicated against each other.

use crate::error::{CvError, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Train/test assignment of logical sites for one fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Train indices in the order they were drawn
    train: Vec<usize>,
    /// Membership mask, indexed by site
    is_train: Vec<bool>,
}

impl Partition {
    /// Build a partition from explicit train indices.
    ///
    /// Indices must be unique and below `num_sites`.
    pub fn from_train_indices(num_sites: usize, train: Vec<usize>) -> Result<Self> {
        let mut is_train = vec![false; num_sites];
        for &s in &train {
            if s >= num_sites {
                return Err(CvError::config(format!(
                    "train index {} out of range for {} sites",
                    s, num_sites
                )));
            }
            if is_train[s] {
                return Err(CvError::config(format!("train index {} repeated", s)));
            }
            is_train[s] = true;
        }
        Ok(Partition { train, is_train })
    }

    pub fn num_sites(&self) -> usize {
        self.is_train.len()
    }

    pub fn num_train(&self) -> usize {
        self.train.len()
    }

    pub fn num_test(&self) -> usize {
        self.num_sites() - self.num_train()
    }

    #[inline]
    pub fn is_train(&self, site: usize) -> bool {
        self.is_train[site]
    }

    /// Train indices in draw order
    pub fn train_indices(&self) -> &[usize] {
        &self.train
    }

    /// Test indices in increasing order
    pub fn test_indices(&self) -> Vec<usize> {
        (0..self.num_sites()).filter(|&s| !self.is_train[s]).collect()
    }
}

/// Number of train sites for a fold: ceil(num_sites * ratio)
pub fn train_size(num_sites: usize, ratio: f64) -> usize {
    ((num_sites as f64) * ratio).ceil() as usize
}

/// Draw `num_samples` independent partitions of `num_sites` sites.
///
/// `ratio` must lie in [0, 1]; anything else is rejected rather than clamped.
pub fn split_indices<R: Rng + ?Sized>(
    num_sites: usize,
    num_samples: usize,
    ratio: f64,
    rng: &mut R,
) -> Result<Vec<Partition>> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(CvError::config(format!(
            "train ratio must lie in [0, 1], got {}",
            ratio
        )));
    }

    let num_train = train_size(num_sites, ratio).min(num_sites);
    let mut partitions = Vec::with_capacity(num_samples);

    for _ in 0..num_samples {
        let mut sites: Vec<usize> = (0..num_sites).collect();
        sites.shuffle(rng);
        sites.truncate(num_train);

        let mut is_train = vec![false; num_sites];
        for &s in &sites {
            is_train[s] = true;
        }
        partitions.push(Partition {
            train: sites,
            is_train,
        });
    }

    log::debug!(
        "Drew {} partitions of {} sites ({} train each)",
        num_samples,
        num_sites,
        num_train
    );
    Ok(partitions)
}
