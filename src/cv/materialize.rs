// Dual-encoding alignment materializer
//
// Applies one site partition to the collapsed encoding (1 column per site) and
// the expanded encoding (kappa columns per site) of the same dataset, so the
// four derived alignments stay column-aligned across encodings.

use crate::cv::split::{split_indices, Partition};
use crate::cv_opt::CvOpt;
use crate::error::{CvError, Result};
use crate::io::phylip::{read_phylip, write_phylip_file, Alignment};
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which side of a fold an alignment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File naming for one dataset directory
///
/// Sources are `<type>.phy`; fold outputs are `<type>_cv_<split>_<t>.phy`
/// where `<type>` is `bin_part_<kappa>` or `prototype_part_<kappa>`.
#[derive(Debug, Clone)]
pub struct SamplePaths {
    pub msa_dir: PathBuf,
    pub bin_msa_type: String,
    pub prototype_msa_type: String,
}

impl SamplePaths {
    pub fn new(msa_dir: &Path, opt: &CvOpt) -> Self {
        SamplePaths {
            msa_dir: msa_dir.to_path_buf(),
            bin_msa_type: opt.bin_msa_type(),
            prototype_msa_type: opt.prototype_msa_type(),
        }
    }

    /// Expanded (binary) source alignment
    pub fn bin_source(&self) -> PathBuf {
        self.msa_dir.join(format!("{}.phy", self.bin_msa_type))
    }

    /// Collapsed (prototype) source alignment
    pub fn prototype_source(&self) -> PathBuf {
        self.msa_dir.join(format!("{}.phy", self.prototype_msa_type))
    }

    pub fn bin_sample(&self, split: Split, fold: usize) -> PathBuf {
        self.sample(&self.bin_msa_type, split, fold)
    }

    pub fn prototype_sample(&self, split: Split, fold: usize) -> PathBuf {
        self.sample(&self.prototype_msa_type, split, fold)
    }

    pub fn sample(&self, msa_type: &str, split: Split, fold: usize) -> PathBuf {
        self.msa_dir
            .join(format!("{}_cv_{}_{}.phy", msa_type, split, fold))
    }

    /// True when both source encodings are present
    pub fn has_sources(&self) -> bool {
        self.bin_source().is_file() && self.prototype_source().is_file()
    }
}

/// The four alignments derived from one fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAlignments {
    pub collapsed_train: Alignment,
    pub collapsed_test: Alignment,
    pub expanded_train: Alignment,
    pub expanded_test: Alignment,
}

/// Verify that both alignments are rectangular, that `expanded` carries
/// exactly `kappa` columns per `collapsed` column, and that the identifiers
/// match in the same order.
pub fn check_encodings(collapsed: &Alignment, expanded: &Alignment, kappa: usize) -> Result<()> {
    if kappa == 0 {
        return Err(CvError::config("kappa must be at least 1"));
    }
    let collapsed_cols = collapsed.check_rows()?;
    let expanded_cols = expanded.check_rows()?;
    let mismatch = CvError::ColumnMismatch {
        expanded: expanded_cols,
        kappa,
        collapsed: collapsed_cols,
    };
    match kappa.checked_mul(collapsed_cols) {
        Some(expected) if expected == expanded_cols => {}
        _ => return Err(mismatch),
    }
    if collapsed.num_sequences() != expanded.num_sequences() {
        return Err(CvError::IdentifierMismatch {
            index: collapsed.num_sequences().min(expanded.num_sequences()),
            collapsed: format!("{} sequences", collapsed.num_sequences()),
            expanded: format!("{} sequences", expanded.num_sequences()),
        });
    }
    for (index, (c, e)) in collapsed.ids().zip(expanded.ids()).enumerate() {
        if c != e {
            return Err(CvError::IdentifierMismatch {
                index,
                collapsed: c.to_string(),
                expanded: e.to_string(),
            });
        }
    }
    Ok(())
}

/// Split both encodings by `partition`, keeping sites in increasing order.
pub fn split_alignments(
    collapsed: &Alignment,
    expanded: &Alignment,
    partition: &Partition,
    kappa: usize,
) -> Result<FoldAlignments> {
    check_encodings(collapsed, expanded, kappa)?;
    let num_sites = collapsed.num_columns();
    if partition.num_sites() != num_sites {
        return Err(CvError::config(format!(
            "partition covers {} sites, alignment has {}",
            partition.num_sites(),
            num_sites
        )));
    }

    let mut fold = FoldAlignments {
        collapsed_train: Alignment::empty_like(collapsed),
        collapsed_test: Alignment::empty_like(collapsed),
        expanded_train: Alignment::empty_like(expanded),
        expanded_test: Alignment::empty_like(expanded),
    };

    // check_encodings bounds (s + 1) * kappa by the expanded column count
    for s in 0..num_sites {
        let (c_dst, e_dst) = if partition.is_train(s) {
            (&mut fold.collapsed_train, &mut fold.expanded_train)
        } else {
            (&mut fold.collapsed_test, &mut fold.expanded_test)
        };
        c_dst.append_columns(collapsed, s..s + 1);
        e_dst.append_columns(expanded, s * kappa..(s + 1) * kappa);
    }

    Ok(fold)
}

/// Write the four alignments of fold `fold` to their canonical paths
pub fn write_fold(paths: &SamplePaths, fold: usize, alignments: &FoldAlignments) -> Result<()> {
    write_phylip_file(&paths.bin_sample(Split::Train, fold), &alignments.expanded_train)?;
    write_phylip_file(&paths.bin_sample(Split::Test, fold), &alignments.expanded_test)?;
    write_phylip_file(
        &paths.prototype_sample(Split::Train, fold),
        &alignments.collapsed_train,
    )?;
    write_phylip_file(
        &paths.prototype_sample(Split::Test, fold),
        &alignments.collapsed_test,
    )?;
    Ok(())
}

fn read_source(path: &Path) -> Result<Alignment> {
    read_phylip(path).map_err(|e| match e {
        CvError::Io(source) => CvError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Materialize all folds for the dataset in `msa_dir`.
///
/// Both sources are read and validated before the first write, so a
/// precondition failure leaves the directory untouched. Returns the number
/// of folds written.
pub fn create_samples<R: Rng + ?Sized>(msa_dir: &Path, opt: &CvOpt, rng: &mut R) -> Result<usize> {
    let paths = SamplePaths::new(msa_dir, opt);

    let collapsed = read_source(&paths.prototype_source())?;
    let expanded = read_source(&paths.bin_source())?;
    check_encodings(&collapsed, &expanded, opt.kappa)?;

    let num_sites = collapsed.num_columns();
    log::debug!(
        "{}: {} sequences, {} sites, {} binary columns",
        msa_dir.display(),
        collapsed.num_sequences(),
        num_sites,
        expanded.num_columns()
    );

    let partitions = split_indices(num_sites, opt.num_samples, opt.ratio, rng)?;
    for (t, partition) in partitions.iter().enumerate() {
        let fold = split_alignments(&collapsed, &expanded, partition, opt.kappa)?;
        write_fold(&paths, t, &fold)?;
    }

    log::info!("{} done", msa_dir.display());
    Ok(partitions.len())
}
