// Result-file parsing
//
// Missing or malformed results are not errors: they read as NaN so that
// aggregation can carry on with gaps.

use crate::inference::Model;
use crate::io::phylip::read_header;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const FINAL_LLH_TAG: &str = "Final LogLikelihood: ";

/// `<prefix>.raxml.<suffix>`
pub fn raxml_file(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".raxml.");
    name.push(suffix);
    PathBuf::from(name)
}

/// Final log-likelihood reported in `<prefix>.raxml.log`, or NaN.
pub fn final_llh(prefix: &Path) -> f64 {
    let log_path = raxml_file(prefix, "log");
    let file = match File::open(&log_path) {
        Ok(f) => f,
        Err(_) => {
            log::debug!("No log at {}", log_path.display());
            return f64::NAN;
        }
    };

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Failed reading {}: {}", log_path.display(), e);
                return f64::NAN;
            }
        };
        if let Some(value) = line.strip_prefix(FINAL_LLH_TAG) {
            return value.trim().parse::<f64>().unwrap_or_else(|_| {
                log::warn!("Unparseable likelihood '{}' in {}", value, log_path.display());
                f64::NAN
            });
        }
    }
    f64::NAN
}

/// Final log-likelihood per logical site.
///
/// The site count comes from the alignment header. Binary alignments carry
/// `kappa` columns per site, so their column count is divided by `kappa`
/// (integer division) before normalising.
pub fn relative_llh(msa_path: &Path, prefix: &Path, kappa: usize, model: Model) -> f64 {
    let num_columns = match read_header(msa_path) {
        Ok((_, len)) => len,
        Err(e) => {
            log::debug!("{}", e);
            return f64::NAN;
        }
    };
    let num_sites = if model == Model::Bin {
        num_columns / kappa.max(1)
    } else {
        num_columns
    };
    if num_sites == 0 {
        return f64::NAN;
    }
    final_llh(prefix) / num_sites as f64
}
