// Difficulty prediction with a single padded retry
//
// The predictor occasionally produces no value for alignments whose last
// chunk is short. When that happens the alignment is padded with gap columns
// up to the next chunk boundary and the predictor is run once more.

use crate::defaults::PAD_BLOCK_WIDTH;
use crate::error::{CvError, Result};
use crate::io::phylip::parse_header;
use crate::runner::{path_arg, run_logged, Invocation, ProcessRunner};
use crate::utils::{ensure_parent_dir, read_to_string};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Locations of the predictor and the tools it calls
#[derive(Debug, Clone)]
pub struct DifficultyTools {
    pub pythia: PathBuf,
    pub raxmlng: PathBuf,
    pub predictor: PathBuf,
}

/// Difficulty stored in the first line of `path`, or NaN when the file is
/// absent, empty or unparseable.
pub fn get_difficulty(path: &Path) -> f64 {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return f64::NAN,
    };
    text.lines()
        .next()
        .and_then(|l| l.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Header line with its column count (the second token) replaced by
/// `num_columns`; every other byte is kept.
fn rewrite_column_count(header: &str, num_columns: usize) -> Option<String> {
    let first = header.len() - header.trim_start().len();
    let gap = first + header[first..].find(char::is_whitespace)?;
    let start = gap + (header[gap..].len() - header[gap..].trim_start().len());
    let end = header[start..]
        .find(char::is_whitespace)
        .map_or(header.len(), |i| start + i);
    Some(format!("{}{}{}", &header[..start], num_columns, &header[end..]))
}

/// Pad every row of the last interleaved block to the next chunk boundary.
///
/// The chunk length is taken from the last space-separated chunk of the
/// block's first row. A full chunk gets a whole new gap chunk; a trailing
/// separator (empty chunk) gets gaps without a new separator; a partial chunk
/// is filled up. The column count in the header grows by the same amount and
/// any tokens after it are kept. `path` only labels errors.
pub fn pad_phylip(text: &str, path: &Path) -> Result<String> {
    let (header, body) = text.split_once('\n').unwrap_or((text, ""));

    let bad_header = || CvError::malformed(path, format!("bad header '{}'", header.trim_end()));
    let (_, num_columns) = parse_header(header).ok_or_else(bad_header)?;

    let mut blocks: Vec<&str> = body.split("\n\n").collect();
    let last = blocks.pop().unwrap_or("");
    let rows: Vec<&str> = last.split('\n').collect();
    let first_row = rows.iter().find(|r| !r.is_empty()).copied().unwrap_or("");
    let chunk = first_row.rsplit(' ').next().unwrap_or("").len();

    let (padding, suffix) = if chunk == 0 {
        (PAD_BLOCK_WIDTH, "-".repeat(PAD_BLOCK_WIDTH))
    } else if chunk % PAD_BLOCK_WIDTH == 0 {
        (PAD_BLOCK_WIDTH, format!(" {}", "-".repeat(PAD_BLOCK_WIDTH)))
    } else {
        let n = PAD_BLOCK_WIDTH - chunk % PAD_BLOCK_WIDTH;
        (n, "-".repeat(n))
    };

    let padded_rows: Vec<String> = rows
        .iter()
        .map(|r| {
            if r.is_empty() {
                String::new()
            } else {
                format!("{}{}", r, suffix)
            }
        })
        .collect();
    let padded_last = padded_rows.join("\n");

    let mut out = rewrite_column_count(header, num_columns + padding).ok_or_else(bad_header)?;
    out.push('\n');
    for b in &blocks {
        out.push_str(b);
        out.push_str("\n\n");
    }
    out.push_str(&padded_last);
    Ok(out)
}

/// Write a padded copy of `msa_path` to `outpath`
pub fn write_padded_msa(msa_path: &Path, outpath: &Path) -> Result<()> {
    let text = read_to_string(msa_path)?;
    let padded = pad_phylip(&text, msa_path)?;
    fs::write(outpath, padded)?;
    Ok(())
}

pub fn difficulty_invocation(tools: &DifficultyTools, msa_path: &Path, prefix: &Path) -> Invocation {
    Invocation::new(&tools.pythia)
        .arg("-m")
        .arg(path_arg(msa_path))
        .arg("-o")
        .arg(path_arg(prefix))
        .arg("-r")
        .arg(path_arg(&tools.raxmlng))
        .arg("-p")
        .arg(path_arg(&tools.predictor))
        .arg("--removeDuplicates")
        .arg("-v")
}

/// Run the predictor unless `prefix` already exists
pub fn run(
    tools: &DifficultyTools,
    runner: &mut dyn ProcessRunner,
    msa_path: &Path,
    prefix: &Path,
) -> io::Result<()> {
    if prefix.exists() {
        log::info!("Files with prefix {} already exist", prefix.display());
        return Ok(());
    }
    ensure_parent_dir(prefix)?;
    run_logged(runner, &difficulty_invocation(tools, msa_path, prefix));
    Ok(())
}

/// Predict the difficulty of `msa_path` into `prefix`, retrying once on a
/// padded copy when the first attempt yields no value.
///
/// An alignment that cannot be padded gives NaN; only storage failures are
/// returned as errors.
pub fn run_with_padding(
    tools: &DifficultyTools,
    runner: &mut dyn ProcessRunner,
    msa_path: &Path,
    prefix: &Path,
) -> Result<f64> {
    run(tools, runner, msa_path, prefix)?;
    let d = get_difficulty(prefix);
    if !d.is_nan() {
        return Ok(d);
    }

    log::warn!(
        "No difficulty for {}, retrying with padded alignment",
        msa_path.display()
    );
    if let Err(e) = fs::remove_file(prefix) {
        if e.kind() != io::ErrorKind::NotFound {
            return Err(e.into());
        }
    }

    let dir = match prefix.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let padded = tempfile::Builder::new()
        .prefix("padded_")
        .suffix(".phy")
        .tempfile_in(&dir)?;
    match write_padded_msa(msa_path, padded.path()) {
        Ok(()) => {}
        Err(e) if e.is_dataset_local() => {
            log::warn!("Cannot pad {}: {}", msa_path.display(), e);
            return Ok(f64::NAN);
        }
        Err(e) => return Err(e),
    }
    run(tools, runner, padded.path(), prefix)?;
    padded.close()?;

    Ok(get_difficulty(prefix))
}
