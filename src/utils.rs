use flate2::read::GzDecoder;
use std::fs::{self, OpenOptions};
use std::io::{self, stdin, BufRead, BufReader, Read};
use std::path::Path;

#[path = "utils_test.rs"]
mod utils_test;

/// Open a file for buffered reading; `-` reads stdin.
pub fn xopen(path: &Path) -> io::Result<Box<dyn BufRead>> {
    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::new(stdin())));
    }

    let file = OpenOptions::new().read(true).open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

/// Like [`xopen`], transparently inflating `.gz` files.
pub fn xzopen(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let input = xopen(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(input))))
    } else {
        Ok(input)
    }
}

/// Read the first line of a (possibly gzipped) text file, without the newline.
pub fn read_first_line(path: &Path) -> io::Result<Option<String>> {
    let mut reader = xzopen(path)?;
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Read a whole (possibly gzipped) text file into a string.
pub fn read_to_string(path: &Path) -> io::Result<String> {
    let mut reader = xzopen(path)?;
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}

/// Create the directory that will contain `path`, if it has one.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            log::debug!("Creating directory {}", dir.display());
            fs::create_dir_all(dir)
        }
        _ => Ok(()),
    }
}

/// Create `dir` and its ancestors if absent.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        log::debug!("Creating directory {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
