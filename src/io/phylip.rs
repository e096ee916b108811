// Relaxed PHYLIP alignment I/O
//
// Reads interleaved or single-block relaxed PHYLIP (identifiers of any length,
// separated from the data by whitespace) and writes the classic interleaved
// layout: blocks of 50 symbols in space-separated chunks of 10.

use crate::error::{CvError, Result};
use crate::utils::{ensure_parent_dir, xzopen};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::ops::Range;
use std::path::Path;

/// Symbols per interleaved block
const BLOCK_WIDTH: usize = 50;
/// Symbols per space-separated chunk within a block
const CHUNK_WIDTH: usize = 10;

/// One row of an alignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub seq: Vec<u8>,
}

/// Multiple sequence alignment held row-major in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pub records: Vec<Record>,
}

impl Alignment {
    pub fn new(records: Vec<Record>) -> Self {
        Alignment { records }
    }

    /// Alignment with the same identifiers (and order) as `reference` and no columns
    pub fn empty_like(reference: &Alignment) -> Self {
        Alignment {
            records: reference
                .records
                .iter()
                .map(|r| Record {
                    id: r.id.clone(),
                    seq: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn num_sequences(&self) -> usize {
        self.records.len()
    }

    /// Length of the first row; zero for an alignment without sequences.
    ///
    /// Only meaningful once [`Alignment::check_rows`] has passed. The reader
    /// guarantees that, but alignments built with [`Alignment::new`] do not.
    pub fn num_columns(&self) -> usize {
        self.records.first().map_or(0, |r| r.seq.len())
    }

    /// Column count, or `RaggedAlignment` naming the first row whose length
    /// differs from the first row's.
    pub fn check_rows(&self) -> Result<usize> {
        let len = self.num_columns();
        match self.records.iter().find(|r| r.seq.len() != len) {
            Some(r) => Err(CvError::RaggedAlignment {
                id: r.id.clone(),
                columns: r.seq.len(),
                expected: len,
            }),
            None => Ok(len),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    /// Symbols of column `col`, top to bottom
    pub fn column(&self, col: usize) -> Vec<u8> {
        self.records.iter().map(|r| r.seq[col]).collect()
    }

    /// Append columns `cols` of `src` to every row.
    ///
    /// `src` must carry the same identifiers in the same order and `cols` must
    /// lie within every row; callers run `check_encodings` once per dataset,
    /// so only the row count is asserted here.
    pub fn append_columns(&mut self, src: &Alignment, cols: Range<usize>) {
        debug_assert_eq!(self.records.len(), src.records.len());
        for (dst, row) in self.records.iter_mut().zip(&src.records) {
            dst.seq.extend_from_slice(&row.seq[cols.clone()]);
        }
    }
}

// ============================================================================
// READING
// ============================================================================

/// Parse the `<num_sequences> <num_columns>` header line.
///
/// Extra tokens after the two counts are ignored.
pub fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    let n = tokens.next()?.parse::<usize>().ok()?;
    let len = tokens.next()?.parse::<usize>().ok()?;
    Some((n, len))
}

/// Read only the header of an alignment file
pub fn read_header(path: &Path) -> Result<(usize, usize)> {
    let line = crate::utils::read_first_line(path)?
        .ok_or_else(|| CvError::malformed(path, "empty file"))?;
    parse_header(&line).ok_or_else(|| CvError::malformed(path, format!("bad header '{}'", line)))
}

/// Read a relaxed PHYLIP file (`.gz` is inflated transparently)
pub fn read_phylip(path: &Path) -> Result<Alignment> {
    let reader = xzopen(path)?;
    parse_phylip(reader, path)
}

/// Parse relaxed PHYLIP from `reader`; `path` only labels errors.
pub fn parse_phylip<R: BufRead>(reader: R, path: &Path) -> Result<Alignment> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(CvError::malformed(path, "empty file")),
    };
    let (n, len) = parse_header(&header)
        .ok_or_else(|| CvError::malformed(path, format!("bad header '{}'", header.trim_end())))?;

    let mut records: Vec<Record> = Vec::with_capacity(n);
    let mut continuation = 0usize;

    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if records.len() < n {
            let (id, data) = match line.split_once(char::is_whitespace) {
                Some((id, data)) => (id, data),
                None => (line, ""),
            };
            records.push(Record {
                id: id.to_string(),
                seq: strip_whitespace(data),
            });
        } else if n == 0 {
            return Err(CvError::malformed(path, "sequence data after a zero-sequence header"));
        } else {
            // Interleaved continuation: rows repeat in the order of the first block
            let row = &mut records[continuation % n];
            row.seq.extend(strip_whitespace(line));
            continuation += 1;
        }
    }

    if records.len() != n {
        return Err(CvError::malformed(
            path,
            format!("header declares {} sequences, found {}", n, records.len()),
        ));
    }
    for r in &records {
        if r.seq.len() != len {
            return Err(CvError::malformed(
                path,
                format!(
                    "sequence '{}' has {} columns, header declares {}",
                    r.id,
                    r.seq.len(),
                    len
                ),
            ));
        }
    }

    log::trace!("Read {} sequences x {} columns from {}", n, len, path.display());
    Ok(Alignment { records })
}

fn strip_whitespace(data: &str) -> Vec<u8> {
    data.bytes().filter(|b| !b.is_ascii_whitespace()).collect()
}

// ============================================================================
// WRITING
// ============================================================================

/// Identifier as written: `[](),` removed, `:` and `;` replaced by `|`.
///
/// Tree parsers treat these characters as Newick syntax.
pub fn clean_identifier(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | ','))
        .map(|c| if c == ':' || c == ';' { '|' } else { c })
        .collect()
}

/// Write `alignment` in interleaved relaxed PHYLIP.
///
/// Identifiers go through [`clean_identifier`] and must stay unique and
/// non-empty afterwards. The identifier column is one wider than the longest
/// identifier before cleaning. Each line carries up to five chunks; the chunk
/// loop stops once the next chunk would run past the alignment end, which
/// leaves a lone separator after the last chunk when the final block length
/// is a multiple of ten below fifty.
pub fn write_phylip<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    let mut names = Vec::with_capacity(alignment.num_sequences());
    let mut seen = HashSet::with_capacity(alignment.num_sequences());
    for r in &alignment.records {
        if r.id.chars().any(char::is_whitespace) {
            return Err(CvError::invalid_identifier(&r.id, "whitespace is not allowed"));
        }
        let name = clean_identifier(&r.id);
        if name.is_empty() {
            return Err(CvError::invalid_identifier(&r.id, "identifier is empty"));
        }
        if !seen.insert(name.clone()) {
            return Err(CvError::invalid_identifier(&r.id, "identifier is repeated"));
        }
        names.push(name);
    }

    let len = alignment.check_rows()?;
    let id_width = alignment.ids().map(str::len).max().unwrap_or(0) + 1;

    writeln!(writer, " {} {}", alignment.num_sequences(), len)?;

    let mut block = 0usize;
    loop {
        for (r, name) in alignment.records.iter().zip(&names) {
            if block == 0 {
                write!(writer, "{:<width$}", name, width = id_width)?;
            } else {
                write!(writer, "{:width$}", "", width = id_width)?;
            }
            for chunk in 0..BLOCK_WIDTH / CHUNK_WIDTH {
                let start = block * BLOCK_WIDTH + chunk * CHUNK_WIDTH;
                let end = (start + CHUNK_WIDTH).min(len);
                writer.write_all(b" ")?;
                writer.write_all(&r.seq[start.min(len)..end])?;
                if start + CHUNK_WIDTH > len {
                    break;
                }
            }
            writer.write_all(b"\n")?;
        }
        block += 1;
        if block * BLOCK_WIDTH >= len {
            break;
        }
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write `alignment` to `path`, creating parent directories on demand
pub fn write_phylip_file(path: &Path, alignment: &Alignment) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_phylip(&mut writer, alignment)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "phylip_test.rs"]
mod phylip_test;
