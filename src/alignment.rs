//!
//! Pre-parsed multiple-sequence alignment and the training statistics the
//! model builder reads off it: per-column symbol counts and histograms of
//! gap-run lengths keyed by the column where each run opens.
//!
//! File parsing lives outside the core. Callers hand over rows that are
//! already plain symbol sequences.
//!
use crate::common::{is_valid_base, sequence_to_string, Sequence, GAP};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

///
/// Malformed pre-parsed input, surfaced at the construction boundary.
///
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentError {
    /// no rows at all
    Empty,
    /// a row whose length differs from the first row's
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// a symbol outside alphabet + gap
    InvalidSymbol { row: usize, col: usize, symbol: u8 },
}

impl std::fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AlignmentError::Empty => write!(f, "alignment has no rows"),
            AlignmentError::RaggedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {} has length {} but the alignment is {} columns wide",
                row, actual, expected
            ),
            AlignmentError::InvalidSymbol { row, col, symbol } => write!(
                f,
                "row {} col {} holds invalid symbol {:?}",
                row, col, *symbol as char
            ),
        }
    }
}

impl std::error::Error for AlignmentError {}

///
/// An alignment: N rows of identical length over `ACGT` + gap.
///
#[derive(Debug, Clone)]
pub struct Alignment {
    rows: Vec<Sequence>,
}

impl Alignment {
    ///
    /// Validate and wrap pre-parsed rows.
    ///
    pub fn new(rows: Vec<Sequence>) -> Result<Alignment, AlignmentError> {
        if rows.is_empty() {
            return Err(AlignmentError::Empty);
        }
        let expected = rows[0].len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(AlignmentError::RaggedRow {
                    row: i,
                    expected,
                    actual: row.len(),
                });
            }
            for (j, &symbol) in row.iter().enumerate() {
                if symbol != GAP && !is_valid_base(symbol) {
                    return Err(AlignmentError::InvalidSymbol {
                        row: i,
                        col: j,
                        symbol,
                    });
                }
            }
        }
        Ok(Alignment { rows })
    }
    ///
    /// Convenience constructor from str rows (tests and callers with text).
    ///
    pub fn from_strs(rows: &[&str]) -> Result<Alignment, AlignmentError> {
        Alignment::new(rows.iter().map(|s| s.as_bytes().to_vec()).collect())
    }
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
    pub fn n_cols(&self) -> usize {
        self.rows.first().map_or(0, |row| row.len())
    }
    pub fn rows(&self) -> &[Sequence] {
        &self.rows
    }
    pub fn row(&self, i: usize) -> &[u8] {
        &self.rows[i]
    }
    ///
    /// Iterate one column top to bottom.
    ///
    pub fn column(&self, col: usize) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().map(move |row| row[col])
    }
    ///
    /// Bin counts of the symbols (gap included) in one column.
    ///
    pub fn column_counts(&self, col: usize) -> HashMap<u8, usize> {
        self.column(col).counts()
    }
    ///
    /// For every column, the histogram of lengths of gap runs that open in
    /// that column, collected across all rows. Sorted by run length.
    ///
    pub fn gap_runs_by_start_col(&self) -> Vec<BTreeMap<usize, usize>> {
        let mut counters: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); self.n_cols()];
        for row in &self.rows {
            for (start, len) in collect_gap_runs(row) {
                *counters[start].entry(len).or_insert(0) += 1;
            }
        }
        counters
    }
    ///
    /// Cut `n_start` columns off the front and `n_end` off the back of every
    /// row. Callers trim ragged alignment flanks before training.
    ///
    pub fn trim(&mut self, n_start: usize, n_end: usize) -> &mut Self {
        assert!(n_start + n_end <= self.n_cols());
        let keep = self.n_cols() - n_end;
        for row in &mut self.rows {
            row.truncate(keep);
            row.drain(..n_start);
        }
        self
    }
    ///
    /// Drop rows that hold nothing but gaps. Call after trimming.
    /// May leave the alignment empty; the builder rejects that case.
    ///
    pub fn remove_all_gap_rows(&mut self) -> &mut Self {
        self.rows.retain(|row| row.iter().any(|&s| s != GAP));
        self
    }
}

///
/// `(start column, length)` of every maximal gap run in one row.
///
fn collect_gap_runs(row: &[u8]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    for (i, &symbol) in row.iter().enumerate() {
        if symbol == GAP {
            open = match open {
                Some((start, len)) => Some((start, len + 1)),
                None => Some((i, 1)),
            };
        } else if let Some(run) = open.take() {
            runs.push(run);
        }
    }
    if let Some(run) = open {
        runs.push(run);
    }
    runs
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Alignment of {} columns:", self.n_cols())?;
        for row in &self.rows {
            write!(f, "\n  {}", sequence_to_string(row))?;
        }
        Ok(())
    }
}

//
// tests
//
