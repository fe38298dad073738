use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

/// Title column (C) and the first row below the two header rows.
/// Columns and rows are 1-based throughout, matching spreadsheet
/// conventions.
pub const TITLE_COL: usize = 3;
pub const FIRST_DATA_ROW: usize = 3;
/// Data rows span columns B..U, 20 cells wide.
pub const FIRST_WRITE_COL: usize = 2;
pub const ROW_WIDTH: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Backend(String),
}

/// A cell value written to the store. The store is free to interpret
/// numbers as numbers rather than literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Number(u64),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Empty => Ok(()),
        }
    }
}

/// Minimal grid interface the adapter needs from a worksheet backend:
/// read one column from a starting row, and write a rectangular block.
pub trait Worksheet {
    /// Values of `col` from `start_row` down to the last non-empty cell.
    fn col_values(&self, col: usize, start_row: usize) -> Result<Vec<String>, StoreError>;

    /// Writes `rows` as a contiguous block whose top-left corner is
    /// (`start_row`, `start_col`).
    fn update(
        &mut self,
        start_row: usize,
        start_col: usize,
        rows: &[Vec<CellValue>],
    ) -> Result<(), StoreError>;
}

/// Adapter from pipeline semantics (titles, row batches) to the grid
/// interface. Append-only: rows are never mutated or deleted here.
pub struct JobSheet<W: Worksheet> {
    worksheet: W,
}

impl<W: Worksheet> JobSheet<W> {
    pub fn new(worksheet: W) -> Self {
        JobSheet { worksheet }
    }

    /// All titles currently in the sheet, header rows excluded.
    ///
    /// Fails open: a read failure yields an empty list so a transient
    /// store error cannot block the run, at the cost of possible
    /// duplicate rows. Logged at error level to keep that case
    /// distinguishable from an empty sheet.
    pub fn existing_titles(&self) -> Vec<String> {
        match self.worksheet.col_values(TITLE_COL, FIRST_DATA_ROW) {
            Ok(titles) => {
                info!("Found {} existing titles in the sheet.", titles.len());
                titles
            }
            Err(e) => {
                error!(
                    "Failed to read existing titles, treating sheet as empty \
                     (duplicates possible this run): {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Appends `rows` as one contiguous B..U block after the last row of
    /// column C. Returns false for empty input or on any write failure;
    /// a false return means nothing was persisted.
    pub fn append_rows(&mut self, rows: &[Vec<CellValue>]) -> bool {
        if rows.is_empty() {
            return false;
        }

        let next_row = match self.worksheet.col_values(TITLE_COL, 1) {
            Ok(values) => values.len() + 1,
            Err(e) => {
                error!("Failed to locate next free row: {}", e);
                return false;
            }
        };
        let end_row = next_row + rows.len() - 1;

        match self.worksheet.update(next_row, FIRST_WRITE_COL, rows) {
            Ok(()) => {
                info!("Wrote rows {}..{} (columns B-U).", next_row, end_row);
                true
            }
            Err(e) => {
                error!("Failed to append {} rows: {}", rows.len(), e);
                false
            }
        }
    }
}

/// CSV-file-backed worksheet: one file, columns A..U, column A left to
/// external bookkeeping. Stands in for the hosted spreadsheet behind
/// the same grid interface.
pub struct CsvWorksheet {
    path: PathBuf,
}

impl CsvWorksheet {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvWorksheet {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<Vec<Vec<String>>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record?;
            grid.push(record.iter().map(str::to_string).collect());
        }
        Ok(grid)
    }

    fn save(&self, grid: &[Vec<String>]) -> Result<(), StoreError> {
        let file = File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(file);
        for row in grid {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Worksheet for CsvWorksheet {
    fn col_values(&self, col: usize, start_row: usize) -> Result<Vec<String>, StoreError> {
        let grid = self.load()?;
        let mut values: Vec<String> = grid
            .iter()
            .skip(start_row - 1)
            .map(|row| row.get(col - 1).cloned().unwrap_or_default())
            .collect();
        while values.last().map_or(false, |v| v.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    fn update(
        &mut self,
        start_row: usize,
        start_col: usize,
        rows: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        let mut grid = self.load()?;
        let needed_rows = start_row - 1 + rows.len();
        if grid.len() < needed_rows {
            grid.resize_with(needed_rows, Vec::new);
        }

        for (i, cells) in rows.iter().enumerate() {
            let target = &mut grid[start_row - 1 + i];
            let needed_cols = start_col - 1 + cells.len();
            if target.len() < needed_cols {
                target.resize_with(needed_cols, String::new);
            }
            for (j, cell) in cells.iter().enumerate() {
                target[start_col - 1 + j] = cell.to_string();
            }
        }

        self.save(&grid)
    }
}
