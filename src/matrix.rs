use std::ops::Index;

use crate::error::{ConsolidateError, Result};
use crate::io::excel_read::Sheet;
use crate::model::{Cell, FieldLocation};
use crate::range::RangeRef;

/// Largest number of cells a single range read may materialise.
pub const MAX_CELLS: usize = 1 << 24;

/// Immutable, rectangular, row-major snapshot of one range read.
///
/// A matrix always has at least one row and one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Matrix {
    /// Builds a matrix from row vectors. Returns `None` when the input is
    /// empty or ragged.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Option<Matrix> {
        let cols = rows.first()?.len();
        if cols == 0 || rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Matrix {
            rows: rows.len(),
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Human-readable `rows x cols` form used in error messages.
    pub fn dimensions(&self) -> String {
        format!("{} row(s) x {} column(s)", self.rows, self.cols)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Cell;

    fn index(&self, (row, col): (usize, usize)) -> &Cell {
        assert!(col < self.cols, "column {col} out of bounds");
        &self.cells[row * self.cols + col]
    }
}

/// Reads `text` from `sheet` into a [`Matrix`].
///
/// Cells without a stored value become [`Cell::Empty`]; sparse regions are
/// legal. Fails with `RangeSyntax` when the text does not describe a
/// non-empty span and with `RangeOutOfBounds` when the sheet rejects it or
/// the span holds more than [`MAX_CELLS`] cells.
pub fn read_matrix(sheet: &Sheet, text: &str, location: FieldLocation) -> Result<Matrix> {
    let range = RangeRef::parse(text).ok_or_else(|| ConsolidateError::RangeSyntax {
        location,
        text: text.to_string(),
    })?;

    let too_large = range
        .rows()
        .checked_mul(range.cols())
        .is_none_or(|count| count > MAX_CELLS);
    if too_large || !sheet.contains_span(&range) {
        return Err(ConsolidateError::RangeOutOfBounds {
            location,
            range: range.to_string(),
        });
    }

    let cells = (range.start.row..=range.end.row)
        .flat_map(|row| (range.start.col..=range.end.col).map(move |col| (row, col)))
        .map(|(row, col)| sheet.cell(row, col))
        .collect();

    Ok(Matrix {
        rows: range.rows(),
        cols: range.cols(),
        cells,
    })
}
