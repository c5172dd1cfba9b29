use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{ConsolidateError, Result};
use crate::model::Cell;
use crate::range::RangeRef;

/// Number of rows addressable in an `.xlsx` worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns addressable in an `.xlsx` worksheet.
pub const MAX_COLS: u32 = 16_384;

/// A source workbook with every worksheet materialised in memory.
///
/// Source workbooks are only ever read; nothing in the crate writes back to
/// them.
#[derive(Debug, Clone)]
pub struct Workbook {
    name: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Opens an `.xlsx` file from disk. The display name is the file name.
    pub fn open(path: &Path) -> Result<Self> {
        let workbook: Xlsx<_> = open_workbook(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::load(name, workbook)
    }

    /// Reads an `.xlsx` workbook from raw bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let workbook = Xlsx::new(Cursor::new(bytes))?;
        Self::load(name.into(), workbook)
    }

    /// Assembles a workbook from sheets that are already in memory.
    pub fn from_sheets(name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }

    fn load<R: Read + Seek>(name: String, mut workbook: Xlsx<R>) -> Result<Self> {
        let sheet_names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let cells = read_required_sheet(&mut workbook, &sheet_name)?;
            sheets.push(Sheet::new(sheet_name, cells));
        }
        debug!(workbook = %name, sheet_count = sheets.len(), "workbook loaded");
        Ok(Self { name, sheets })
    }

    /// Display name of the workbook, usually its file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

fn read_required_sheet<R: Read + Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ConsolidateError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ConsolidateError::from)?;
    Ok(range)
}

/// Read-only address → value lookup over one worksheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: Range<DataType>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, cells: Range<DataType>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Builds a sheet whose top-left cell is `A1` from row vectors.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        if height == 0 || width == 0 {
            return Self::new(name, Range::empty());
        }

        let mut cells = Range::new((0, 0), (height - 1, width - 1));
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, cell) in row.into_iter().enumerate() {
                cells.set_value((row_idx as u32, col_idx as u32), DataType::from(cell));
            }
        }
        Self::new(name, cells)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value stored at a zero-based coordinate; absent cells are empty.
    pub fn cell(&self, row: u32, col: u32) -> Cell {
        self.cells
            .get_value((row, col))
            .map(Cell::from)
            .unwrap_or(Cell::Empty)
    }

    /// Whether the span lies inside the worksheet grid.
    pub fn contains_span(&self, range: &RangeRef) -> bool {
        range.end.row < MAX_ROWS && range.end.col < MAX_COLS
    }
}

impl From<&DataType> for Cell {
    fn from(value: &DataType) -> Self {
        match value {
            DataType::Int(value) => Cell::Number(*value as f64),
            DataType::Float(value) => Cell::Number(*value),
            DataType::String(value) => Cell::Text(value.clone()),
            DataType::Bool(value) => Cell::Bool(*value),
            DataType::DateTime(value) => Cell::Date(*value),
            DataType::Empty => Cell::Empty,
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<Cell> for DataType {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => DataType::Empty,
            Cell::Number(value) => DataType::Float(value),
            Cell::Text(value) => DataType::String(value),
            Cell::Bool(value) => DataType::Bool(value),
            Cell::Date(value) => DataType::DateTime(value),
        }
    }
}
