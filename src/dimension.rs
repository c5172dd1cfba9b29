//! Classification of the Entity, Department and Date mappings of a source
//! relative to the shape of its Value range.

use std::fmt;

use crate::error::{ConsolidateError, Result};
use crate::io::excel_read::Sheet;
use crate::matrix::{Matrix, read_matrix};
use crate::model::{Axis, AxisMapping, AxisMode, Cell, FieldLocation};

static EMPTY_CELL: Cell = Cell::Empty;

/// How a mapped axis lines up with the Value matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Blank,
    Constant,
    SingleCell,
    SingleColumn,
    MultiColumn,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Blank => "blank",
            Shape::Constant => "constant",
            Shape::SingleCell => "singleCell",
            Shape::SingleColumn => "singleColumn",
            Shape::MultiColumn => "multiColumn",
        };
        f.write_str(name)
    }
}

/// Resolved form of one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionSpec {
    Blank,
    /// Trimmed text for Entity and Department, the raw text for Date.
    Constant(Cell),
    SingleCell(Cell),
    /// `value.rows() x 1`, indexed by Value row.
    SingleColumn(Matrix),
    /// `1 x value.cols()`, indexed by Value column.
    MultiColumn(Matrix),
}

impl DimensionSpec {
    pub fn shape(&self) -> Shape {
        match self {
            DimensionSpec::Blank => Shape::Blank,
            DimensionSpec::Constant(_) => Shape::Constant,
            DimensionSpec::SingleCell(_) => Shape::SingleCell,
            DimensionSpec::SingleColumn(_) => Shape::SingleColumn,
            DimensionSpec::MultiColumn(_) => Shape::MultiColumn,
        }
    }
}

/// Resolves one axis mapping of the source at `position`.
pub fn classify(
    axis: Axis,
    mapping: AxisMapping<'_>,
    value: &Matrix,
    sheet: &Sheet,
    position: usize,
) -> Result<DimensionSpec> {
    match mapping.mode {
        AxisMode::Blank if axis == Axis::Date => Err(ConsolidateError::source_config(
            position,
            "Date must be a constant or a range",
        )),
        AxisMode::Blank => Ok(DimensionSpec::Blank),
        // Dates are structured values and keep the text exactly as supplied.
        AxisMode::Constant if axis == Axis::Date => {
            Ok(DimensionSpec::Constant(Cell::Text(mapping.constant.to_string())))
        }
        AxisMode::Constant => Ok(DimensionSpec::Constant(Cell::Text(
            mapping.constant.trim().to_string(),
        ))),
        AxisMode::Range => {
            if mapping.range.trim().is_empty() {
                return Err(ConsolidateError::source_config(
                    position,
                    format!("{axis} range is missing"),
                ));
            }
            let location = FieldLocation::new(position, axis);
            let matrix = read_matrix(sheet, mapping.range, location)?;
            Ok(match classify_shape(&matrix, value, location)? {
                Shape::SingleCell => DimensionSpec::SingleCell(matrix[(0, 0)].clone()),
                Shape::SingleColumn => DimensionSpec::SingleColumn(matrix),
                _ => DimensionSpec::MultiColumn(matrix),
            })
        }
    }
}

/// Classifies a range matrix against the Value matrix. Only the three
/// range shapes can result.
pub fn classify_shape(matrix: &Matrix, value: &Matrix, location: FieldLocation) -> Result<Shape> {
    let (rows, cols) = (matrix.rows(), matrix.cols());
    if rows == 1 && cols == 1 {
        return Ok(Shape::SingleCell);
    }
    if cols == 1 && rows == value.rows() {
        return Ok(Shape::SingleColumn);
    }
    if value.cols() > 1 && rows == 1 && cols == value.cols() {
        return Ok(Shape::MultiColumn);
    }

    let mut expected = format!(
        "a single cell or a single column of {} row(s)",
        value.rows()
    );
    if value.cols() > 1 {
        expected.push_str(&format!(" or a single row of {} columns", value.cols()));
    }
    Err(ConsolidateError::ShapeMismatch {
        location,
        detail: format!("range is {}; expected {expected}", matrix.dimensions()),
    })
}

/// Requires exactly one multi-column axis when the Value range spans several
/// columns and none otherwise.
pub fn check_multi_column<'a>(
    specs: impl IntoIterator<Item = &'a DimensionSpec>,
    value_cols: usize,
    position: usize,
) -> Result<()> {
    let found = specs
        .into_iter()
        .filter(|spec| spec.shape() == Shape::MultiColumn)
        .count();
    let expected = usize::from(value_cols > 1);
    if found != expected {
        return Err(ConsolidateError::MultiColumnConflict {
            position,
            found,
            expected,
        });
    }
    Ok(())
}

/// Looks up the axis value for the Value cell at `(row, col)`.
pub fn resolve_axis(spec: &DimensionSpec, row: usize, col: usize) -> &Cell {
    match spec {
        DimensionSpec::Blank => &EMPTY_CELL,
        DimensionSpec::Constant(cell) | DimensionSpec::SingleCell(cell) => cell,
        DimensionSpec::SingleColumn(matrix) => &matrix[(row, 0)],
        DimensionSpec::MultiColumn(matrix) => &matrix[(0, col)],
    }
}
