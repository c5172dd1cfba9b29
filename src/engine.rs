//! Preparation and expansion of configured sources into consolidated rows.
//!
//! [`prepare`] performs every structural check up front, so that [`expand`]
//! can walk the Value positions without any failure path: every axis lookup
//! it performs is guaranteed in range by the shapes validated here.

use tracing::debug;

use crate::dimension::{DimensionSpec, check_multi_column, classify, resolve_axis};
use crate::error::{ConsolidateError, Result};
use crate::io::excel_read::{Sheet, Workbook};
use crate::matrix::{Matrix, read_matrix};
use crate::model::{Axis, ConsolidatedRow, Field, FieldLocation, SourceMapping};
use crate::value::parse_number;

/// A configured source together with the workbook opened for this run.
#[derive(Debug, Clone, Copy)]
pub struct SourceInput<'a> {
    pub mapping: &'a SourceMapping,
    pub workbook: Option<&'a Workbook>,
}

/// One validated source, ready for expansion.
#[derive(Debug, Clone)]
pub struct PreparedSource<'a> {
    /// 1-based position in the configured list.
    pub position: usize,
    pub mapping: &'a SourceMapping,
    /// Provenance stamped into `SourceFile`.
    pub source_file: String,
    pub account: Matrix,
    pub value: Matrix,
    pub entity: DimensionSpec,
    pub department: DimensionSpec,
    pub date: DimensionSpec,
}

impl PreparedSource<'_> {
    /// Sheet name stamped into `SourceSheet`.
    pub fn sheet_name(&self) -> &str {
        &self.mapping.source_sheet
    }
}

/// Validates and materialises every source in configured order. The first
/// failing source aborts the whole preparation.
pub fn prepare<'a>(sources: &[SourceInput<'a>]) -> Result<Vec<PreparedSource<'a>>> {
    sources
        .iter()
        .enumerate()
        .map(|(index, input)| prepare_source(index + 1, input.mapping, input.workbook))
        .collect()
}

/// Validates and materialises the source at 1-based `position`. The
/// prepared source owns its matrices, so `workbook` may be dropped once this
/// returns.
pub fn prepare_source<'a>(
    position: usize,
    mapping: &'a SourceMapping,
    workbook: Option<&Workbook>,
) -> Result<PreparedSource<'a>> {
    let workbook = workbook
        .ok_or_else(|| ConsolidateError::source_config(position, "no workbook is attached"))?;
    if mapping.source_sheet.is_empty() {
        return Err(ConsolidateError::source_config(position, "no sheet is selected"));
    }
    let sheet = workbook.sheet(&mapping.source_sheet).ok_or_else(|| {
        ConsolidateError::source_config(
            position,
            format!(
                "sheet '{}' not found in {}",
                mapping.source_sheet,
                workbook.name()
            ),
        )
    })?;

    let account = read_required(sheet, &mapping.account_range, position, Field::Account)?;
    let value = read_required(sheet, &mapping.value_range, position, Field::Value)?;

    if account.cols() != 1 {
        return Err(ConsolidateError::ShapeMismatch {
            location: FieldLocation::new(position, Field::Account),
            detail: format!(
                "range is {}; expected a single column",
                account.dimensions()
            ),
        });
    }
    if account.rows() != value.rows() {
        return Err(ConsolidateError::ShapeMismatch {
            location: FieldLocation::new(position, Field::Account),
            detail: format!(
                "range has {} row(s) but the Value range has {}",
                account.rows(),
                value.rows()
            ),
        });
    }

    let entity = classify(Axis::Entity, mapping.axis(Axis::Entity), &value, sheet, position)?;
    let department = classify(
        Axis::Department,
        mapping.axis(Axis::Department),
        &value,
        sheet,
        position,
    )?;
    let date = classify(Axis::Date, mapping.axis(Axis::Date), &value, sheet, position)?;
    check_multi_column([&entity, &department, &date], value.cols(), position)?;

    debug!(
        position,
        sheet = %mapping.source_sheet,
        rows = value.rows(),
        cols = value.cols(),
        entity = %entity.shape(),
        department = %department.shape(),
        date = %date.shape(),
        "source prepared"
    );

    let source_file = if mapping.source_path.is_empty() {
        workbook.name().to_string()
    } else {
        mapping.source_path.clone()
    };

    Ok(PreparedSource {
        position,
        mapping,
        source_file,
        account,
        value,
        entity,
        department,
        date,
    })
}

fn read_required(sheet: &Sheet, text: &str, position: usize, field: Field) -> Result<Matrix> {
    if text.trim().is_empty() {
        return Err(ConsolidateError::source_config(
            position,
            format!("{field} is missing"),
        ));
    }
    read_matrix(sheet, text, FieldLocation::new(position, field))
}

/// Generates rows for every prepared source in order.
pub fn expand(sources: &[PreparedSource<'_>]) -> Vec<ConsolidatedRow> {
    let mut rows = Vec::new();
    for source in sources {
        expand_source(source, &mut rows);
    }
    rows
}

/// Walks the Value positions of one source row by row, then column by
/// column, skipping blank accounts and non-numeric values. Returns the
/// number of rows appended.
pub fn expand_source(source: &PreparedSource<'_>, rows: &mut Vec<ConsolidatedRow>) -> usize {
    let before = rows.len();
    for row in 0..source.value.rows() {
        let account = source.account[(row, 0)].trimmed_text();
        if account.is_empty() {
            continue;
        }

        for col in 0..source.value.cols() {
            let Some(value) = parse_number(&source.value[(row, col)]) else {
                continue;
            };

            rows.push(ConsolidatedRow {
                account: account.clone(),
                entity: resolve_axis(&source.entity, row, col).trimmed_text(),
                department: resolve_axis(&source.department, row, col).trimmed_text(),
                date: resolve_axis(&source.date, row, col).clone(),
                value,
                source_file: source.source_file.clone(),
                source_sheet: source.sheet_name().to_string(),
            });
        }
    }

    let emitted = rows.len() - before;
    debug!(position = source.position, rows = emitted, "source expanded");
    emitted
}
