use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConsolidateError, Result};

/// Version tag written into new configuration documents.
pub const CONFIG_VERSION: u32 = 1;
/// Upper bound on the number of sources in one run.
pub const MAX_SOURCES: usize = 12;
/// File extension accepted for source and output workbooks.
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Header row of the consolidated output, in column order.
pub const OUTPUT_HEADERS: [&str; 7] = [
    "Account",
    "Entity",
    "Department",
    "Date",
    "Value",
    "SourceFile",
    "SourceSheet",
];

/// A raw cell value as read from a source workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No stored value.
    Empty,
    /// Native numeric value.
    Number(f64),
    /// Text value, untrimmed.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Date-like value, kept as the workbook's serial number.
    Date(f64),
}

impl Cell {
    /// Renders the cell as text for the descriptive columns.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(value) | Cell::Date(value) => value.to_string(),
            Cell::Text(value) => value.clone(),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
        }
    }

    /// Text form with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> String {
        match self {
            Cell::Text(value) => value.trim().to_string(),
            other => other.to_text(),
        }
    }
}

/// One of the descriptive dimensions attached to every Value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Entity,
    Department,
    Date,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Entity => write!(f, "Entity"),
            Axis::Department => write!(f, "Department"),
            Axis::Date => write!(f, "Date"),
        }
    }
}

/// A mapped field of a source block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Account,
    Value,
    Axis(Axis),
}

impl From<Axis> for Field {
    fn from(axis: Axis) -> Self {
        Field::Axis(axis)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Account => write!(f, "Account range"),
            Field::Value => write!(f, "Value range"),
            Field::Axis(axis) => write!(f, "{axis}"),
        }
    }
}

/// Identifies a field of a source by its 1-based position in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    pub position: usize,
    pub field: Field,
}

impl FieldLocation {
    pub fn new(position: usize, field: impl Into<Field>) -> Self {
        Self {
            position,
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source {}, {}", self.position, self.field)
    }
}

/// How an axis is supplied by a source block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    #[default]
    Blank,
    Constant,
    Range,
}

/// Borrowed view of one axis of a [`SourceMapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMapping<'a> {
    pub mode: AxisMode,
    pub constant: &'a str,
    pub range: &'a str,
}

/// Per-source mapping as persisted in the run configuration.
///
/// The opened workbook is deliberately not part of the mapping; it is
/// attached separately for each run and must be reselected after a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceMapping {
    pub source_path: String,
    pub source_sheet: String,
    pub account_range: String,
    pub value_range: String,
    pub entity_mode: AxisMode,
    pub entity_constant: String,
    pub entity_range: String,
    pub department_mode: AxisMode,
    pub department_constant: String,
    pub department_range: String,
    pub date_mode: AxisMode,
    pub date_constant: String,
    pub date_range: String,
}

impl Default for SourceMapping {
    fn default() -> Self {
        Self {
            source_path: String::new(),
            source_sheet: String::new(),
            account_range: String::new(),
            value_range: String::new(),
            entity_mode: AxisMode::Blank,
            entity_constant: String::new(),
            entity_range: String::new(),
            department_mode: AxisMode::Blank,
            department_constant: String::new(),
            department_range: String::new(),
            date_mode: AxisMode::Constant,
            date_constant: String::new(),
            date_range: String::new(),
        }
    }
}

impl SourceMapping {
    /// Creates an empty mapping for the given workbook path.
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Self::default()
        }
    }

    /// Returns the mapping of a single axis.
    pub fn axis(&self, axis: Axis) -> AxisMapping<'_> {
        match axis {
            Axis::Entity => AxisMapping {
                mode: self.entity_mode,
                constant: &self.entity_constant,
                range: &self.entity_range,
            },
            Axis::Department => AxisMapping {
                mode: self.department_mode,
                constant: &self.department_constant,
                range: &self.department_range,
            },
            Axis::Date => AxisMapping {
                mode: self.date_mode,
                constant: &self.date_constant,
                range: &self.date_range,
            },
        }
    }

    /// Sets the mode, constant and range of a single axis.
    pub fn set_axis(
        &mut self,
        axis: Axis,
        mode: AxisMode,
        constant: impl Into<String>,
        range: impl Into<String>,
    ) {
        let (slot_mode, slot_constant, slot_range) = match axis {
            Axis::Entity => (
                &mut self.entity_mode,
                &mut self.entity_constant,
                &mut self.entity_range,
            ),
            Axis::Department => (
                &mut self.department_mode,
                &mut self.department_constant,
                &mut self.department_range,
            ),
            Axis::Date => (
                &mut self.date_mode,
                &mut self.date_constant,
                &mut self.date_range,
            ),
        };
        *slot_mode = mode;
        *slot_constant = constant.into();
        *slot_range = range.into();
    }

    /// Rejects a configured path that does not name a workbook. An empty
    /// path is left for preparation to report.
    pub fn validate_path(&self, position: usize) -> Result<()> {
        if !self.source_path.is_empty() && !is_workbook_path(&self.source_path) {
            return Err(ConsolidateError::source_config(
                position,
                format!(
                    "source file '{}' must be a .{WORKBOOK_EXTENSION} workbook",
                    self.source_path
                ),
            ));
        }
        Ok(())
    }
}

/// Full run configuration: the unit of save and load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub version: u32,
    pub created_at_utc: DateTime<Utc>,
    pub output_file_name: String,
    pub sources: Vec<SourceMapping>,
}

impl RunConfig {
    /// Creates a configuration stamped with the current version and time.
    pub fn new(output_file_name: impl Into<String>, sources: Vec<SourceMapping>) -> Self {
        Self {
            version: CONFIG_VERSION,
            created_at_utc: Utc::now(),
            output_file_name: output_file_name.into(),
            sources,
        }
    }

    /// Requires between 1 and [`MAX_SOURCES`] sources.
    pub fn validate_source_count(&self) -> Result<()> {
        if self.sources.is_empty() || self.sources.len() > MAX_SOURCES {
            return Err(ConsolidateError::run_config(format!(
                "between 1 and {MAX_SOURCES} sources are required, found {}",
                self.sources.len()
            )));
        }
        Ok(())
    }

    /// Requires the configured output file name to name a workbook.
    pub fn validate_output_name(&self) -> Result<()> {
        if self.output_file_name.trim().is_empty() {
            return Err(ConsolidateError::run_config("output file name is missing"));
        }
        if !is_workbook_path(&self.output_file_name) {
            return Err(ConsolidateError::run_config(format!(
                "output file '{}' must be a .{WORKBOOK_EXTENSION} workbook",
                self.output_file_name
            )));
        }
        Ok(())
    }
}

/// Returns true when the path carries the supported workbook extension.
pub fn is_workbook_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(WORKBOOK_EXTENSION))
}

/// One normalized output record.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRow {
    pub account: String,
    pub entity: String,
    pub department: String,
    /// Raw Date value, never converted.
    pub date: Cell,
    pub value: f64,
    pub source_file: String,
    pub source_sheet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(count: usize) -> RunConfig {
        let sources = (0..count)
            .map(|i| SourceMapping::new(format!("book{i}.xlsx")))
            .collect();
        RunConfig::new("out.xlsx", sources)
    }

    #[test]
    fn axis_accessors_address_the_named_fields() {
        let mut mapping = SourceMapping::new("a.xlsx");
        mapping.set_axis(Axis::Department, AxisMode::Range, "", "B1:C1");
        mapping.set_axis(Axis::Date, AxisMode::Constant, " 2026-01-31 ", "");

        assert_eq!(mapping.department_mode, AxisMode::Range);
        assert_eq!(mapping.department_range, "B1:C1");
        assert_eq!(mapping.axis(Axis::Date).constant, " 2026-01-31 ");
        assert_eq!(mapping.axis(Axis::Entity).mode, AxisMode::Blank);
    }

    #[test]
    fn validate_enforces_source_bounds() {
        assert!(config_with(1).validate_source_count().is_ok());
        assert!(config_with(MAX_SOURCES).validate_source_count().is_ok());

        let err = config_with(0).validate_source_count().unwrap_err();
        assert!(matches!(err, ConsolidateError::Configuration { .. }));
        let err = config_with(MAX_SOURCES + 1).validate_source_count().unwrap_err();
        assert!(err.to_string().contains("found 13"));
    }

    #[test]
    fn validate_rejects_non_workbook_paths() {
        let err = SourceMapping::new("data.csv").validate_path(2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "source 2: source file 'data.csv' must be a .xlsx workbook"
        );
        assert!(SourceMapping::default().validate_path(1).is_ok());

        let mut config = config_with(1);
        config.output_file_name = "out.xls".into();
        assert!(config.validate_output_name().is_err());
        config.output_file_name = " ".into();
        assert_eq!(
            config.validate_output_name().unwrap_err().to_string(),
            "configuration: output file name is missing"
        );

        config.output_file_name = "OUT.XLSX".into();
        assert!(config.validate_output_name().is_ok());
    }

    #[test]
    fn trimmed_text_only_trims_text() {
        assert_eq!(Cell::Text("  4000 ".into()).trimmed_text(), "4000");
        assert_eq!(Cell::Number(4000.0).trimmed_text(), "4000");
        assert_eq!(Cell::Empty.trimmed_text(), "");
    }
}
