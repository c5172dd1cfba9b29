use std::fs;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use sheet_consolidator::ConsolidateError;
use sheet_consolidator::io::config;
use sheet_consolidator::io::excel_read::Workbook;
use sheet_consolidator::io::excel_write::OUTPUT_SHEET;
use sheet_consolidator::model::{Axis, AxisMode, Cell, OUTPUT_HEADERS, RunConfig, SourceMapping};
use sheet_consolidator::run::Consolidator;
use tempfile::tempdir;

fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

fn write_fixture(path: &Path, sheet_name: &str, rows: Vec<Vec<Cell>>) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).expect("sheet named");
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match cell {
                Cell::Number(value) => {
                    worksheet.write_number(r, c, *value).expect("number written");
                }
                Cell::Text(value) => {
                    worksheet.write_string(r, c, value).expect("string written");
                }
                Cell::Empty => {}
                other => panic!("unsupported fixture cell {other:?}"),
            }
        }
    }
    workbook.save(path).expect("fixture saved");
}

fn read_output(path: &Path) -> Vec<Vec<Cell>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("output opened");
    let range = workbook
        .worksheet_range(OUTPUT_SHEET)
        .expect("output sheet present")
        .expect("output sheet read");
    range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect()
}

/// Two differently shaped sources: an unpivoted Department header row and a
/// trial balance with a Department column.
fn fixture_config(dir: &Path) -> RunConfig {
    write_fixture(
        &dir.join("north.xlsx"),
        "Jan",
        vec![
            vec![text("Account"), text("East"), text("West")],
            vec![text("4000"), Cell::Number(100.0), Cell::Number(200.0)],
            vec![text("  "), Cell::Number(5.0), Cell::Number(6.0)],
            vec![text("4200"), text("(50)"), text("n/a")],
        ],
    );
    write_fixture(
        &dir.join("south.xlsx"),
        "TB",
        vec![
            vec![Cell::Number(5000.0), text("Ops"), Cell::Number(10.0), Cell::Empty, text(" South Co ")],
            vec![Cell::Number(5100.0), text("Sales"), Cell::Number(0.0)],
        ],
    );

    let mut north = SourceMapping::new("north.xlsx");
    north.source_sheet = "Jan".into();
    north.account_range = "A2:A4".into();
    north.value_range = "B2:C4".into();
    north.set_axis(Axis::Entity, AxisMode::Constant, "North", "");
    north.set_axis(Axis::Department, AxisMode::Range, "", "Jan!$B$1:$C$1");
    north.set_axis(Axis::Date, AxisMode::Constant, "2026-01-31", "");

    let mut south = SourceMapping::new("south.xlsx");
    south.source_sheet = "TB".into();
    south.account_range = "a1:a2".into();
    south.value_range = "C1:C2".into();
    south.set_axis(Axis::Entity, AxisMode::Range, "", "E1");
    south.set_axis(Axis::Department, AxisMode::Range, "", "B1:B2");
    south.set_axis(Axis::Date, AxisMode::Constant, "2026-01-31", "");

    RunConfig::new("consolidated.xlsx", vec![north, south])
}

#[test]
fn consolidates_sources_into_one_table() {
    let temp_dir = tempdir().expect("temporary directory");
    let run_config = fixture_config(temp_dir.path());

    let summary = Consolidator::new()
        .run(&run_config, temp_dir.path(), None)
        .expect("run succeeded");
    assert_eq!(summary.row_count, 5);

    let output = temp_dir.path().join("consolidated.xlsx");
    assert_eq!(summary.output.as_deref(), Some(output.as_path()));

    let table = read_output(&output);
    let headers: Vec<Cell> = OUTPUT_HEADERS.iter().map(|h| text(h)).collect();
    assert_eq!(table[0], headers);

    let date = text("2026-01-31");
    let expected = vec![
        vec![text("4000"), text("North"), text("East"), date.clone(), Cell::Number(100.0), text("north.xlsx"), text("Jan")],
        vec![text("4000"), text("North"), text("West"), date.clone(), Cell::Number(200.0), text("north.xlsx"), text("Jan")],
        vec![text("4200"), text("North"), text("East"), date.clone(), Cell::Number(-50.0), text("north.xlsx"), text("Jan")],
        vec![text("5000"), text("South Co"), text("Ops"), date.clone(), Cell::Number(10.0), text("south.xlsx"), text("TB")],
        vec![text("5100"), text("South Co"), text("Sales"), date, Cell::Number(0.0), text("south.xlsx"), text("TB")],
    ];
    assert_eq!(&table[1..], expected.as_slice());
}

#[test]
fn rerun_overwrites_output_with_identical_rows() {
    let temp_dir = tempdir().expect("temporary directory");
    let run_config = fixture_config(temp_dir.path());
    let output = temp_dir.path().join("custom.xlsx");
    fs::write(&output, b"stale").expect("stale output written");

    let consolidator = Consolidator::new();
    consolidator
        .run(&run_config, temp_dir.path(), Some(&output))
        .expect("first run");
    let first = read_output(&output);
    consolidator
        .run(&run_config, temp_dir.path(), Some(&output))
        .expect("second run");
    let second = read_output(&output);

    assert_eq!(first.len(), 6);
    assert_eq!(first, second);
}

#[test]
fn failing_source_writes_no_output() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut run_config = fixture_config(temp_dir.path());
    run_config.sources[1].department_range = "B1:C2".into();

    let err = Consolidator::new()
        .run(&run_config, temp_dir.path(), None)
        .expect_err("shape mismatch");

    assert!(matches!(err, ConsolidateError::ShapeMismatch { .. }));
    assert!(err.to_string().starts_with("source 2, Department:"));
    assert!(!temp_dir.path().join("consolidated.xlsx").exists());
}

#[test]
fn dry_run_reports_shapes_without_writing() {
    let temp_dir = tempdir().expect("temporary directory");
    let run_config = fixture_config(temp_dir.path());

    let summary = Consolidator::new()
        .check(&run_config, temp_dir.path())
        .expect("dry run");

    assert_eq!(summary.row_count, 5);
    assert_eq!(summary.output, None);
    let per_source: Vec<usize> = summary.sources.iter().map(|source| source.rows).collect();
    assert_eq!(per_source, vec![3, 2]);
    assert_eq!(summary.sources[0].department.to_string(), "multiColumn");
    assert_eq!(summary.sources[1].entity.to_string(), "singleCell");
    assert_eq!(summary.sources[1].department.to_string(), "singleColumn");
    assert!(!temp_dir.path().join("consolidated.xlsx").exists());
}

#[test]
fn saved_configuration_runs_after_reload() {
    let temp_dir = tempdir().expect("temporary directory");
    let run_config = fixture_config(temp_dir.path());
    let config_path = temp_dir.path().join("run.json");

    config::save(&config_path, &run_config).expect("configuration saved");
    let restored = config::load(&config_path).expect("configuration loaded");
    assert_eq!(restored, run_config);

    let summary = Consolidator::new()
        .check(&restored, temp_dir.path())
        .expect("dry run");
    assert_eq!(summary.row_count, 5);
}

#[test]
fn workbook_bytes_expose_the_same_sheets() {
    let temp_dir = tempdir().expect("temporary directory");
    fixture_config(temp_dir.path());
    let path = temp_dir.path().join("south.xlsx");

    let opened = Workbook::open(&path).expect("workbook opened");
    let bytes = fs::read(&path).expect("workbook bytes");
    let from_bytes = Workbook::from_bytes("south.xlsx", bytes).expect("workbook parsed");

    assert_eq!(opened.name(), "south.xlsx");
    assert_eq!(opened.sheet_names(), from_bytes.sheet_names());
    let sheet = from_bytes.sheet("TB").expect("sheet present");
    assert_eq!(sheet.cell(0, 4), text(" South Co "));
    assert_eq!(sheet.cell(1, 2), Cell::Number(0.0));
    assert_eq!(sheet.cell(50, 50), Cell::Empty);
}

#[test]
fn raw_calamine_values_convert_to_cells() {
    assert_eq!(Cell::from(&DataType::Float(1.5)), Cell::Number(1.5));
    assert_eq!(Cell::from(&DataType::String("x".into())), text("x"));
}
