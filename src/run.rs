use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};

use crate::dimension::Shape;
use crate::engine::{self, PreparedSource};
use crate::error::{ConsolidateError, Result};
use crate::io::excel_read::Workbook;
use crate::io::excel_write;
use crate::model::{ConsolidatedRow, RunConfig, SourceMapping, WORKBOOK_EXTENSION, is_workbook_path};

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub row_count: usize,
    pub sources: Vec<SourceSummary>,
    /// Written workbook; `None` for a dry run.
    pub output: Option<PathBuf>,
}

/// Resolved shapes and emitted row count of one prepared source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub position: usize,
    pub source_file: String,
    pub sheet: String,
    /// Rows this source contributed to the output.
    pub rows: usize,
    pub value_rows: usize,
    pub value_cols: usize,
    pub entity: Shape,
    pub department: Shape,
    pub date: Shape,
}

/// Runs consolidations one at a time.
///
/// A request made while another run holds the consolidator is rejected
/// with [`ConsolidateError::RunInProgress`] rather than queued.
#[derive(Debug, Default)]
pub struct Consolidator {
    running: AtomicBool,
}

impl Consolidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Consolidates every source and writes the output workbook.
    ///
    /// Relative paths in `config` resolve against `base_dir`. `output`
    /// overrides the configured output file name, which is then not checked.
    #[instrument(
        level = "info",
        skip_all,
        fields(base_dir = %base_dir.display(), sources = config.sources.len())
    )]
    pub fn run(
        &self,
        config: &RunConfig,
        base_dir: &Path,
        output: Option<&Path>,
    ) -> Result<RunSummary> {
        let _guard = RunGuard::acquire(&self.running)?;

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => {
                config.validate_output_name()?;
                base_dir.join(&config.output_file_name)
            }
        };
        if !is_workbook_path(&output.to_string_lossy()) {
            return Err(ConsolidateError::run_config(format!(
                "output file '{}' must be a .{WORKBOOK_EXTENSION} workbook",
                output.display()
            )));
        }

        let (rows, sources) = consolidate(config, base_dir)?;
        excel_write::write_rows(&output, &rows)?;
        info!(rows = rows.len(), output = %output.display(), "consolidated workbook written");

        Ok(RunSummary {
            row_count: rows.len(),
            sources,
            output: Some(output),
        })
    }

    /// Performs a full run without writing any output.
    #[instrument(
        level = "info",
        skip_all,
        fields(base_dir = %base_dir.display(), sources = config.sources.len())
    )]
    pub fn check(&self, config: &RunConfig, base_dir: &Path) -> Result<RunSummary> {
        let _guard = RunGuard::acquire(&self.running)?;
        config.validate_output_name()?;
        let (rows, sources) = consolidate(config, base_dir)?;
        info!(rows = rows.len(), "dry run complete");

        Ok(RunSummary {
            row_count: rows.len(),
            sources,
            output: None,
        })
    }
}

fn consolidate(
    config: &RunConfig,
    base_dir: &Path,
) -> Result<(Vec<ConsolidatedRow>, Vec<SourceSummary>)> {
    config.validate_source_count()?;

    // Each workbook is opened and released within its own source's pass so
    // that failures surface in configured order.
    let prepared = config
        .sources
        .iter()
        .enumerate()
        .map(|(index, mapping)| {
            let position = index + 1;
            mapping.validate_path(position)?;
            let workbook = open_source(position, mapping, base_dir)?;
            engine::prepare_source(position, mapping, workbook.as_ref())
        })
        .collect::<Result<Vec<PreparedSource<'_>>>>()?;
    info!(sources = prepared.len(), "sources prepared");

    let mut rows = Vec::new();
    let summaries = prepared
        .iter()
        .map(|source| SourceSummary {
            position: source.position,
            source_file: source.source_file.clone(),
            sheet: source.sheet_name().to_string(),
            rows: engine::expand_source(source, &mut rows),
            value_rows: source.value.rows(),
            value_cols: source.value.cols(),
            entity: source.entity.shape(),
            department: source.department.shape(),
            date: source.date.shape(),
        })
        .collect();

    Ok((rows, summaries))
}

/// Opens the workbook of a source with a configured path. A source without
/// a path stays detached and fails during preparation.
fn open_source(
    position: usize,
    mapping: &SourceMapping,
    base_dir: &Path,
) -> Result<Option<Workbook>> {
    if mapping.source_path.is_empty() {
        return Ok(None);
    }
    let path = base_dir.join(&mapping.source_path);
    if !path.exists() {
        return Err(ConsolidateError::source_config(
            position,
            format!("source file '{}' not found", path.display()),
        ));
    }
    debug!(position, path = %path.display(), "opening source workbook");
    Workbook::open(&path).map(Some).map_err(|err| {
        ConsolidateError::source_config(
            position,
            format!("cannot read '{}': {err}", path.display()),
        )
    })
}

struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self> {
        if running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("run requested while another run is in progress");
            return Err(ConsolidateError::RunInProgress);
        }
        Ok(Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
