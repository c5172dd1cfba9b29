//! Core library for the sheet-consolidator command line application.
//!
//! The library merges tabular records from independently shaped workbook
//! ranges into one normalized table. Workbook and configuration adapters
//! live under [`io`], range handling in [`range`] and [`matrix`], the
//! per-axis classification in [`dimension`], row generation in [`engine`],
//! and the orchestration of a whole run under [`run`].

pub mod dimension;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod matrix;
pub mod model;
pub mod range;
pub mod run;
pub mod value;

pub use error::{ConsolidateError, Result};
