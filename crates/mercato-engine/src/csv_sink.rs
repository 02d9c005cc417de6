//! Streaming CSV metrics sink.
//!
//! Appends one row per simulation step to `model_vars.csv`. The file is
//! shared across all runs of a driver invocation: the header is written
//! once at creation and a leading `run` column tells the rows apart. The
//! `transitions` diagnostic map is serialized as a JSON object in its own
//! column so the row stays flat.

use std::fs::File;
use std::path::Path;

use mercato_core::metrics::{MetricsError, MetricsSink};
use mercato_types::StepRecord;

use crate::error::EngineError;

/// Column headers, in row order. The record fields follow after `run`.
const HEADERS: [&str; 15] = [
    "run",
    "step",
    "optimists",
    "pessimists",
    "price",
    "nf",
    "technical_fraction",
    "slope",
    "opinion_index",
    "edt",
    "edf",
    "ed",
    "ept",
    "epf",
    "transitions",
];

/// Metrics sink that streams step records into a CSV file.
#[derive(Debug)]
pub struct CsvSink {
    writer: csv::Writer<File>,
    run: u32,
}

impl CsvSink {
    /// Create the CSV file at `path`, truncating any existing content, and
    /// write the header row.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Csv`] if the file cannot be created or the
    /// header cannot be written.
    pub fn create(path: &Path) -> Result<Self, EngineError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(HEADERS)?;
        writer.flush().map_err(csv::Error::from)?;
        Ok(Self { writer, run: 0 })
    }

    /// Tag all subsequent rows with the given run index.
    pub const fn start_run(&mut self, run: u32) {
        self.run = run;
    }

    /// Flush buffered rows to disk.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Csv`] if the flush fails.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

impl MetricsSink for CsvSink {
    fn record(&mut self, record: &StepRecord) -> Result<(), MetricsError> {
        let transitions = serde_json::to_string(&record.transitions).map_err(write_error)?;
        self.writer
            .write_record([
                self.run.to_string(),
                record.step.to_string(),
                record.optimists.to_string(),
                record.pessimists.to_string(),
                record.price.to_string(),
                record.nf.to_string(),
                record.technical_fraction.to_string(),
                record.slope.to_string(),
                record.opinion_index.to_string(),
                record.edt.to_string(),
                record.edf.to_string(),
                record.ed.to_string(),
                record.ept.to_string(),
                record.epf.to_string(),
                transitions,
            ])
            .map_err(write_error)?;
        Ok(())
    }
}

fn write_error(source: impl std::fmt::Display) -> MetricsError {
    MetricsError::Write {
        message: source.to_string(),
    }
}
