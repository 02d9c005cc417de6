//! Metrics sink boundary.
//!
//! The simulation produces one [`StepRecord`] per step and hands it to a
//! [`MetricsSink`]. Sinks are external collaborators: the core only
//! requires streaming append, never that the full run fit in memory. An
//! in-memory sink is provided for tests and small runs; the engine binary
//! supplies a streaming CSV sink.

use mercato_types::StepRecord;

/// Errors a metrics sink can raise.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The sink failed to persist a record.
    #[error("metrics sink write failed: {message}")]
    Write {
        /// Description of the underlying failure.
        message: String,
    },
}

/// Receiver for one aggregate state record per simulation step.
pub trait MetricsSink {
    /// Record one step's snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Write`] if the record cannot be persisted.
    fn record(&mut self, record: &StepRecord) -> Result<(), MetricsError>;
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<StepRecord>,
}

impl MemorySink {
    /// Create an empty sink.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// The records collected so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Consume the sink, yielding the collected records.
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, record: &StepRecord) -> Result<(), MetricsError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record(&mut self, _record: &StepRecord) -> Result<(), MetricsError> {
        Ok(())
    }
}
