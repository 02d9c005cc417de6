//! Multi-step run loop.
//!
//! Wraps the single-step [`run_step`] cycle into a bounded run that feeds
//! every step record to a metrics sink. One run is strictly sequential and
//! order-dependent; independent runs (different seeds) share no mutable
//! state and may be distributed externally.
//!
//! [`run_step`]: crate::scheduler::Simulation::run_step

use tracing::info;

use mercato_types::StepRecord;

use crate::metrics::{MetricsError, MetricsSink};
use crate::scheduler::{Simulation, StepError};

/// Errors that can occur during a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A step execution failed.
    #[error("step error: {source}")]
    Step {
        /// The underlying step error.
        #[from]
        source: StepError,
    },

    /// The metrics sink failed.
    #[error("metrics error: {source}")]
    Metrics {
        /// The underlying metrics error.
        #[from]
        source: MetricsError,
    },
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of steps executed.
    pub steps: u64,
    /// The final step's record, if any step completed.
    pub final_record: Option<StepRecord>,
}

/// Execute `n_steps` steps, forwarding each record to the sink.
///
/// # Errors
///
/// Returns [`RunError::Step`] if a step fails (a transition invariant
/// violation aborts the run rather than being skipped), or
/// [`RunError::Metrics`] if the sink cannot persist a record.
pub fn run_simulation(
    simulation: &mut Simulation,
    n_steps: u64,
    sink: &mut dyn MetricsSink,
) -> Result<RunSummary, RunError> {
    info!(n_steps, n = simulation.market().n(), "Run starting");

    let mut final_record = None;
    for _ in 0..n_steps {
        let record = simulation.run_step()?;
        sink.record(&record)?;
        final_record = Some(record);
    }

    let summary = RunSummary {
        steps: simulation.step_count(),
        final_record,
    };
    info!(
        steps = summary.steps,
        final_price = summary.final_record.as_ref().map(|r| r.price),
        "Run finished"
    );
    Ok(summary)
}
