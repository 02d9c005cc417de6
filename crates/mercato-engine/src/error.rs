//! Error types for the run-driver binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during driver startup and run execution.

/// Top-level error for the run-driver binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: mercato_core::config::ConfigError,
    },

    /// A simulation run failed.
    #[error("run error: {source}")]
    Run {
        /// The underlying run error.
        #[from]
        source: mercato_core::runner::RunError,
    },

    /// The output directory or CSV file could not be prepared.
    #[error("output error: {source}")]
    Output {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The CSV writer failed.
    #[error("csv error: {source}")]
    Csv {
        /// The underlying CSV error.
        #[from]
        source: csv::Error,
    },
}
