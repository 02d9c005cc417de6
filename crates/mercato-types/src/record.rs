//! Per-step metrics record.
//!
//! One [`StepRecord`] is produced at the end of every simulation step and
//! handed to the configured metrics sink. The record is flat apart from the
//! probe-trader diagnostics, which map each ordered pair of distinct
//! strategies to the transition probability and utility the model would
//! assign it under the current market state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Diagnostic transition evaluation produced by a probe trader.
///
/// The probability is recorded unclamped: values above 1 are meaningful
/// ("certain switch") and deliberately kept observable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionProbe {
    /// Per-step transition probability (unclamped hazard value).
    pub p: f64,
    /// Signed utility differential driving the transition.
    pub u: f64,
}

/// Aggregate market state snapshot for one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step number (1-indexed; incremented before the snapshot).
    pub step: u64,
    /// Technical-optimist population count.
    pub optimists: u32,
    /// Technical-pessimist population count.
    pub pessimists: u32,
    /// Market price after this step's (optional) price update.
    pub price: f64,
    /// Fundamentalist population count.
    pub nf: u32,
    /// Fraction of the population holding a technical strategy.
    pub technical_fraction: f64,
    /// Finite-difference price trend over the configured lookback window.
    pub slope: f64,
    /// Normalized optimist/pessimist imbalance, in `[-1, 1]`.
    pub opinion_index: f64,
    /// Excess demand contributed by technical traders.
    pub edt: f64,
    /// Excess demand contributed by fundamentalists.
    pub edf: f64,
    /// Total excess demand (`edt + edf`).
    pub ed: f64,
    /// Diagnostic excess profit per unit for technical traders.
    pub ept: f64,
    /// Diagnostic excess profit per unit for fundamentalists.
    pub epf: f64,
    /// Probe-trader transition diagnostics, keyed `"<from>-><to>"` for all
    /// six ordered pairs of distinct strategies.
    pub transitions: BTreeMap<String, TransitionProbe>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_to_json() {
        let mut transitions = BTreeMap::new();
        transitions.insert(
            "TechnicalOptimist->Fundamentalist".to_owned(),
            TransitionProbe { p: 0.05, u: -0.2 },
        );
        let record = StepRecord {
            step: 1,
            optimists: 225,
            pessimists: 225,
            price: 10.0,
            nf: 50,
            technical_fraction: 0.9,
            slope: 0.0,
            opinion_index: 0.0,
            edt: 0.0,
            edf: 0.0,
            ed: 0.0,
            ept: 0.08,
            epf: 0.0,
            transitions,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: StepRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
