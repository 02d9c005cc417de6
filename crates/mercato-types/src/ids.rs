//! Trader identifiers.
//!
//! Traders carry stable integer ids for the lifetime of a run. Negative
//! ids are reserved for the three probe traders that sample transition
//! probabilities for diagnostics without ever joining the population.

use serde::{Deserialize, Serialize};

/// Stable identifier for a trader.
///
/// Scheduled traders use ids `0..n`; probe traders use negative ids and
/// are never visited by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraderId(pub i64);

impl TraderId {
    /// Create an id from a raw integer.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the inner integer value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Whether this id belongs to a probe trader (negative ids).
    pub const fn is_probe(self) -> bool {
        self.0 < 0
    }
}

impl core::fmt::Display for TraderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
