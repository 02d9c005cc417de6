//! The three trading postures an agent can hold.
//!
//! A strategy is both a label and a numeric coefficient: the sign value
//! feeds directly into the transition-probability and excess-demand
//! formulas, and a zero sign identifies the fundamentalist case when the
//! transition model selects between its two structural branches.

use serde::{Deserialize, Serialize};

/// One of the three discrete trading strategies.
///
/// Each variant carries an integer sign used as a coefficient in the
/// transition and demand formulas: fundamentalist = 0, technical
/// optimist = +1, technical pessimist = -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Trades on the gap between price and fundamental value. Sign 0.
    Fundamentalist,
    /// Technical trader betting on the trend continuing up. Sign +1.
    TechnicalOptimist,
    /// Technical trader betting on the trend continuing down. Sign -1.
    TechnicalPessimist,
}

impl Strategy {
    /// All strategies, in the iteration order used for probe diagnostics
    /// (optimist, fundamentalist, pessimist).
    pub const ALL: [Self; 3] = [
        Self::TechnicalOptimist,
        Self::Fundamentalist,
        Self::TechnicalPessimist,
    ];

    /// The sign coefficient of this strategy.
    pub const fn sign(self) -> i8 {
        match self {
            Self::Fundamentalist => 0,
            Self::TechnicalOptimist => 1,
            Self::TechnicalPessimist => -1,
        }
    }

    /// Whether this strategy is one of the two technical postures.
    pub const fn is_technical(self) -> bool {
        !matches!(self, Self::Fundamentalist)
    }
}

impl core::fmt::Display for Strategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Fundamentalist => "Fundamentalist",
            Self::TechnicalOptimist => "TechnicalOptimist",
            Self::TechnicalPessimist => "TechnicalPessimist",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_match_variants() {
        assert_eq!(Strategy::Fundamentalist.sign(), 0);
        assert_eq!(Strategy::TechnicalOptimist.sign(), 1);
        assert_eq!(Strategy::TechnicalPessimist.sign(), -1);
    }

    #[test]
    fn only_fundamentalist_has_zero_sign() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.sign() == 0, !strategy.is_technical());
        }
    }

    #[test]
    fn all_lists_each_variant_once() {
        assert_eq!(Strategy::ALL.len(), 3);
        assert!(Strategy::ALL.contains(&Strategy::Fundamentalist));
        assert!(Strategy::ALL.contains(&Strategy::TechnicalOptimist));
        assert!(Strategy::ALL.contains(&Strategy::TechnicalPessimist));
    }

    #[test]
    fn display_names_are_stable() {
        // Probe diagnostic keys are built from these names; changing them
        // changes the metrics schema.
        assert_eq!(Strategy::TechnicalOptimist.to_string(), "TechnicalOptimist");
        assert_eq!(Strategy::Fundamentalist.to_string(), "Fundamentalist");
        assert_eq!(Strategy::TechnicalPessimist.to_string(), "TechnicalPessimist");
    }
}
