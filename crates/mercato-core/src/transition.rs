//! Encounter-based strategy-switching probabilities.
//!
//! The transition model computes the probability that a trader abandons its
//! current strategy for an encountered one within a single step, together
//! with the utility differential `U` driving the decision. Two structurally
//! distinct cases exist, selected by whether a fundamentalist is involved
//! (either sign is zero) or both traders are technical:
//!
//! - **Fundamentalist <-> technical**: the exponent weighs the technical
//!   excess profit `(r + slope) / price - R` against the fundamentalist
//!   mispricing profit `s * |price - p_f| / price`.
//! - **Technical <-> technical**: the exponent weighs the opinion index and
//!   the price trend, `a1 * opinion_index + a2 * slope / v1`.
//!
//! The resulting hazard `p = freq * exp(U / freq) * dt` is deliberately not
//! clamped to `[0, 1]`: it is only ever used as a Bernoulli threshold, where
//! values above 1 simply mean a certain switch, and the raw value stays
//! observable for diagnostics.
//!
//! All three sub-computations are pure in their scalar arguments and are
//! memoized in bounded LRU caches keyed by exact argument bit patterns.

use mercato_types::Strategy;

use crate::cache::LruCache;
use crate::config::ModelConfig;

/// Capacity of each memoization cache, large enough to hold every distinct
/// argument combination arising within a run's typical state space.
const CACHE_CAPACITY: usize = 1 << 16;

/// Errors from transition evaluation.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// A transition between identical strategies was requested. This
    /// signals a scheduling bug and must abort the run.
    #[error("cannot evaluate a transition between identical strategies ({strategy})")]
    SameStrategy {
        /// The strategy passed as both endpoints.
        strategy: Strategy,
    },
}

/// Transition-probability model with bounded memoization.
///
/// The formulas are pure functions of their scalar inputs; the caches make
/// repeated evaluations under an unchanged market state cheap. One model
/// instance belongs to one run (caches are never shared across runs).
#[derive(Debug, Clone)]
pub struct TransitionModel {
    dt: f64,
    v1: f64,
    v2: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    r: f64,
    big_r: f64,
    s: f64,
    fundamental_price: f64,
    pick_strategy: bool,
    u_opinion_cache: LruCache<(u64, u64), f64>,
    u_strategy_cache: LruCache<(u64, u64, i8), f64>,
    p_cache: LruCache<(u64, u64, u64), f64>,
}

impl TransitionModel {
    /// Build a model from the switching section of the configuration.
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            dt: config.simulation.dt,
            v1: config.switching.v1,
            v2: config.switching.v2,
            a1: config.switching.a1,
            a2: config.switching.a2,
            a3: config.switching.a3,
            r: config.switching.r,
            big_r: config.switching.big_r,
            s: config.switching.s,
            fundamental_price: config.market.fundamental_price,
            pick_strategy: config.simulation.pick_strategy,
            u_opinion_cache: LruCache::new(CACHE_CAPACITY),
            u_strategy_cache: LruCache::new(CACHE_CAPACITY),
            p_cache: LruCache::new(CACHE_CAPACITY),
        }
    }

    /// Probability and utility for switching from `current` to
    /// `encountered` under the given market signals.
    ///
    /// Returns `(p, U)` where `p` is the unclamped per-step transition
    /// probability. When fundamentalist/technical switching is globally
    /// disabled, that case short-circuits to `(0, 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::SameStrategy`] if `current` equals
    /// `encountered` -- switching onto the same strategy is undefined.
    pub fn transition_probability(
        &mut self,
        current: Strategy,
        encountered: Strategy,
        price: f64,
        slope: f64,
        opinion_index: f64,
    ) -> Result<(f64, f64), TransitionError> {
        if current == encountered {
            return Err(TransitionError::SameStrategy { strategy: current });
        }

        let (u, frequency) = if current.sign() == 0 || encountered.sign() == 0 {
            // A fundamentalist is involved.
            if !self.pick_strategy {
                return Ok((0.0, 0.0));
            }
            let coeff = if current.sign() == 0 {
                encountered.sign()
            } else {
                current.sign()
            };
            let u_strategy = self.u_strategy(price, slope, coeff);
            // +U moving fundamentalist -> technical, -U the other way.
            let direction = f64::from(encountered.sign().abs()) - f64::from(current.sign().abs());
            (direction * u_strategy, self.v2)
        } else {
            // Two technical traders revising their opinion.
            let u_opinion = self.u_opinion(opinion_index, slope);
            (f64::from(encountered.sign()) * u_opinion, self.v1)
        };

        let p = self.p_transition(frequency, 1.0, u);
        Ok((p, u))
    }

    /// Opinion-change exponent `a1 * opinion_index + a2 * slope / v1`.
    fn u_opinion(&mut self, opinion_index: f64, slope: f64) -> f64 {
        let key = (opinion_index.to_bits(), slope.to_bits());
        if let Some(cached) = self.u_opinion_cache.get(&key) {
            return cached;
        }
        let value = self.a1 * opinion_index + self.a2 * slope / self.v1;
        self.u_opinion_cache.insert(key, value);
        value
    }

    /// Strategy-change exponent weighing technical against fundamentalist
    /// excess profit. A zero price yields 0 (documented division policy).
    fn u_strategy(&mut self, price: f64, slope: f64, coeff: i8) -> f64 {
        let key = (price.to_bits(), slope.to_bits(), coeff);
        if let Some(cached) = self.u_strategy_cache.get(&key) {
            return cached;
        }
        let value = if price == 0.0 {
            0.0
        } else {
            // Excess profit per unit by technical traders.
            let ept = (self.r + slope) / price - self.big_r;
            // Excess profit per unit by fundamentalists.
            let epf = self.s * (price - self.fundamental_price).abs() / price;
            self.a3 * (f64::from(coeff) * ept - epf)
        };
        self.u_strategy_cache.insert(key, value);
        value
    }

    /// Exponential hazard rate scaled to a per-step probability.
    fn p_transition(&mut self, frequency: f64, fraction: f64, u: f64) -> f64 {
        let key = (frequency.to_bits(), fraction.to_bits(), u.to_bits());
        if let Some(cached) = self.p_cache.get(&key) {
            return cached;
        }
        let value = fraction * frequency * (u / frequency).exp() * self.dt;
        self.p_cache.insert(key, value);
        value
    }
}
