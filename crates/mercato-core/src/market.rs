//! Aggregate market state: population counts, price dynamics, and derived
//! demand quantities.
//!
//! The market owns the authoritative population counts per strategy --
//! traders hold only a label and call [`MarketState::switch`] to relabel
//! themselves, so the counts can never diverge from the agent population.
//! The sum of the three counts is invariant for the whole run.
//!
//! # Division policies
//!
//! Two denominators can legitimately reach zero. Both cases are defined as
//! 0 rather than propagating a NaN:
//!
//! - `opinion_index` when no technical traders exist;
//! - the excess-profit ratios when the price is exactly 0.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use mercato_types::Strategy;

use crate::config::{ConfigError, ModelConfig};
use crate::series::PriceSeries;

/// Mutable aggregate state of the simulated market.
#[derive(Debug, Clone)]
pub struct MarketState {
    n: u32,
    nf: u32,
    optimists: u32,
    pessimists: u32,
    price: f64,
    series: PriceSeries,
    slope: f64,
    opinion_index: f64,
    fundamental_price: f64,
    min_trader: u32,
    slope_window: u32,
    dt: f64,
    // Excess-demand parameters. Weights are per capita (tc / n, tf / n).
    beta: f64,
    tc_weight: f64,
    tf_weight: f64,
    price_scale: f64,
    noise: Normal<f64>,
    // Diagnostic excess-profit coefficients.
    r: f64,
    big_r: f64,
    s: f64,
    v2: f64,
}

impl MarketState {
    /// Create the market with the configured initial population split and
    /// price. Technical traders split evenly between optimists and
    /// pessimists (odd remainder to the pessimists).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration violates a
    /// structural constraint (including a negative noise deviation).
    pub fn new(config: &ModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let n = config.market.n;
        let nt0 = config.market.nt0;
        let optimists = nt0 / 2;
        let pessimists = nt0.saturating_sub(optimists);
        let nf = config.nf0();

        let noise =
            Normal::new(0.0, config.demand.sigma).map_err(|err| ConfigError::Invalid {
                reason: format!("demand noise distribution: {err}"),
            })?;

        let n_f64 = f64::from(n);

        Ok(Self {
            n,
            nf,
            optimists,
            pessimists,
            price: config.market.p0,
            series: PriceSeries::new(config.market.p0),
            slope: 0.0,
            opinion_index: 0.0,
            fundamental_price: config.market.fundamental_price,
            min_trader: config.simulation.min_trader,
            slope_window: config.simulation.slope_window,
            dt: config.simulation.dt,
            beta: config.demand.beta,
            tc_weight: config.demand.tc / n_f64,
            tf_weight: config.demand.tf / n_f64,
            price_scale: config.simulation.price_scale,
            noise,
            r: config.switching.r,
            big_r: config.switching.big_r,
            s: config.switching.s,
            v2: config.switching.v2,
        })
    }

    /// Total number of traders.
    pub const fn n(&self) -> u32 {
        self.n
    }

    /// Current market price.
    pub const fn price(&self) -> f64 {
        self.price
    }

    /// Price trend as of the last refresh (lagged by one step).
    pub const fn slope(&self) -> f64 {
        self.slope
    }

    /// Normalized optimist/pessimist imbalance, 0 when no technicals exist.
    pub const fn opinion_index(&self) -> f64 {
        self.opinion_index
    }

    /// Population floor below which traders hold their strategy.
    pub const fn min_trader(&self) -> u32 {
        self.min_trader
    }

    /// Population count for one strategy.
    pub const fn count(&self, strategy: Strategy) -> u32 {
        match strategy {
            Strategy::Fundamentalist => self.nf,
            Strategy::TechnicalOptimist => self.optimists,
            Strategy::TechnicalPessimist => self.pessimists,
        }
    }

    /// Number of technical traders (optimists plus pessimists).
    pub const fn technical_count(&self) -> u32 {
        self.optimists.saturating_add(self.pessimists)
    }

    /// Fraction of the population holding a technical strategy.
    pub fn technical_fraction(&self) -> f64 {
        f64::from(self.technical_count()) / f64::from(self.n)
    }

    /// Read access to the price history.
    pub const fn series(&self) -> &PriceSeries {
        &self.series
    }

    /// Relabel one trader from `old` to `new` and refresh the opinion
    /// index. This is the only path by which population counts change.
    pub fn switch(&mut self, old: Strategy, new: Strategy) {
        self.adjust(old, -1);
        self.adjust(new, 1);

        let nt = self.technical_count();
        self.opinion_index = if nt == 0 {
            // No technical traders: the imbalance is undefined, define it
            // as neutral.
            0.0
        } else {
            (f64::from(self.optimists) - f64::from(self.pessimists)) / f64::from(nt)
        };
    }

    fn adjust(&mut self, strategy: Strategy, delta: i32) {
        let count = match strategy {
            Strategy::Fundamentalist => &mut self.nf,
            Strategy::TechnicalOptimist => &mut self.optimists,
            Strategy::TechnicalPessimist => &mut self.pessimists,
        };
        *count = count.saturating_add_signed(delta);
    }

    /// Diagnostic excess profit per unit for technical traders,
    /// `(r + slope / v2) / price - R`. 0 when the price is 0.
    pub fn ept(&self) -> f64 {
        if self.price == 0.0 {
            return 0.0;
        }
        (self.r + self.slope / self.v2) / self.price - self.big_r
    }

    /// Diagnostic excess profit per unit for fundamentalists,
    /// `s * |price - p_f| / price`. 0 when the price is 0.
    pub fn epf(&self) -> f64 {
        if self.price == 0.0 {
            return 0.0;
        }
        self.s * ((self.price - self.fundamental_price) / self.price).abs()
    }

    /// Excess demand from technical traders.
    pub fn edt(&self) -> f64 {
        (f64::from(self.optimists) - f64::from(self.pessimists)) * self.tc_weight
    }

    /// Excess demand from fundamentalists.
    pub fn edf(&self) -> f64 {
        f64::from(self.nf) * self.tf_weight * (self.fundamental_price - self.price)
    }

    /// Total excess demand.
    pub fn ed(&self) -> f64 {
        self.edt() + self.edf()
    }

    /// Recompute the slope from the price history. Called once per step,
    /// before the step's price is appended, so the trend traders observe
    /// lags the price update by one step.
    pub fn refresh_slope(&mut self) {
        self.slope = self.series.slope(self.slope_window, self.dt);
    }

    /// Stochastic price update driven by excess demand.
    ///
    /// Draws Gaussian noise, forms `U = beta * (ed + noise)`, and applies
    /// `price += U * price_scale` with probability `|U|` (clamped only at
    /// the Bernoulli decision). Consumes exactly one Gaussian and one
    /// uniform draw.
    pub fn update_price(&mut self, rng: &mut impl Rng) {
        let mu = self.noise.sample(rng);
        let u = self.beta * (self.ed() + mu);
        let p_update = u.abs();

        debug!(
            edt = self.edt(),
            edf = self.edf(),
            ed = self.ed(),
            noise = mu,
            p_update,
            "Price update drawn"
        );

        if rng.random::<f64>() < p_update {
            self.price += u * self.price_scale;
        }
    }

    /// Append the current price to the history.
    pub fn append_price(&mut self) {
        self.series.push(self.price);
    }

    /// Force the price to an arbitrary value. Test-only state setup.
    #[cfg(test)]
    pub(crate) const fn set_price_for_test(&mut self, price: f64) {
        self.price = price;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn market() -> MarketState {
        MarketState::new(&ModelConfig::default()).unwrap()
    }

    #[test]
    fn initial_split_follows_configuration() {
        let market = market();
        assert_eq!(market.count(Strategy::TechnicalOptimist), 225);
        assert_eq!(market.count(Strategy::TechnicalPessimist), 225);
        assert_eq!(market.count(Strategy::Fundamentalist), 50);
        assert_eq!(market.technical_count(), 450);
        assert_relative_eq!(market.technical_fraction(), 0.9);
    }

    #[test]
    fn odd_split_gives_remainder_to_pessimists() {
        let mut config = ModelConfig::default();
        config.market.n = 10;
        config.market.nt0 = 7;
        let market = MarketState::new(&config).unwrap();
        assert_eq!(market.count(Strategy::TechnicalOptimist), 3);
        assert_eq!(market.count(Strategy::TechnicalPessimist), 4);
        assert_eq!(market.count(Strategy::Fundamentalist), 3);
    }

    #[test]
    fn switch_conserves_population() {
        let mut market = market();
        let total = market.n();

        market.switch(Strategy::TechnicalOptimist, Strategy::Fundamentalist);
        market.switch(Strategy::Fundamentalist, Strategy::TechnicalPessimist);
        market.switch(Strategy::TechnicalPessimist, Strategy::TechnicalOptimist);

        let sum = market.count(Strategy::Fundamentalist)
            + market.count(Strategy::TechnicalOptimist)
            + market.count(Strategy::TechnicalPessimist);
        assert_eq!(sum, total);
    }

    #[test]
    fn switch_refreshes_opinion_index() {
        let mut market = market();
        assert_relative_eq!(market.opinion_index(), 0.0);

        market.switch(Strategy::TechnicalPessimist, Strategy::TechnicalOptimist);
        // 226 optimists vs 224 pessimists over 450 technicals.
        assert_relative_eq!(market.opinion_index(), 2.0 / 450.0, max_relative = 1e-12);
        assert!(market.opinion_index() > -1.0 && market.opinion_index() < 1.0);
    }

    #[test]
    fn opinion_index_defined_when_technicals_vanish() {
        let mut config = ModelConfig::default();
        config.market.n = 2;
        config.market.nt0 = 1;
        let mut market = MarketState::new(&config).unwrap();
        // The single technical trader (a pessimist, from the odd split)
        // becomes a fundamentalist.
        market.switch(Strategy::TechnicalPessimist, Strategy::Fundamentalist);
        assert_eq!(market.technical_count(), 0);
        assert_relative_eq!(market.opinion_index(), 0.0);
    }

    #[test]
    fn demand_components_match_closed_form() {
        let mut market = market();
        // Move 10 pessimists to the optimist camp: 235 vs 215.
        for _ in 0..10 {
            market.switch(Strategy::TechnicalPessimist, Strategy::TechnicalOptimist);
        }
        // edt = (235 - 215) * (2 / 500) = 0.08; price at fundamental so
        // edf = 0.
        assert_relative_eq!(market.edt(), 0.08, max_relative = 1e-12);
        assert_relative_eq!(market.edf(), 0.0);
        assert_relative_eq!(market.ed(), 0.08, max_relative = 1e-12);
    }

    #[test]
    fn fundamentalist_demand_opposes_mispricing() {
        let mut config = ModelConfig::default();
        config.market.p0 = 12.0;
        let market = MarketState::new(&config).unwrap();
        // 50 fundamentalists * (1 / 500) * (10 - 12) = -0.2.
        assert_relative_eq!(market.edf(), -0.2, max_relative = 1e-12);
    }

    #[test]
    fn diagnostic_excess_profits_match_closed_form() {
        let mut config = ModelConfig::default();
        config.market.p0 = 12.0;
        let mut market = MarketState::new(&config).unwrap();
        market.slope = 0.5;
        // ept = (0.12 + 0.5 / 1.0) / 12 - 0.04; epf = 0.85 * 2 / 12.
        assert_relative_eq!(market.ept(), 0.62 / 12.0 - 0.04, max_relative = 1e-12);
        assert_relative_eq!(market.epf(), 0.85 * 2.0 / 12.0, max_relative = 1e-12);
    }

    #[test]
    fn zero_price_profits_are_defined() {
        let mut config = ModelConfig::default();
        config.market.p0 = 0.0;
        let market = MarketState::new(&config).unwrap();
        assert_relative_eq!(market.ept(), 0.0);
        assert_relative_eq!(market.epf(), 0.0);
    }

    #[test]
    fn price_update_is_reproducible_per_seed() {
        let mut market_a = market();
        let mut market_b = market();
        let mut rng_a = SmallRng::seed_from_u64(7);
        let mut rng_b = SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            market_a.update_price(&mut rng_a);
            market_b.update_price(&mut rng_b);
        }
        assert_eq!(market_a.price().to_bits(), market_b.price().to_bits());
    }

    #[test]
    fn slope_refresh_uses_history_window() {
        let mut market = market();
        for i in 1..30_u32 {
            market.price = f64::from(i).mul_add(0.1, 10.0);
            market.append_price();
        }
        market.refresh_slope();
        // Linear ramp of 0.1 per step over window 20, dt 0.1: the base sits
        // 19 increments behind the last value.
        assert_relative_eq!(market.slope(), 0.95, max_relative = 1e-12);
    }
}
