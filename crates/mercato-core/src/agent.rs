//! Trader agents.
//!
//! A trader holds nothing but a stable id and its current strategy label;
//! every aggregate quantity lives in [`MarketState`]. Once per step a
//! trader samples an encountered strategy from the current population mix,
//! asks the transition model for a switching probability, and possibly
//! relabels itself through [`MarketState::switch`].

use rand::Rng;
use tracing::debug;

use mercato_types::{Strategy, TraderId};

use crate::market::MarketState;
use crate::transition::{TransitionError, TransitionModel};

/// A single boundedly-rational trader.
///
/// Traders are created once at market construction and never destroyed;
/// only the strategy label mutates over the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trader {
    id: TraderId,
    strategy: Strategy,
}

impl Trader {
    /// Create a trader with the given id and starting strategy.
    pub const fn new(id: TraderId, strategy: Strategy) -> Self {
        Self { id, strategy }
    }

    /// The trader's stable id.
    pub const fn id(&self) -> TraderId {
        self.id
    }

    /// The trader's current strategy.
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Execute one encounter-and-possibly-switch action.
    ///
    /// The encounter is always sampled first so the random stream stays
    /// stable regardless of whether the trader subsequently acts. A trader
    /// whose own group is at or below the population floor holds its
    /// strategy for the step (a deliberate silent skip, not an error).
    ///
    /// # Errors
    ///
    /// Propagates [`TransitionError`] from the transition model; this only
    /// occurs on a scheduling bug and must abort the run.
    pub fn step(
        &mut self,
        market: &mut MarketState,
        model: &mut TransitionModel,
        rng: &mut impl Rng,
    ) -> Result<(), TransitionError> {
        let encountered = sample_encounter(market, rng);

        if market.count(self.strategy) <= market.min_trader() {
            debug!(
                trader = %self.id,
                strategy = %self.strategy,
                "Population floor reached, trader holds"
            );
            return Ok(());
        }

        if encountered != self.strategy {
            let (p, u) = model.transition_probability(
                self.strategy,
                encountered,
                market.price(),
                market.slope(),
                market.opinion_index(),
            )?;
            debug!(trader = %self.id, from = %self.strategy, to = %encountered, u, p, "Transition evaluated");
            if rng.random::<f64>() < p {
                self.switch(market, encountered);
            }
        }

        Ok(())
    }

    /// Relabel this trader, notifying the market first so the counts and
    /// the opinion index stay authoritative.
    fn switch(&mut self, market: &mut MarketState, new: Strategy) {
        market.switch(self.strategy, new);
        self.strategy = new;
    }
}

/// Sample an encountered strategy proportionally to the current population
/// counts (fundamentalists first, then optimists, then pessimists).
///
/// This reproduces the current population mix -- a draw with replacement,
/// not a finite-population draw.
fn sample_encounter(market: &MarketState, rng: &mut impl Rng) -> Strategy {
    let draw = rng.random::<f64>() * f64::from(market.n());
    let nf = f64::from(market.count(Strategy::Fundamentalist));
    let optimists = f64::from(market.count(Strategy::TechnicalOptimist));

    if draw < nf {
        Strategy::Fundamentalist
    } else if draw < nf + optimists {
        Strategy::TechnicalOptimist
    } else {
        Strategy::TechnicalPessimist
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::ModelConfig;

    fn fixture() -> (MarketState, TransitionModel) {
        let config = ModelConfig::default();
        (
            MarketState::new(&config).unwrap(),
            TransitionModel::new(&config),
        )
    }

    #[test]
    fn encounter_sampling_follows_population_mix() {
        let (market, _) = fixture();
        let mut rng = SmallRng::seed_from_u64(42);

        let mut fundamentalists = 0_u32;
        let mut technicals = 0_u32;
        for _ in 0..10_000 {
            match sample_encounter(&market, &mut rng) {
                Strategy::Fundamentalist => fundamentalists += 1,
                Strategy::TechnicalOptimist | Strategy::TechnicalPessimist => technicals += 1,
            }
        }
        // 10% fundamentalists in the reference split; allow generous
        // sampling noise around the expectation of 1000.
        assert!(fundamentalists > 700 && fundamentalists < 1300);
        assert_eq!(fundamentalists + technicals, 10_000);
    }

    #[test]
    fn encounter_sampling_is_exhaustive_at_extremes() {
        let mut config = ModelConfig::default();
        config.market.nt0 = 0;
        let market = MarketState::new(&config).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(sample_encounter(&market, &mut rng), Strategy::Fundamentalist);
        }
    }

    #[test]
    fn population_floor_blocks_switching() {
        let mut config = ModelConfig::default();
        config.market.n = 10;
        config.market.nt0 = 6;
        config.simulation.min_trader = 5;
        let mut market = MarketState::new(&config).unwrap();
        let mut model = TransitionModel::new(&config);
        let mut rng = SmallRng::seed_from_u64(3);

        // Every group count (3, 3, 4) is at or below the floor, so no
        // trader can act.
        let mut trader = Trader::new(TraderId::new(0), Strategy::TechnicalOptimist);
        for _ in 0..200 {
            trader.step(&mut market, &mut model, &mut rng).unwrap();
        }
        assert_eq!(trader.strategy(), Strategy::TechnicalOptimist);
        assert_eq!(market.count(Strategy::TechnicalOptimist), 3);
    }

    #[test]
    fn switch_moves_exactly_one_trader() {
        let (mut market, _) = fixture();
        let mut trader = Trader::new(TraderId::new(5), Strategy::TechnicalOptimist);

        trader.switch(&mut market, Strategy::Fundamentalist);

        assert_eq!(trader.strategy(), Strategy::Fundamentalist);
        assert_eq!(market.count(Strategy::TechnicalOptimist), 224);
        assert_eq!(market.count(Strategy::Fundamentalist), 51);
        assert_eq!(market.count(Strategy::TechnicalPessimist), 225);
    }

    #[test]
    fn steep_trend_drives_pessimist_to_switch() {
        // A steep upward price ramp pushes the pessimist -> optimist hazard
        // far above 1, so the first optimist encounter must flip the trader.
        let (mut market, mut model) = fixture();
        let mut rng = SmallRng::seed_from_u64(11);

        for i in 1..=30_u32 {
            market.set_price_for_test(f64::from(i).mul_add(2.0, 10.0));
            market.append_price();
        }
        market.refresh_slope();
        assert!(market.slope() > 10.0);

        let (p, _) = model
            .transition_probability(
                Strategy::TechnicalPessimist,
                Strategy::TechnicalOptimist,
                market.price(),
                market.slope(),
                market.opinion_index(),
            )
            .unwrap();
        assert!(p > 1.0);

        let mut trader = Trader::new(TraderId::new(0), Strategy::TechnicalPessimist);
        let mut flipped = false;
        for _ in 0..1000 {
            trader.step(&mut market, &mut model, &mut rng).unwrap();
            if trader.strategy() != Strategy::TechnicalPessimist {
                flipped = true;
                break;
            }
        }
        assert!(flipped, "trader never left the pessimist camp");
    }
}
