//! The single-step simulation cycle.
//!
//! Each step runs through these phases, strictly in order:
//!
//! 1. **Agents** -- visit every scheduled trader exactly once, in a freshly
//!    randomized order, letting each sample an encounter and possibly
//!    switch strategy. Within-step outcomes are order-dependent by design:
//!    `opinion_index` and the population counts update mid-step as traders
//!    switch, while `price` and `slope` stay fixed until phase 3.
//! 2. **Slope refresh** -- recompute the price trend from the history,
//!    which does not yet contain this step's price, so the trend traders
//!    observe lags the price update by one step.
//! 3. **Price update** (optional) -- excess demand plus Gaussian noise
//!    moves the price with probability `|beta * (ed + noise)|`.
//! 4. **Append** -- push the (possibly updated) price onto the history.
//! 5. **Snapshot** -- assemble the step's [`StepRecord`], including the
//!    probe traders' transition diagnostics for all six ordered strategy
//!    pairs.
//!
//! The cycle is deterministic given the run seed: every random draw comes
//! from the one generator owned by the [`Simulation`].

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use mercato_types::{StepRecord, Strategy, TraderId, TransitionProbe};

use crate::agent::Trader;
use crate::config::{ConfigError, ModelConfig};
use crate::market::MarketState;
use crate::transition::{TransitionError, TransitionModel};

/// Errors that can occur during step execution.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The transition model rejected an evaluation. Signals a scheduling
    /// bug; the run must abort.
    #[error("transition error: {source}")]
    Transition {
        /// The underlying transition error.
        #[from]
        source: TransitionError,
    },

    /// The step counter would overflow.
    #[error("step counter overflow: cannot advance beyond u64::MAX")]
    StepOverflow,
}

/// One complete simulation run: market, traders, probes, transition model,
/// and the run's random generator.
#[derive(Debug)]
pub struct Simulation {
    market: MarketState,
    traders: Vec<Trader>,
    probes: [Trader; 3],
    model: TransitionModel,
    rng: StdRng,
    step: u64,
    update_price: bool,
}

impl Simulation {
    /// Build a run from the configuration and a run seed.
    ///
    /// Traders get ids `0..n`; the initial strategy assignment fills the
    /// optimist block first, then the pessimists, then the
    /// fundamentalists. The three probe traders (negative ids) are created
    /// alongside but never scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: &ModelConfig, seed: u64) -> Result<Self, ConfigError> {
        let market = MarketState::new(config)?;

        let optimists = market.count(Strategy::TechnicalOptimist);
        let nt0 = config.market.nt0;
        let traders = (0..config.market.n)
            .map(|i| {
                let strategy = if i < optimists {
                    Strategy::TechnicalOptimist
                } else if i < nt0 {
                    Strategy::TechnicalPessimist
                } else {
                    Strategy::Fundamentalist
                };
                Trader::new(TraderId::new(i64::from(i)), strategy)
            })
            .collect();

        let probes = [
            Trader::new(TraderId::new(-1), Strategy::TechnicalOptimist),
            Trader::new(TraderId::new(-2), Strategy::TechnicalPessimist),
            Trader::new(TraderId::new(-3), Strategy::Fundamentalist),
        ];

        Ok(Self {
            market,
            traders,
            probes,
            model: TransitionModel::new(config),
            rng: StdRng::seed_from_u64(seed),
            step: 0,
            update_price: config.simulation.update_price,
        })
    }

    /// The current step number (0 before the first step).
    pub const fn step_count(&self) -> u64 {
        self.step
    }

    /// Read access to the market state.
    pub const fn market(&self) -> &MarketState {
        &self.market
    }

    /// The scheduled (non-probe) traders.
    pub fn traders(&self) -> &[Trader] {
        &self.traders
    }

    /// Advance the simulation by one step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Transition`] on a transition invariant
    /// violation, or [`StepError::StepOverflow`] if the step counter
    /// would exceed `u64::MAX`.
    pub fn run_step(&mut self) -> Result<StepRecord, StepError> {
        self.step = self.step.checked_add(1).ok_or(StepError::StepOverflow)?;
        debug!(step = self.step, "Step started");

        // --- Phase 1: agents, in a fresh random order ---
        let mut order: Vec<usize> = (0..self.traders.len()).collect();
        order.shuffle(&mut self.rng);
        for idx in order {
            let Some(trader) = self.traders.get_mut(idx) else {
                continue;
            };
            trader.step(&mut self.market, &mut self.model, &mut self.rng)?;
        }

        // --- Phase 2: slope refresh (history excludes this step's price) ---
        self.market.refresh_slope();

        // --- Phase 3: optional price update ---
        if self.update_price {
            self.market.update_price(&mut self.rng);
        }

        // --- Phase 4: append the step's price ---
        self.market.append_price();

        // --- Phase 5: snapshot ---
        let transitions = self.probe_transitions()?;
        let record = self.snapshot(transitions);
        debug!(
            step = record.step,
            nf = record.nf,
            optimists = record.optimists,
            pessimists = record.pessimists,
            price = record.price,
            "Step finished"
        );
        Ok(record)
    }

    /// Evaluate the transition probability for every ordered pair of
    /// distinct strategies through the probe traders.
    fn probe_transitions(
        &mut self,
    ) -> Result<BTreeMap<String, TransitionProbe>, TransitionError> {
        let mut probes = BTreeMap::new();
        for probe in &self.probes {
            for target in Strategy::ALL {
                if target == probe.strategy() {
                    continue;
                }
                let (p, u) = self.model.transition_probability(
                    probe.strategy(),
                    target,
                    self.market.price(),
                    self.market.slope(),
                    self.market.opinion_index(),
                )?;
                probes.insert(
                    format!("{}->{}", probe.strategy(), target),
                    TransitionProbe { p, u },
                );
            }
        }
        Ok(probes)
    }

    /// Assemble the step's aggregate record from the current market state.
    fn snapshot(&self, transitions: BTreeMap<String, TransitionProbe>) -> StepRecord {
        StepRecord {
            step: self.step,
            optimists: self.market.count(Strategy::TechnicalOptimist),
            pessimists: self.market.count(Strategy::TechnicalPessimist),
            price: self.market.price(),
            nf: self.market.count(Strategy::Fundamentalist),
            technical_fraction: self.market.technical_fraction(),
            slope: self.market.slope(),
            opinion_index: self.market.opinion_index(),
            edt: self.market.edt(),
            edf: self.market.edf(),
            ed: self.market.ed(),
            ept: self.market.ept(),
            epf: self.market.epf(),
            transitions,
        }
    }
}
