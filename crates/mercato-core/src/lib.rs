//! Agent interaction and market-state update engine for the Mercato
//! artificial financial market.
//!
//! This crate owns the per-step stochastic strategy-switching protocol:
//! boundedly-rational traders encounter each other, compare strategies
//! through an exponential utility-differential model, and probabilistically
//! relabel themselves, while an aggregate excess-demand rule drives the
//! market price. The emergent output is a per-step stream of market state
//! used to study volatility clustering, fat tails, and unit-root price
//! behavior.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `mercato-config.yaml` into
//!   strongly-typed structs.
//! - [`cache`] -- Bounded least-recently-used cache backing the transition
//!   model's memoization.
//! - [`series`] -- Append-only price history with a capped-window trend
//!   estimator.
//! - [`transition`] -- [`TransitionModel`]: encounter-based switching
//!   exponents and probabilities.
//! - [`market`] -- [`MarketState`]: population counts, price dynamics, and
//!   aggregate demand quantities.
//! - [`agent`] -- [`Trader`]: one encounter-and-possibly-switch action per
//!   step.
//! - [`scheduler`] -- [`Simulation`] and the single-step cycle.
//! - [`runner`] -- The multi-step run loop feeding a metrics sink.
//! - [`metrics`] -- [`MetricsSink`] boundary trait and in-memory sink.
//!
//! [`TransitionModel`]: transition::TransitionModel
//! [`MarketState`]: market::MarketState
//! [`Trader`]: agent::Trader
//! [`Simulation`]: scheduler::Simulation
//! [`MetricsSink`]: metrics::MetricsSink

pub mod agent;
pub mod cache;
pub mod config;
pub mod market;
pub mod metrics;
pub mod runner;
pub mod scheduler;
pub mod series;
pub mod transition;
