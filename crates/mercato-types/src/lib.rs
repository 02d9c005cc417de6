//! Shared type definitions for the Mercato market simulation.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries in the Mercato workspace: the trading strategy label, the
//! trader identifier, and the per-step metrics record handed to sinks.
//!
//! # Modules
//!
//! - [`ids`] -- The [`TraderId`] wrapper (negative ids mark probe traders)
//! - [`strategy`] -- The three-variant [`Strategy`] enum with sign values
//! - [`record`] -- [`StepRecord`] and [`TransitionProbe`] metrics types

pub mod ids;
pub mod record;
pub mod strategy;

pub use ids::TraderId;
pub use record::{StepRecord, TransitionProbe};
pub use strategy::Strategy;
