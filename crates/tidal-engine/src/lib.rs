//! tidal-engine — the consistency decision pipeline.
//!
//! Each decision cycle walks every registered service in registry order
//! and runs a fixed sequence of guard-then-mutate rules against it. Later
//! rules see (and may undo) what earlier rules did to the same record.
//!
//! # Rule Pipeline
//!
//! ```text
//! skip record entirely unless autopilot
//!
//! 1. load relief      !critical && rps > 400 && level != EVENTUAL
//!                       level = EVENTUAL, reward += 10, saved += 15.5ms
//! 2. protection       critical && rps > 480
//!                       notice only
//! 3. integrity        type in {PAYMENT, INVENTORY} && level != STRONG
//!                       level = STRONG, reward += 5
//! 4. upgrade          (otherwise) rps < 100 && level == EVENTUAL
//!                       level = SESSION
//! ```
//!
//! Every rule that fires overwrites the fleet's `last_decision`, so only
//! the last message of a cycle survives there. Reward only ever grows.

pub mod cycle;
pub mod rules;

pub use cycle::{CycleReport, DecisionEngine};
pub use rules::{evaluate, DecisionEvent, Evaluation, FleetContext, Rule};
