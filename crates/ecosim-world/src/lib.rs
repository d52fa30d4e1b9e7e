//! Predator-prey simulation engine.
//!
//! This module implements the agent-based toroidal grid where prey and
//! predators move, hunt, breed and starve, plus the Lotka-Volterra model
//! used as a continuous reference.

pub mod animal;
pub mod lotka_volterra;
pub mod simulation;

pub use animal::Animal;
pub use lotka_volterra::{LotkaVolterra, TimeSeries};
pub use simulation::{EcosystemSimulator, SimulationResult, StepReport};
