//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-species energy and reproduction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Starting energy for animals placed at initialization
    pub initial_energy: i32,
    /// Energy must be strictly above this to reproduce
    pub reproduce_threshold: i32,
    /// Chance per step that an eligible animal reproduces (0.0 to 1.0)
    pub reproduce_probability: f64,
    /// Energy given to a newborn
    pub offspring_energy: i32,
    /// Energy taken from the parent on reproduction
    pub reproduce_cost: i32,
}

impl SpeciesConfig {
    pub fn prey() -> Self {
        Self {
            initial_energy: 10,
            reproduce_threshold: 15,
            reproduce_probability: 0.1,
            offspring_energy: 10,
            reproduce_cost: 5,
        }
    }

    pub fn predator() -> Self {
        Self {
            initial_energy: 20,
            reproduce_threshold: 30,
            reproduce_probability: 0.05,
            offspring_energy: 20,
            reproduce_cost: 10,
        }
    }

    fn validate(&self, species: &str) -> Result<()> {
        if self.initial_energy <= 0 {
            return Err(Error::InvalidConfig(format!(
                "{species}.initial_energy must be positive, got {}",
                self.initial_energy
            )));
        }
        if self.offspring_energy <= 0 {
            return Err(Error::InvalidConfig(format!(
                "{species}.offspring_energy must be positive, got {}",
                self.offspring_energy
            )));
        }
        if self.reproduce_cost < 0 {
            return Err(Error::InvalidConfig(format!(
                "{species}.reproduce_cost must not be negative, got {}",
                self.reproduce_cost
            )));
        }
        check_probability(&format!("{species}.reproduce_probability"), self.reproduce_probability)
    }
}

/// Agent-based ecosystem parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Side length of the square toroidal grid
    pub grid_size: i32,
    /// Number of prey placed at initialization
    pub num_prey: usize,
    /// Number of predators placed at initialization
    pub num_predators: usize,
    /// Energy cost of a single move
    pub move_cost: i32,
    /// Energy a predator gains from eating one prey
    pub hunt_gain: i32,
    pub prey: SpeciesConfig,
    pub predator: SpeciesConfig,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            num_prey: 100,
            num_predators: 20,
            move_cost: 1,
            hunt_gain: 15,
            prey: SpeciesConfig::prey(),
            predator: SpeciesConfig::predator(),
        }
    }
}

impl EcosystemConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.move_cost < 0 {
            return Err(Error::InvalidConfig(format!(
                "move_cost must not be negative, got {}",
                self.move_cost
            )));
        }
        if self.hunt_gain < 0 {
            return Err(Error::InvalidConfig(format!(
                "hunt_gain must not be negative, got {}",
                self.hunt_gain
            )));
        }
        self.prey.validate("prey")?;
        self.predator.validate("predator")
    }
}

/// Lotka-Volterra reference model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotkaVolterraConfig {
    /// Prey growth rate in the absence of predators
    pub birth_rate: f64,
    /// Predator decline rate in the absence of prey
    pub death_rate: f64,
    /// Rate at which encounters remove prey
    pub predation_rate: f64,
    /// Rate at which encounters produce predators
    pub efficiency: f64,
    /// Integration time step
    pub dt: f64,
    pub initial_prey: f64,
    pub initial_predators: f64,
}

impl Default for LotkaVolterraConfig {
    fn default() -> Self {
        Self {
            birth_rate: 0.1,
            death_rate: 0.05,
            predation_rate: 0.002,
            efficiency: 0.001,
            dt: 0.1,
            initial_prey: 100.0,
            initial_predators: 20.0,
        }
    }
}

impl LotkaVolterraConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        let non_negative = [
            ("birth_rate", self.birth_rate),
            ("death_rate", self.death_rate),
            ("predation_rate", self.predation_rate),
            ("efficiency", self.efficiency),
            ("initial_prey", self.initial_prey),
            ("initial_predators", self.initial_predators),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of steps to run
    pub num_steps: u64,
    /// Random seed; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Log progress every this many steps
    pub progress_interval: u64,
    /// Report one pair of bars every this many recorded steps
    pub report_interval: usize,
    /// Width in characters of the longest bar
    pub bar_width: usize,
    pub ecosystem: EcosystemConfig,
    pub lotka_volterra: LotkaVolterraConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_steps: 300,
            seed: None,
            progress_interval: 50,
            report_interval: 10,
            bar_width: 30,
            ecosystem: EcosystemConfig::default(),
            lotka_volterra: LotkaVolterraConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig =
            serde_json::from_str(&contents).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(Error::InvalidConfig(
                "progress_interval must be positive".to_string(),
            ));
        }
        if self.report_interval == 0 {
            return Err(Error::InvalidConfig(
                "report_interval must be positive".to_string(),
            ));
        }
        if self.bar_width == 0 {
            return Err(Error::InvalidConfig("bar_width must be positive".to_string()));
        }
        self.ecosystem.validate()?;
        self.lotka_volterra.validate()
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
