//! Continuous Lotka-Volterra reference model, integrated with forward Euler.

use ecosim_core::{LotkaVolterraConfig, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub struct LotkaVolterra {
    config: LotkaVolterraConfig,
}

impl LotkaVolterra {
    pub fn new(config: LotkaVolterraConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LotkaVolterraConfig {
        &self.config
    }

    /// Advance `(prey, predators)` by one `dt`. Both derivatives use the
    /// populations from the start of the step; results are clamped at zero.
    pub fn advance(&self, prey: f64, predators: f64) -> (f64, f64) {
        let c = &self.config;
        let prey_rate = c.birth_rate * prey - c.predation_rate * prey * predators;
        let predator_rate = c.efficiency * prey * predators - c.death_rate * predators;

        (
            (prey + prey_rate * c.dt).max(0.0),
            (predators + predator_rate * c.dt).max(0.0),
        )
    }

    /// Integrate `num_steps` steps from the configured initial populations.
    /// The first sample is the initial state at `t = 0`.
    #[instrument(skip(self))]
    pub fn simulate(&self, num_steps: usize) -> TimeSeries {
        let mut series = TimeSeries::with_capacity(num_steps + 1);
        let mut prey = self.config.initial_prey;
        let mut predators = self.config.initial_predators;
        series.push(0.0, prey, predators);

        for step in 1..=num_steps {
            (prey, predators) = self.advance(prey, predators);
            series.push(step as f64 * self.config.dt, prey, predators);
        }

        debug!(
            event = "ode_complete",
            samples = series.len(),
            final_prey = prey,
            final_predators = predators,
            "Lotka-Volterra integration complete"
        );

        series
    }
}

/// Sampled population trajectory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub time: Vec<f64>,
    #[serde(rename = "prey_pop")]
    pub prey: Vec<f64>,
    #[serde(rename = "pred_pop")]
    pub predators: Vec<f64>,
}

impl TimeSeries {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            prey: Vec::with_capacity(capacity),
            predators: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, time: f64, prey: f64, predators: f64) {
        self.time.push(time);
        self.prey.push(prey);
        self.predators.push(predators);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
