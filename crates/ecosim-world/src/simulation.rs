//! Agent-based predator-prey simulation on a toroidal grid.

use crate::animal::Animal;
use ecosim_core::{Direction, EcosystemConfig, Error, Position, Result, Species, SpeciesConfig};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

const DEFAULT_PROGRESS_INTERVAL: u64 = 50;

pub struct EcosystemSimulator<R: Rng = ChaCha8Rng> {
    config: EcosystemConfig,
    prey: Vec<Animal>,
    predators: Vec<Animal>,
    prey_history: Vec<usize>,
    predator_history: Vec<usize>,
    rng: R,
    steps: u64,
    progress_interval: u64,
}

impl EcosystemSimulator<ChaCha8Rng> {
    /// Create a simulator seeded from the operating system
    pub fn new(config: EcosystemConfig) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Create a simulator whose whole run is determined by `seed`
    pub fn with_seed(config: EcosystemConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> EcosystemSimulator<R> {
    /// Create a simulator drawing from `rng`, placing `num_prey` prey and
    /// `num_predators` predators on uniformly random cells.
    pub fn with_rng(config: EcosystemConfig, mut rng: R) -> Result<Self> {
        config.validate()?;

        let grid_size = config.grid_size;
        let prey = (0..config.num_prey)
            .map(|_| Animal::new(random_position(grid_size, &mut rng), config.prey.initial_energy))
            .collect();
        let predators = (0..config.num_predators)
            .map(|_| {
                Animal::new(
                    random_position(grid_size, &mut rng),
                    config.predator.initial_energy,
                )
            })
            .collect();

        Ok(Self::assemble(config, prey, predators, rng))
    }

    /// Create a simulator from explicitly placed animals.
    ///
    /// `num_prey` and `num_predators` in `config` are ignored.
    pub fn from_populations(
        config: EcosystemConfig,
        prey: Vec<Animal>,
        predators: Vec<Animal>,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;

        for (species, population) in [(Species::Prey, &prey), (Species::Predator, &predators)] {
            for animal in population {
                if !animal.position.in_bounds(config.grid_size) {
                    return Err(Error::InvalidConfig(format!(
                        "{species} at ({}, {}) is outside a grid of size {}",
                        animal.x(),
                        animal.y(),
                        config.grid_size
                    )));
                }
                if !animal.is_alive() {
                    return Err(Error::InvalidConfig(format!(
                        "{species} at ({}, {}) has non-positive energy {}",
                        animal.x(),
                        animal.y(),
                        animal.energy
                    )));
                }
            }
        }

        Ok(Self::assemble(config, prey, predators, rng))
    }

    fn assemble(
        config: EcosystemConfig,
        prey: Vec<Animal>,
        predators: Vec<Animal>,
        rng: R,
    ) -> Self {
        Self {
            config,
            prey,
            predators,
            prey_history: Vec::new(),
            predator_history: Vec::new(),
            rng,
            steps: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Log progress every `interval` steps during `run`
    pub fn set_progress_interval(&mut self, interval: u64) {
        self.progress_interval = interval.max(1);
    }

    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    pub fn grid_size(&self) -> i32 {
        self.config.grid_size
    }

    pub fn prey(&self) -> &[Animal] {
        &self.prey
    }

    pub fn predators(&self) -> &[Animal] {
        &self.predators
    }

    pub fn prey_history(&self) -> &[usize] {
        &self.prey_history
    }

    pub fn predator_history(&self) -> &[usize] {
        &self.predator_history
    }

    /// Number of completed steps
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Species whose population is currently zero, prey first
    pub fn extinct_species(&self) -> Vec<Species> {
        let mut extinct = Vec::new();
        if self.prey.is_empty() {
            extinct.push(Species::Prey);
        }
        if self.predators.is_empty() {
            extinct.push(Species::Predator);
        }
        extinct
    }

    /// Move `animal` one cell in a random direction, paying the move cost
    pub fn move_animal(&mut self, animal: &mut Animal) {
        move_animal(animal, &self.config, &mut self.rng);
    }

    /// Run for up to `num_steps` steps, stopping after the first step that
    /// leaves either population empty.
    #[instrument(skip(self), fields(grid_size = self.config.grid_size))]
    pub fn run(&mut self, num_steps: u64) -> SimulationResult {
        info!(
            prey = self.prey.len(),
            predators = self.predators.len(),
            "Starting simulation for {} steps",
            num_steps
        );

        let mut steps_run = 0;
        for _ in 0..num_steps {
            let report = self.step();
            steps_run += 1;

            if report.step % self.progress_interval == 0 {
                info!(
                    event = "progress",
                    step = report.step,
                    prey = report.prey,
                    predators = report.predators,
                    "Step {}: {} prey, {} predators",
                    report.step,
                    report.prey,
                    report.predators
                );
            }

            if report.prey == 0 || report.predators == 0 {
                info!(
                    event = "extinction",
                    step = report.step,
                    prey = report.prey,
                    predators = report.predators,
                    "Simulation ended at step {}",
                    report.step
                );
                break;
            }
        }

        info!(
            event = "simulation_complete",
            steps_run = steps_run,
            total_steps = self.steps,
            prey = self.prey.len(),
            predators = self.predators.len(),
            "Simulation complete"
        );

        SimulationResult {
            steps_run,
            prey_history: self.prey_history.clone(),
            predator_history: self.predator_history.clone(),
            extinct: self.extinct_species(),
        }
    }

    /// Execute one simulation step
    pub fn step(&mut self) -> StepReport {
        for prey in &mut self.prey {
            move_animal(prey, &self.config, &mut self.rng);
        }
        let prey_born = reproduce(&mut self.prey, &self.config.prey, &mut self.rng);

        for predator in &mut self.predators {
            move_animal(predator, &self.config, &mut self.rng);
        }
        let prey_eaten = self.hunt();
        let predators_born = reproduce(&mut self.predators, &self.config.predator, &mut self.rng);

        let (prey_starved, predators_starved) = self.cull_starved();

        self.prey_history.push(self.prey.len());
        self.predator_history.push(self.predators.len());
        self.steps += 1;

        let report = StepReport {
            step: self.steps,
            prey_born,
            predators_born,
            prey_eaten,
            prey_starved,
            predators_starved,
            prey: self.prey.len(),
            predators: self.predators.len(),
        };

        debug!(
            event = "step",
            step = report.step,
            prey = report.prey,
            predators = report.predators,
            prey_born = report.prey_born,
            predators_born = report.predators_born,
            prey_eaten = report.prey_eaten,
            prey_starved = report.prey_starved,
            predators_starved = report.predators_starved,
            "Step complete"
        );

        report
    }

    /// Each predator, in order, eats the first unclaimed prey on its cell.
    /// Eaten prey are removed once every predator has hunted.
    fn hunt(&mut self) -> usize {
        let mut claimed = vec![false; self.prey.len()];
        let mut eaten = 0;

        for (predator_index, predator) in self.predators.iter_mut().enumerate() {
            let target = (0..self.prey.len())
                .find(|&i| !claimed[i] && self.prey[i].shares_cell_with(&*predator));

            if let Some(prey_index) = target {
                claimed[prey_index] = true;
                predator.add_energy(self.config.hunt_gain);
                eaten += 1;
                trace!(
                    event = "prey_eaten",
                    predator_index = predator_index,
                    prey_index = prey_index,
                    x = predator.x(),
                    y = predator.y(),
                    predator_energy = predator.energy,
                    "Predator ate prey"
                );
            }
        }

        if eaten > 0 {
            let mut index = 0;
            self.prey.retain(|_| {
                let keep = !claimed[index];
                index += 1;
                keep
            });
        }

        eaten
    }

    fn cull_starved(&mut self) -> (usize, usize) {
        let prey_before = self.prey.len();
        let predators_before = self.predators.len();

        self.prey.retain(Animal::is_alive);
        self.predators.retain(Animal::is_alive);

        (
            prey_before - self.prey.len(),
            predators_before - self.predators.len(),
        )
    }
}

fn random_position<R: Rng>(grid_size: i32, rng: &mut R) -> Position {
    let x = rng.gen_range(0..grid_size);
    let y = rng.gen_range(0..grid_size);
    Position::new(x, y)
}

fn move_animal<R: Rng>(animal: &mut Animal, config: &EcosystemConfig, rng: &mut R) {
    let direction = Direction::from_index(rng.gen_range(0..Direction::COUNT));
    move_in_direction(animal, direction, config);
}

fn move_in_direction(animal: &mut Animal, direction: Direction, config: &EcosystemConfig) {
    let (dx, dy) = direction.to_delta();
    animal.move_to(animal.position.add(dx, dy).wrap(config.grid_size));
    animal.spend_energy(config.move_cost);
}

/// Offspring are appended after the pass, so newborns are never evaluated
/// in the step they are born. A draw is consumed only for eligible parents.
fn reproduce<R: Rng>(population: &mut Vec<Animal>, species: &SpeciesConfig, rng: &mut R) -> usize {
    let mut offspring = Vec::new();

    for parent in population.iter_mut() {
        if parent.energy > species.reproduce_threshold
            && rng.gen::<f64>() < species.reproduce_probability
        {
            offspring.push(Animal::new(parent.position, species.offspring_energy));
            parent.spend_energy(species.reproduce_cost);
            trace!(
                event = "birth",
                x = parent.x(),
                y = parent.y(),
                parent_energy = parent.energy,
                "Animal reproduced"
            );
        }
    }

    let born = offspring.len();
    population.extend(offspring);
    born
}

/// Population changes recorded by a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based index of the step
    pub step: u64,
    pub prey_born: usize,
    pub predators_born: usize,
    pub prey_eaten: usize,
    pub prey_starved: usize,
    pub predators_starved: usize,
    /// Prey alive after the step
    pub prey: usize,
    /// Predators alive after the step
    pub predators: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Steps executed by this `run` call
    pub steps_run: u64,
    pub prey_history: Vec<usize>,
    pub predator_history: Vec<usize>,
    /// Species at zero when the run stopped
    pub extinct: Vec<Species>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn config(grid_size: i32, num_prey: usize, num_predators: usize) -> EcosystemConfig {
        EcosystemConfig {
            grid_size,
            num_prey,
            num_predators,
            ..Default::default()
        }
    }

    fn single_cell_sim(
        prey: Vec<i32>,
        predators: Vec<i32>,
    ) -> EcosystemSimulator<ChaCha8Rng> {
        let origin = Position::new(0, 0);
        EcosystemSimulator::from_populations(
            config(1, 0, 0),
            prey.into_iter().map(|e| Animal::new(origin, e)).collect(),
            predators.into_iter().map(|e| Animal::new(origin, e)).collect(),
            ChaCha8Rng::seed_from_u64(7),
        )
        .unwrap()
    }

    #[test]
    fn test_simulator_creation() {
        let sim = EcosystemSimulator::with_seed(config(10, 30, 5), 42).unwrap();

        assert_eq!(sim.prey().len(), 30);
        assert_eq!(sim.predators().len(), 5);
        assert!(sim.prey().iter().all(|a| a.energy == 10));
        assert!(sim.predators().iter().all(|a| a.energy == 20));
        assert!(sim
            .prey()
            .iter()
            .chain(sim.predators())
            .all(|a| a.position.in_bounds(10)));
        assert!(sim.prey_history().is_empty());
        assert!(sim.predator_history().is_empty());
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn test_rejects_non_positive_grid() {
        assert!(EcosystemSimulator::with_seed(config(0, 1, 1), 1).is_err());
        assert!(EcosystemSimulator::with_seed(config(-4, 1, 1), 1).is_err());
    }

    #[test]
    fn test_from_populations_rejects_out_of_bounds() {
        let result = EcosystemSimulator::from_populations(
            config(5, 0, 0),
            vec![Animal::new(Position::new(5, 0), 10)],
            Vec::new(),
            ChaCha8Rng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_from_populations_rejects_dead_animal() {
        let result = EcosystemSimulator::from_populations(
            config(5, 0, 0),
            Vec::new(),
            vec![Animal::new(Position::new(1, 1), 0)],
            ChaCha8Rng::seed_from_u64(0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lone_predator_pays_move_cost() {
        let mut sim = EcosystemSimulator::with_seed(config(5, 0, 1), 3).unwrap();
        sim.step();

        assert_eq!(sim.predators().len(), 1);
        assert_eq!(sim.predators()[0].energy, 19);
        assert_eq!(sim.prey_history(), &[0]);
        assert_eq!(sim.predator_history(), &[1]);
    }

    #[test]
    fn test_single_cell_grid_starves_predator() {
        let mut sim = EcosystemSimulator::with_seed(config(1, 0, 1), 11).unwrap();

        for _ in 0..19 {
            sim.step();
            assert_eq!(sim.predators()[0].position, Position::new(0, 0));
        }
        assert_eq!(sim.predators()[0].energy, 1);

        sim.step();
        assert!(sim.predators().is_empty());
        assert_eq!(sim.predator_history().len(), 20);
        assert_eq!(sim.predator_history().last(), Some(&0));
    }

    #[test]
    fn test_move_wraps_at_boundary() {
        // StepRng always draws zero, which selects Up.
        let mut sim =
            EcosystemSimulator::with_rng(config(5, 0, 0), StepRng::new(0, 0)).unwrap();
        let mut animal = Animal::new(Position::new(2, 4), 10);

        sim.move_animal(&mut animal);

        assert_eq!(animal.position, Position::new(2, 0));
        assert_eq!(animal.energy, 9);
    }

    #[test]
    fn test_move_wraps_every_edge() {
        let config = config(5, 0, 0);
        let cases = [
            (Position::new(2, 4), Direction::Up, Position::new(2, 0)),
            (Position::new(2, 0), Direction::Down, Position::new(2, 4)),
            (Position::new(4, 1), Direction::Right, Position::new(0, 1)),
            (Position::new(0, 1), Direction::Left, Position::new(4, 1)),
        ];

        for (start, direction, expected) in cases {
            let mut animal = Animal::new(start, 10);
            move_in_direction(&mut animal, direction, &config);
            assert_eq!(animal.position, expected, "{direction:?} from {start:?}");
            assert_eq!(animal.energy, 9);
        }
    }

    #[test]
    fn test_move_is_one_cell() {
        let mut sim = EcosystemSimulator::with_seed(config(7, 0, 0), 99).unwrap();
        let mut animal = Animal::new(Position::new(0, 6), 100);

        for _ in 0..50 {
            let before = animal.position;
            sim.move_animal(&mut animal);
            let dx = (animal.x() - before.x).rem_euclid(7);
            let dy = (animal.y() - before.y).rem_euclid(7);
            let moved = [(0, 1), (0, 6), (1, 0), (6, 0)];
            assert!(moved.contains(&(dx, dy)), "unexpected move {:?}", (dx, dy));
            assert!(animal.position.in_bounds(7));
        }
        assert_eq!(animal.energy, 50);
    }

    #[test]
    fn test_hunt_eats_colocated_prey() {
        let mut sim = single_cell_sim(vec![9], vec![19]);

        assert_eq!(sim.hunt(), 1);
        assert!(sim.prey().is_empty());
        assert_eq!(sim.predators()[0].energy, 34);
    }

    #[test]
    fn test_step_hunt_net_energy_gain() {
        let mut config = config(1, 0, 0);
        config.predator.reproduce_probability = 0.0;
        let origin = Position::new(0, 0);
        let mut sim = EcosystemSimulator::from_populations(
            config,
            vec![Animal::new(origin, 10)],
            vec![Animal::new(origin, 20)],
            ChaCha8Rng::seed_from_u64(5),
        )
        .unwrap();

        let report = sim.step();

        assert_eq!(report.prey_eaten, 1);
        assert!(sim.prey().is_empty());
        // -1 for moving, +15 for eating
        assert_eq!(sim.predators()[0].energy, 34);
    }

    #[test]
    fn test_predator_eats_at_most_one() {
        let mut sim = single_cell_sim(vec![5, 5, 5], vec![20]);

        assert_eq!(sim.hunt(), 1);
        assert_eq!(sim.prey().len(), 2);
        assert_eq!(sim.predators()[0].energy, 35);
    }

    #[test]
    fn test_prey_not_eaten_twice() {
        let mut sim = single_cell_sim(vec![5], vec![20, 20]);

        assert_eq!(sim.hunt(), 1);
        assert!(sim.prey().is_empty());
        assert_eq!(sim.predators()[0].energy, 35);
        assert_eq!(sim.predators()[1].energy, 20);
    }

    #[test]
    fn test_each_predator_claims_distinct_prey() {
        let mut sim = single_cell_sim(vec![3, 4], vec![20, 20]);

        assert_eq!(sim.hunt(), 2);
        assert!(sim.prey().is_empty());
        assert!(sim.predators().iter().all(|p| p.energy == 35));
    }

    #[test]
    fn test_hunt_first_match_wins() {
        let here = Position::new(2, 2);
        let mut sim = EcosystemSimulator::from_populations(
            config(5, 0, 0),
            vec![
                Animal::new(Position::new(0, 0), 1),
                Animal::new(here, 3),
                Animal::new(here, 7),
            ],
            vec![Animal::new(here, 20)],
            ChaCha8Rng::seed_from_u64(0),
        )
        .unwrap();

        assert_eq!(sim.hunt(), 1);
        let remaining: Vec<i32> = sim.prey().iter().map(|a| a.energy).collect();
        assert_eq!(remaining, vec![1, 7]);
    }

    #[test]
    fn test_hunt_ignores_other_cells() {
        let mut sim = EcosystemSimulator::from_populations(
            config(5, 0, 0),
            vec![Animal::new(Position::new(1, 0), 10)],
            vec![Animal::new(Position::new(0, 0), 20)],
            ChaCha8Rng::seed_from_u64(0),
        )
        .unwrap();

        assert_eq!(sim.hunt(), 0);
        assert_eq!(sim.prey().len(), 1);
        assert_eq!(sim.predators()[0].energy, 20);
    }

    #[test]
    fn test_reproduce_appends_after_pass() {
        // A zero draw is always below the probability.
        let mut rng = StepRng::new(0, 0);
        let species = SpeciesConfig::prey();
        let origin = Position::new(1, 2);
        let mut population = vec![Animal::new(origin, 16), Animal::new(origin, 15)];

        let born = reproduce(&mut population, &species, &mut rng);

        assert_eq!(born, 1);
        assert_eq!(population.len(), 3);
        assert_eq!(population[0].energy, 11);
        assert_eq!(population[1].energy, 15);
        assert_eq!(population[2], Animal::new(origin, 10));
    }

    #[test]
    fn test_reproduce_skips_draw_for_ineligible_parent() {
        // Draws alternate 0.0, 0.5, 0.0, ...
        let mut rng = StepRng::new(0, 1 << 63);
        let species = SpeciesConfig {
            reproduce_probability: 0.3,
            ..SpeciesConfig::prey()
        };
        let origin = Position::new(0, 0);
        let mut population = vec![
            Animal::new(origin, 10),
            Animal::new(origin, 16),
            Animal::new(origin, 16),
        ];

        let born = reproduce(&mut population, &species, &mut rng);

        // The first eligible parent takes the 0.0 draw, the second the 0.5.
        assert_eq!(born, 1);
        assert_eq!(population[0].energy, 10);
        assert_eq!(population[1].energy, 11);
        assert_eq!(population[2].energy, 16);
    }

    #[test]
    fn test_newborns_do_not_reproduce_in_same_pass() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let species = SpeciesConfig {
            reproduce_probability: 1.0,
            offspring_energy: 50,
            ..SpeciesConfig::prey()
        };
        let origin = Position::new(0, 0);
        let mut population = vec![Animal::new(origin, 40), Animal::new(origin, 40)];

        let born = reproduce(&mut population, &species, &mut rng);

        assert_eq!(born, 2);
        assert_eq!(population.len(), 4);
        assert_eq!(population[0].energy, 35);
        assert_eq!(population[1].energy, 35);
        assert!(population[2..].iter().all(|a| a.energy == 50));
    }

    #[test]
    fn test_huge_hunt_gain_does_not_overflow() {
        let mut config = config(1, 0, 0);
        config.hunt_gain = i32::MAX;
        config.predator.reproduce_probability = 0.0;
        let origin = Position::new(0, 0);
        let mut sim = EcosystemSimulator::from_populations(
            config,
            vec![Animal::new(origin, 10), Animal::new(origin, 10)],
            vec![Animal::new(origin, 20)],
            ChaCha8Rng::seed_from_u64(2),
        )
        .unwrap();

        sim.step();
        assert_eq!(sim.predators()[0].energy, i32::MAX);

        let report = sim.step();
        assert_eq!(report.prey_eaten, 1);
        assert_eq!(sim.predators()[0].energy, i32::MAX);
    }

    #[test]
    fn test_reproduce_respects_zero_probability() {
        let mut rng = StepRng::new(0, 0);
        let species = SpeciesConfig {
            reproduce_probability: 0.0,
            ..SpeciesConfig::predator()
        };
        let mut population = vec![Animal::new(Position::new(0, 0), 100)];

        assert_eq!(reproduce(&mut population, &species, &mut rng), 0);
        assert_eq!(population.len(), 1);
        assert_eq!(population[0].energy, 100);
    }

    #[test]
    fn test_empty_step() {
        let mut sim = EcosystemSimulator::with_seed(config(4, 0, 0), 0).unwrap();
        let report = sim.step();

        assert_eq!(report.prey, 0);
        assert_eq!(report.predators, 0);
        assert_eq!(sim.prey_history().len(), 1);
        assert_eq!(sim.predator_history().len(), 1);
    }

    #[test]
    fn test_run_stops_on_extinction() {
        let mut sim = EcosystemSimulator::with_seed(config(3, 0, 2), 8).unwrap();
        let result = sim.run(10);

        assert_eq!(result.steps_run, 1);
        assert_eq!(result.prey_history, vec![0]);
        assert_eq!(result.predator_history, vec![2]);
        assert_eq!(result.extinct, vec![Species::Prey]);
    }

    #[test]
    fn test_run_without_extinction_runs_all_steps() {
        let mut config = config(1, 0, 0);
        config.prey.reproduce_probability = 0.0;
        config.predator.reproduce_probability = 0.0;
        let origin = Position::new(0, 0);
        let mut sim = EcosystemSimulator::from_populations(
            config,
            vec![Animal::new(origin, 100); 4],
            vec![Animal::new(origin, 100)],
            ChaCha8Rng::seed_from_u64(1),
        )
        .unwrap();

        let result = sim.run(3);

        // One prey eaten per step on the single shared cell.
        assert_eq!(result.steps_run, 3);
        assert_eq!(result.prey_history, vec![3, 2, 1]);
        assert_eq!(result.predator_history, vec![1, 1, 1]);
        assert!(result.extinct.is_empty());
        assert_eq!(sim.predators()[0].energy, 100 - 3 + 45);
    }
}
