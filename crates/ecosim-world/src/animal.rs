//! Animal state.

use ecosim_core::Position;
use serde::{Deserialize, Serialize};

/// A single prey or predator on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub position: Position,
    pub energy: i32,
}

impl Animal {
    pub fn new(position: Position, energy: i32) -> Self {
        Self { position, energy }
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0
    }

    /// Saturates at `i32::MAX`.
    pub fn add_energy(&mut self, amount: i32) {
        self.energy = self.energy.saturating_add(amount);
    }

    /// Subtract `amount` unconditionally, saturating at `i32::MIN`. Energy may
    /// drop to zero or below; the starvation cull removes such animals at the
    /// end of the step.
    pub fn spend_energy(&mut self, amount: i32) {
        self.energy = self.energy.saturating_sub(amount);
    }

    pub fn move_to(&mut self, new_position: Position) {
        self.position = new_position;
    }

    /// Whether both animals occupy the same cell
    pub fn shares_cell_with(&self, other: &Animal) -> bool {
        self.position == other.position
    }
}
