use serde::{Deserialize, Serialize};

/// Fastest tick interval the difficulty ramp can reach
pub const MIN_SPEED_MS: u64 = 50;
/// How much faster each eaten food makes the tick
pub const SPEED_STEP_MS: u64 = 3;
/// Points awarded per food
pub const FOOD_REWARD: u32 = 10;

/// Configuration for the game. Only the board size and the starting speed
/// are tunable; scoring and the speed ramp are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Tiles per side of the square, wrapping grid
    pub grid_size: usize,
    /// Tick interval at the start of a round, in milliseconds
    pub base_speed_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            base_speed_ms: 120,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10)
    }

    /// Number of cells on the board
    pub fn cell_count(&self) -> usize {
        self.grid_size * self.grid_size
    }
}

/// Tick interval after one more food, never below the floor
pub fn next_speed(speed_ms: u64) -> u64 {
    if speed_ms > MIN_SPEED_MS {
        speed_ms.saturating_sub(SPEED_STEP_MS).max(MIN_SPEED_MS)
    } else {
        speed_ms
    }
}
