use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move one step in a direction on a toroidal grid of `grid_size` tiles
    pub fn stepped(&self, direction: Direction, grid_size: usize) -> Self {
        let (dx, dy) = direction.delta();
        let size = grid_size as i32;
        let moved = self.moved_by(dx, dy);
        Self {
            x: moved.x.rem_euclid(size),
            y: moved.y.rem_euclid(size),
        }
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Current direction of movement
    pub direction: Direction,
}

impl Snake {
    /// Create a single-segment snake
    pub fn new(head: Position, direction: Direction) -> Self {
        Self {
            body: vec![head],
            direction,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Segments the new head must not land on.
    ///
    /// The tail is left out when the snake is not growing, since it moves
    /// away during the same tick.
    pub fn blocking_segments(&self, growing: bool) -> &[Position] {
        if growing {
            &self.body
        } else {
            &self.body[..self.body.len() - 1]
        }
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Where a round currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Paused,
    GameOver,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    /// Turn requested by the player, applied on the next tick
    pub pending_direction: Direction,
    pub food: Position,
    pub grid_size: usize,
    pub score: u32,
    /// Current tick interval
    pub speed_ms: u64,
    pub phase: Phase,
}

impl GameState {
    /// Create a new running game state
    pub fn new(snake: Snake, food: Position, grid_size: usize, speed_ms: u64) -> Self {
        Self {
            pending_direction: snake.direction,
            snake,
            food,
            grid_size,
            score: 0,
            speed_ms,
            phase: Phase::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }
}
