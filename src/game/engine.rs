use super::{
    config::{self, GameConfig, FOOD_REWARD, MIN_SPEED_MS},
    direction::Direction,
    state::{GameState, Phase, Position, Snake},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

/// Random draws tried before food placement falls back to scanning free cells
const FOOD_SAMPLE_ATTEMPTS: usize = 64;

/// How a round finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The snake ran into itself
    Crashed,
    /// The snake filled every cell, leaving nowhere to put food
    Cleared,
}

/// Events the engine hands back to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The round is over and its score is final
    RoundEnded {
        final_score: u32,
        outcome: RoundOutcome,
    },
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepResult {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Set on the tick that ends the round, and only then
    pub event: Option<GameEvent>,
}

/// The game engine that owns the state of a round and all game logic
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine whose food placement is reproducible
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Resume from an existing state, e.g. a hand-built board in a test
    pub fn with_state(config: GameConfig, state: GameState, seed: u64) -> Self {
        Self {
            config,
            state,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn with_rng(mut config: GameConfig, mut rng: StdRng) -> Self {
        config.grid_size = config.grid_size.max(2);
        config.base_speed_ms = config.base_speed_ms.max(MIN_SPEED_MS);
        let state = Self::fresh_state(&config, &mut rng);
        Self { config, state, rng }
    }

    /// Read-only view of the current round, for rendering
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Reset the game to initial state. Legal from any phase.
    pub fn reset(&mut self) {
        self.state = Self::fresh_state(&self.config, &mut self.rng);
    }

    /// Flip between running and paused. Does nothing once the round is over.
    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            Phase::Running => Phase::Paused,
            Phase::Paused => Phase::Running,
            Phase::GameOver => Phase::GameOver,
        };
    }

    /// Queue a turn from a raw `(dx, dy)` vector.
    ///
    /// Non-unit vectors are ignored.
    pub fn set_pending_direction(&mut self, dx: i32, dy: i32) {
        if let Some(direction) = Direction::from_delta(dx, dy) {
            self.set_direction(direction);
        }
    }

    /// Queue a turn for the next tick.
    ///
    /// A reversal of the current heading is dropped. The turn is kept while
    /// paused so it applies as soon as play resumes.
    pub fn set_direction(&mut self, direction: Direction) {
        if self.state.is_over() || self.state.snake.direction.is_opposite(direction) {
            return;
        }
        self.state.pending_direction = direction;
    }

    /// Change the base tick interval, also applying it to the current round.
    /// Values under the floor are raised to it.
    pub fn set_base_speed(&mut self, speed_ms: u64) {
        let speed_ms = speed_ms.max(MIN_SPEED_MS);
        self.config.base_speed_ms = speed_ms;
        self.state.speed_ms = speed_ms;
    }

    /// Execute one tick of the game
    pub fn advance(&mut self) -> StepResult {
        if !self.state.is_running() {
            return StepResult::default();
        }

        let state = &mut self.state;

        if !state.snake.direction.is_opposite(state.pending_direction) {
            state.snake.direction = state.pending_direction;
        }

        let new_head = state
            .snake
            .head()
            .stepped(state.snake.direction, state.grid_size);
        let ate_food = new_head == state.food;

        if state.snake.blocking_segments(ate_food).contains(&new_head) {
            return self.end_round(false, RoundOutcome::Crashed);
        }

        state.snake.body.insert(0, new_head);

        if !ate_food {
            state.snake.body.pop();
            return StepResult::default();
        }

        state.score += FOOD_REWARD;
        state.speed_ms = config::next_speed(state.speed_ms);

        match Self::spawn_food(&mut self.rng, &state.snake, state.grid_size) {
            Some(food) => {
                state.food = food;
                StepResult {
                    ate_food: true,
                    event: None,
                }
            }
            None => self.end_round(true, RoundOutcome::Cleared),
        }
    }

    fn end_round(&mut self, ate_food: bool, outcome: RoundOutcome) -> StepResult {
        self.state.phase = Phase::GameOver;
        debug!(score = self.state.score, ?outcome, "round ended");

        StepResult {
            ate_food,
            event: Some(GameEvent::RoundEnded {
                final_score: self.state.score,
                outcome,
            }),
        }
    }

    fn fresh_state(config: &GameConfig, rng: &mut StdRng) -> GameState {
        let center = (config.grid_size / 2) as i32;
        let head = Position::new(center, center);
        let snake = Snake::new(head, Direction::Right);

        // A 1x1 board has no free cell; food simply sits under the head
        let food = Self::spawn_food(rng, &snake, config.grid_size).unwrap_or(head);

        GameState::new(snake, food, config.grid_size, config.base_speed_ms)
    }

    /// Pick a random free cell, or `None` when the snake covers the board
    fn spawn_food(rng: &mut StdRng, snake: &Snake, grid_size: usize) -> Option<Position> {
        if snake.len() >= grid_size * grid_size {
            return None;
        }

        for _ in 0..FOOD_SAMPLE_ATTEMPTS {
            let pos = Position::new(
                rng.gen_range(0..grid_size) as i32,
                rng.gen_range(0..grid_size) as i32,
            );
            if !snake.occupies(pos) {
                return Some(pos);
            }
        }

        // Crowded board: choose uniformly among the cells that are left
        let free: Vec<Position> = (0..grid_size as i32)
            .flat_map(|y| (0..grid_size as i32).map(move |x| Position::new(x, y)))
            .filter(|pos| !snake.occupies(*pos))
            .collect();

        if free.is_empty() {
            None
        } else {
            Some(free[rng.gen_range(0..free.len())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(body: Vec<Position>, direction: Direction, food: Position) -> GameEngine {
        let config = GameConfig::small();
        let mut snake = Snake::new(body[0], direction);
        snake.body = body;
        let state = GameState::new(snake, food, config.grid_size, config.base_speed_ms);
        GameEngine::with_state(config, state, 7)
    }

    #[test]
    fn test_reset() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        engine.reset();
        let state = engine.state();

        assert!(state.is_running());
        assert_eq!(state.score, 0);
        assert_eq!(state.speed_ms, 120);
        assert_eq!(state.snake.len(), 1);
        assert_eq!(state.snake.head(), Position::new(10, 10));
        assert_eq!(state.snake.direction, Direction::Right);
        assert!(!state.is_occupied_by_snake(state.food));
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = engine_with(vec![Position::new(5, 5)], Direction::Right, Position::new(0, 0));

        let result = engine.advance();

        assert_eq!(result, StepResult::default());
        assert_eq!(engine.state().snake.head(), Position::new(6, 5));
        assert_eq!(engine.state().snake.len(), 1);
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = engine_with(vec![Position::new(5, 5)], Direction::Right, Position::new(6, 5));

        let result = engine.advance();

        assert!(result.ate_food);
        assert!(result.event.is_none());
        let state = engine.state();
        assert_eq!(state.score, 10);
        assert_eq!(state.snake.len(), 2);
        assert_eq!(state.speed_ms, 117);
        assert!(!state.is_occupied_by_snake(state.food));
    }

    #[test]
    fn test_wraps_instead_of_hitting_walls() {
        let mut engine = engine_with(vec![Position::new(9, 4)], Direction::Right, Position::new(5, 5));
        engine.advance();
        assert_eq!(engine.state().snake.head(), Position::new(0, 4));

        let mut engine = engine_with(vec![Position::new(3, 0)], Direction::Up, Position::new(5, 5));
        engine.advance();
        assert_eq!(engine.state().snake.head(), Position::new(3, 9));
    }

    #[test]
    fn test_self_collision() {
        // Head at (5,5) moving up into (5,4), which is a body segment
        let body = vec![
            Position::new(5, 5),
            Position::new(6, 5),
            Position::new(6, 4),
            Position::new(5, 4),
            Position::new(4, 4),
        ];
        let mut engine = engine_with(body.clone(), Direction::Left, Position::new(0, 0));
        engine.state.score = 40;
        engine.set_direction(Direction::Up);

        let result = engine.advance();

        assert_eq!(
            result.event,
            Some(GameEvent::RoundEnded {
                final_score: 40,
                outcome: RoundOutcome::Crashed,
            })
        );
        assert!(engine.state().is_over());
        assert_eq!(engine.state().snake.body, body);
    }

    #[test]
    fn test_moving_into_vacating_tail_is_safe() {
        // A 2x2 loop: the head chases the tail around
        let body = vec![
            Position::new(5, 5),
            Position::new(6, 5),
            Position::new(6, 6),
            Position::new(5, 6),
        ];
        let mut engine = engine_with(body, Direction::Left, Position::new(0, 0));
        engine.set_direction(Direction::Down);

        let result = engine.advance();

        assert!(result.event.is_none());
        assert_eq!(engine.state().snake.head(), Position::new(5, 6));
        assert_eq!(engine.state().snake.len(), 4);
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = engine_with(
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
            Position::new(0, 0),
        );

        engine.set_direction(Direction::Left);
        engine.advance();

        assert_eq!(engine.state().snake.direction, Direction::Right);
        assert_eq!(engine.state().snake.head(), Position::new(6, 5));
    }

    #[test]
    fn test_raw_direction_must_be_unit_vector() {
        let mut engine = engine_with(vec![Position::new(5, 5)], Direction::Right, Position::new(0, 0));

        engine.set_pending_direction(1, 1);
        engine.set_pending_direction(0, 2);
        assert_eq!(engine.state().pending_direction, Direction::Right);

        engine.set_pending_direction(0, 1);
        assert_eq!(engine.state().pending_direction, Direction::Down);
    }

    #[test]
    fn test_turn_queued_while_paused_applies_after_resume() {
        let mut engine = engine_with(vec![Position::new(5, 5)], Direction::Right, Position::new(0, 0));

        engine.toggle_pause();
        engine.set_direction(Direction::Down);
        engine.advance();
        assert_eq!(engine.state().snake.head(), Position::new(5, 5));

        engine.toggle_pause();
        engine.advance();
        assert_eq!(engine.state().snake.head(), Position::new(5, 6));
    }

    #[test]
    fn test_pause_toggles_only_while_playing() {
        let mut engine = GameEngine::with_seed(GameConfig::small(), 3);

        engine.toggle_pause();
        assert_eq!(engine.state().phase, Phase::Paused);
        engine.toggle_pause();
        assert_eq!(engine.state().phase, Phase::Running);

        engine.state.phase = Phase::GameOver;
        engine.toggle_pause();
        assert_eq!(engine.state().phase, Phase::GameOver);
    }

    #[test]
    fn test_terminated_game_no_update() {
        let mut engine = GameEngine::with_seed(GameConfig::small(), 5);
        engine.state.phase = Phase::GameOver;
        let before = engine.state().clone();

        for _ in 0..5 {
            assert_eq!(engine.advance(), StepResult::default());
        }
        engine.set_direction(Direction::Up);

        assert_eq!(engine.state(), &before);

        engine.reset();
        assert!(engine.state().is_running());
    }

    #[test]
    fn test_speed_never_drops_below_floor() {
        let mut engine = GameEngine::with_seed(GameConfig::new(20), 11);

        for _ in 0..40 {
            // Keep the snake short so it never crashes: move food in front of it
            let head = engine.state().snake.head();
            engine.state.food = head.stepped(engine.state().snake.direction, 20);
            engine.state.snake.body.truncate(1);
            engine.advance();
            assert!(engine.state().speed_ms >= 50);
        }

        assert_eq!(engine.state().speed_ms, 50);
        assert_eq!(engine.state().score, 400);
    }

    #[test]
    fn test_filling_the_board_ends_the_round() {
        // 2x2 board with three segments; eating the last cell leaves no room
        let config = GameConfig::new(2);
        let mut snake = Snake::new(Position::new(0, 0), Direction::Left);
        snake.body = vec![Position::new(0, 0), Position::new(0, 1), Position::new(1, 1)];
        let state = GameState::new(snake, Position::new(1, 0), 2, 120);
        let mut engine = GameEngine::with_state(config, state, 9);

        let result = engine.advance();

        assert!(result.ate_food);
        assert_eq!(
            result.event,
            Some(GameEvent::RoundEnded {
                final_score: 10,
                outcome: RoundOutcome::Cleared,
            })
        );
        assert!(engine.state().is_over());
        assert_eq!(engine.state().snake.len(), 4);
    }

    #[test]
    fn test_set_base_speed_applies_now_and_after_reset() {
        let mut engine = GameEngine::with_seed(GameConfig::small(), 2);

        engine.set_base_speed(200);
        assert_eq!(engine.state().speed_ms, 200);

        engine.reset();
        assert_eq!(engine.state().speed_ms, 200);
    }

    #[test]
    fn test_base_speed_never_starts_below_floor() {
        let config = GameConfig {
            base_speed_ms: 10,
            ..GameConfig::small()
        };
        let mut engine = GameEngine::with_seed(config, 2);
        assert_eq!(engine.state().speed_ms, MIN_SPEED_MS);

        engine.set_base_speed(0);
        assert_eq!(engine.state().speed_ms, MIN_SPEED_MS);
        engine.reset();
        assert_eq!(engine.state().speed_ms, MIN_SPEED_MS);
    }

    #[test]
    fn test_food_never_spawns_on_snake() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut snake = Snake::new(Position::new(0, 0), Direction::Right);
        snake.body = (0..3)
            .flat_map(|y| (0..3).map(move |x| Position::new(x, y)))
            .filter(|p| *p != Position::new(2, 1))
            .collect();

        for _ in 0..20 {
            assert_eq!(
                GameEngine::spawn_food(&mut rng, &snake, 3),
                Some(Position::new(2, 1))
            );
        }
    }
}
