//! The Snake environment: one snake, one food, a bounded grid and a single
//! authoritative `step`.

use crate::config::GameConfig;
use crate::error::Result;
use crate::food::Food;
use crate::snake::{Action, Direction, Snake};
use crate::utils::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// What one call to `step` produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub done: bool,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct Game {
    cfg: GameConfig,
    snake: Snake,
    food: Food,
    score: u32,
    frame_iteration: u32,
    rng: StdRng,
}

impl Game {
    /// Builds and resets a game. `seed` fixes food placement; `None` draws one
    /// from the OS.
    pub fn new(cfg: GameConfig, seed: Option<u64>) -> Result<Self> {
        cfg.validate()?;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let snake = Self::spawn_snake(&cfg);
        let mut game = Self {
            cfg,
            snake,
            food: Food::new(Point::new(0, 0)),
            score: 0,
            frame_iteration: 0,
            rng,
        };
        game.reset()?;
        Ok(game)
    }

    fn spawn_snake(cfg: &GameConfig) -> Snake {
        let head = Point::new(cfg.cols() / 2 * cfg.block_size, cfg.rows() / 2 * cfg.block_size);
        Snake::new(head, cfg.initial_length, Direction::Right, cfg.block_size)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.snake = Self::spawn_snake(&self.cfg);
        self.score = 0;
        self.frame_iteration = 0;
        self.place_food()
    }

    fn place_food(&mut self) -> Result<()> {
        let (cols, rows, cell) = (self.cfg.cols(), self.cfg.rows(), self.cfg.block_size);
        self.food.respawn(&self.snake, cols, rows, cell, &mut self.rng)
    }

    /// Advances one tick with a move relative to the current heading.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome> {
        let heading = action.apply(self.snake.direction());
        self.advance(heading)
    }

    /// Advances one tick with an absolute heading, as a human player steers.
    /// A heading opposite to the current one is ignored.
    pub fn step_heading(&mut self, heading: Direction) -> Result<StepOutcome> {
        let current = self.snake.direction();
        let heading = if heading == current.opposite() { current } else { heading };
        self.advance(heading)
    }

    fn advance(&mut self, heading: Direction) -> Result<StepOutcome> {
        self.frame_iteration += 1;
        let len_before = self.snake.len();

        self.snake.set_direction(heading);
        let (dx, dy) = heading.delta();
        let new_head = self.snake.head().offset(dx, dy, self.cfg.block_size);
        self.snake.push_head(new_head);

        if self.is_collision(new_head) || self.stalled(len_before) {
            // the fatal head stays pushed
            return Ok(StepOutcome { reward: self.cfg.death_penalty, done: true, score: self.score });
        }

        let reward = if new_head == self.food.position {
            self.score += 1;
            self.place_food()?;
            self.cfg.food_reward
        } else {
            self.snake.pop_tail();
            self.cfg.step_reward
        };
        Ok(StepOutcome { reward, done: false, score: self.score })
    }

    fn stalled(&self, body_len: usize) -> bool {
        self.cfg.stall_factor > 0
            && self.frame_iteration as usize > self.cfg.stall_factor as usize * body_len
    }

    /// Outside the grid, or on the body behind the head.
    pub fn is_collision(&self, pt: Point) -> bool {
        let cell = self.cfg.block_size;
        pt.x < 0
            || pt.y < 0
            || pt.x > self.cfg.width - cell
            || pt.y > self.cfg.height - cell
            || self.snake.hits_tail_section(pt)
    }

    /// Forces the food onto `p`; fails when `p` is under the snake.
    pub fn set_food(&mut self, p: Point) -> Result<()> {
        self.food.place_at(p, &self.snake)
    }

    pub fn head(&self) -> Point {
        self.snake.head()
    }

    pub fn body(&self) -> &[Point] {
        self.snake.body()
    }

    pub fn food(&self) -> Point {
        self.food.position
    }

    pub fn direction(&self) -> Direction {
        self.snake.direction()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn frame_iteration(&self) -> u32 {
        self.frame_iteration
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }
}
