use crate::dqn::AgentConfig;
use crate::error::{Result, SnakeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Play area and reward shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: i32,  // pixels
    pub height: i32, // pixels
    pub block_size: i32,
    pub initial_length: usize,
    /// Episode ends once frames exceed `stall_factor * body length`; 0 disables.
    pub stall_factor: u32,
    pub food_reward: f32,
    pub death_penalty: f32,
    pub step_reward: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            block_size: 20,
            initial_length: 3,
            stall_factor: 100,
            food_reward: 10.0,
            death_penalty: -10.0,
            step_reward: 0.0,
        }
    }
}

impl GameConfig {
    pub fn cols(&self) -> i32 {
        self.width / self.block_size
    }

    pub fn rows(&self) -> i32 {
        self.height / self.block_size
    }

    pub fn cell_count(&self) -> usize {
        (self.cols() * self.rows()) as usize
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |message: String| Err(SnakeError::InvalidConfig { message });
        if self.block_size <= 0 || self.width <= 0 || self.height <= 0 {
            return bad(format!(
                "play area {}x{} with cell {} must be positive",
                self.width, self.height, self.block_size
            ));
        }
        if self.width % self.block_size != 0 || self.height % self.block_size != 0 {
            return bad(format!(
                "play area {}x{} is not aligned to cell size {}",
                self.width, self.height, self.block_size
            ));
        }
        if self.initial_length == 0 {
            return bad("initial snake length must be at least 1".into());
        }
        // the spawn snake trails left from the center column
        if (self.cols() / 2) as usize + 1 < self.initial_length {
            return bad(format!(
                "{} columns cannot hold a spawn snake of length {}",
                self.cols(),
                self.initial_length
            ));
        }
        if self.cell_count() <= self.initial_length {
            return bad("grid leaves no free cell for food".into());
        }
        Ok(())
    }
}

/// Everything a run needs. Loaded from JSON, every field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub agent: AgentConfig,
    pub checkpoint: PathBuf,
    /// Pacing delay between ticks, 0 for batch training.
    pub tick_delay_ms: u64,
    /// Save every N completed games even without a new record.
    pub autosave_every: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            agent: AgentConfig::default(),
            checkpoint: PathBuf::from("model").join("model.json"),
            tick_delay_ms: 0,
            autosave_every: 10,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SnakeError::io(format!("read config {}", path.display()), e))?;
        let cfg: Config = serde_json::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.game.validate()?;
        self.agent.validate()
    }
}
