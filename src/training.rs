//! The control loop: encode -> act -> step -> learn, one tick at a time,
//! plus the checkpoint policy and greedy evaluation.

use crate::config::{Config, GameConfig};
use crate::db::{self, Checkpoint, CheckpointMeta, LoadOutcome};
use crate::dqn::{Agent, greedy_action};
use crate::error::Result;
use crate::game::Game;
use crate::game_input::GameInput;
use crate::log;
use crate::network::Net;
use crate::replay_buffer::Transition;
use crate::utils::vec_stats;
use chrono::Utc;
use rayon::prelude::*;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Explore, learn and checkpoint.
    Train,
    /// Greedy play with the stored policy, no learning, no saving.
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    NewRecord,
    AutoSave,
}

/// Reported once per finished game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameSummary {
    pub game: u32,
    pub score: u32,
    pub record: u32,
    pub mean_score: f32,
    pub saved: Option<SaveReason>,
}

/// Scores of the games played in this process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub scores: Vec<u32>,
    pub total_score: u64,
}

impl SessionStats {
    pub fn push(&mut self, score: u32) {
        self.scores.push(score);
        self.total_score += u64::from(score);
    }

    pub fn games(&self) -> usize {
        self.scores.len()
    }

    pub fn mean(&self) -> f32 {
        if self.scores.is_empty() { 0.0 } else { self.total_score as f32 / self.scores.len() as f32 }
    }
}

pub struct TrainingLoop {
    cfg: Config,
    mode: Mode,
    agent: Agent,
    game: Game,
    record: u32,
    ticks: u64,
    stats: SessionStats,
}

impl TrainingLoop {
    /// Builds the agent and the game and restores the checkpoint if any.
    pub fn new(cfg: Config, mode: Mode, seed: Option<u64>) -> Result<Self> {
        cfg.validate()?;
        let training = mode == Mode::Train;
        let mut agent = Agent::new(cfg.agent.clone(), training, seed);
        let game = Game::new(cfg.game.clone(), seed.map(|s| s.wrapping_add(1)))?;

        let mut record = 0;
        match db::load_checkpoint(&cfg.checkpoint)? {
            LoadOutcome::Modern(ckpt) => {
                agent.set_net(Net::from_model(ckpt.model)?)?;
                if training {
                    agent.n_games = ckpt.meta.n_games;
                    record = ckpt.meta.record;
                    info!(game = agent.n_games, record, "continuing training");
                }
            }
            LoadOutcome::Legacy(model) => agent.set_net(Net::from_model(model)?)?,
            LoadOutcome::NotFound => info!("new training"),
        }

        Ok(Self { cfg, mode, agent, game, record, ticks: 0, stats: SessionStats::default() })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn record(&self) -> u32 {
        self.record
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// One environment step. Returns a summary when the step ended a game.
    pub fn tick(&mut self) -> Result<Option<GameSummary>> {
        let state = GameInput::from_game(&self.game);
        let action = self.agent.select_action(&state);
        let outcome = self.game.step(action)?;
        let next_state = GameInput::from_game(&self.game);
        self.ticks += 1;

        if self.agent.is_training() {
            let transition = Transition {
                state,
                action,
                reward: outcome.reward,
                next_state,
                done: outcome.done,
            };
            self.agent.train_short_memory(&transition)?;
            self.agent.remember(transition);
        }

        if !outcome.done {
            return Ok(None);
        }
        self.finish_game(outcome.score).map(Some)
    }

    fn finish_game(&mut self, score: u32) -> Result<GameSummary> {
        self.game.reset()?;
        self.agent.n_games += 1;
        self.stats.push(score);

        let mut saved = None;
        if self.agent.is_training() {
            let loss = self.agent.train_long_memory()?;
            log::scalar(self.ticks, "long_memory_loss", loss);

            if score > self.record {
                self.record = score;
                self.save()?;
                info!(record = self.record, "new record (saved)");
                saved = Some(SaveReason::NewRecord);
            } else if self.cfg.autosave_every > 0 && self.agent.n_games % self.cfg.autosave_every == 0 {
                self.save()?;
                info!("auto save");
                saved = Some(SaveReason::AutoSave);
            }
        } else {
            self.record = self.record.max(score);
        }

        let summary = GameSummary {
            game: self.agent.n_games,
            score,
            record: self.record,
            mean_score: self.stats.mean(),
            saved,
        };
        info!("Game {} Score {} Record {}", summary.game, summary.score, summary.record);
        if self.agent.is_training() {
            log::scalar(u64::from(summary.game), "mean_score", summary.mean_score);
        }
        Ok(summary)
    }

    fn save(&self) -> Result<()> {
        let ckpt = Checkpoint {
            meta: CheckpointMeta { n_games: self.agent.n_games, record: self.record, saved_at: Utc::now() },
            model: self.agent.net.to_model(),
        };
        db::save_checkpoint(&self.cfg.checkpoint, &ckpt)
    }

    /// Ticks until `max_games` more games have finished, or forever when
    /// `None`.
    pub fn run(&mut self, max_games: Option<u32>) -> Result<&SessionStats> {
        info!(mode = ?self.mode, epsilon = self.agent.epsilon(), "starting session");
        let delay = Duration::from_millis(self.cfg.tick_delay_ms);
        let mut played = 0;
        while max_games.is_none_or(|m| played < m) {
            if self.tick()?.is_some() {
                played += 1;
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        let scores: Vec<f32> = self.stats.scores.iter().map(|&s| s as f32).collect();
        let s = vec_stats(&scores);
        info!(games = played, min = s.min, max = s.max, mean = s.mean, "session finished");
        Ok(&self.stats)
    }
}

/// Plays `games` greedy episodes in parallel, each on its own `Game` seeded
/// with `base_seed + i`. The network is only read.
pub fn evaluate(net: &Net, game_cfg: &GameConfig, games: usize, base_seed: u64) -> Result<Vec<u32>> {
    (0..games)
        .into_par_iter()
        .map(|i| -> Result<u32> {
            let mut game = Game::new(game_cfg.clone(), Some(base_seed.wrapping_add(i as u64)))?;
            loop {
                let action = greedy_action(net, &GameInput::from_game(&game));
                let outcome = game.step(action)?;
                if outcome.done {
                    debug!(episode = i, score = outcome.score, "evaluation episode finished");
                    return Ok(outcome.score);
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dqn::AgentConfig;
    use crate::game_input::STATE_SIZE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::Path;

    fn cfg(checkpoint: &Path) -> Config {
        Config {
            game: GameConfig { width: 200, height: 200, ..GameConfig::default() },
            agent: AgentConfig { hidden: 32, batch_size: 64, ..AgentConfig::default() },
            checkpoint: checkpoint.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn session_stats_mean() {
        let mut s = SessionStats::default();
        assert_eq!(s.mean(), 0.0);
        s.push(2);
        s.push(5);
        assert_eq!(s.games(), 2);
        assert!((s.mean() - 3.5).abs() < 1e-6);
    }

    #[test]
    fn training_counts_games_and_autosaves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut tl = TrainingLoop::new(cfg(&path), Mode::Train, Some(9)).unwrap();
        tl.run(Some(10)).unwrap();
        assert_eq!(tl.agent().n_games, 10);
        assert_eq!(tl.stats().games(), 10);
        match db::load_checkpoint(&path).unwrap() {
            LoadOutcome::Modern(c) => {
                assert_eq!(c.meta.n_games, 10);
                assert_eq!(c.meta.record, tl.record());
            }
            other => panic!("expected a checkpoint, got {other:?}"),
        }
    }

    #[test]
    fn training_resumes_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut first = TrainingLoop::new(cfg(&path), Mode::Train, Some(1)).unwrap();
        first.run(Some(10)).unwrap();

        let again = TrainingLoop::new(cfg(&path), Mode::Train, Some(2)).unwrap();
        assert_eq!(again.agent().n_games, 10);
        assert_eq!(again.record(), first.record());
        assert_eq!(again.agent().net.weights(), first.agent().net.weights());

        let watch = TrainingLoop::new(cfg(&path), Mode::Watch, Some(2)).unwrap();
        assert_eq!(watch.agent().n_games, 0);
        assert_eq!(watch.agent().epsilon(), 0);
    }

    #[test]
    fn watch_mode_never_learns_or_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut tl = TrainingLoop::new(cfg(&path), Mode::Watch, Some(3)).unwrap();
        let before = tl.agent().net.weights().to_vec();
        tl.run(Some(3)).unwrap();
        assert_eq!(tl.agent().net.weights(), &before[..]);
        assert_eq!(tl.agent().memory_len(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn legacy_checkpoint_restores_weights_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let net = Net::new(STATE_SIZE, 32, 3, &mut StdRng::seed_from_u64(0));
        std::fs::write(&path, serde_json::to_string(&net.to_model()).unwrap()).unwrap();
        let tl = TrainingLoop::new(cfg(&path), Mode::Train, Some(4)).unwrap();
        assert_eq!(tl.agent().n_games, 0);
        assert_eq!(tl.record(), 0);
        assert_eq!(tl.agent().net.weights(), net.weights());
    }

    #[test]
    fn corrupt_checkpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(TrainingLoop::new(cfg(&path), Mode::Train, Some(4)).is_err());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let net = Net::new(STATE_SIZE, 32, 3, &mut StdRng::seed_from_u64(8));
        let game_cfg = GameConfig { width: 200, height: 200, ..GameConfig::default() };
        let a = evaluate(&net, &game_cfg, 6, 100).unwrap();
        let b = evaluate(&net, &game_cfg, 6, 100).unwrap();
        assert_eq!(a.len(), 6);
        assert_eq!(a, b);
    }
}
