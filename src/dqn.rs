//! One-step Q-learning agent: epsilon-greedy action selection, replay memory
//! and the value update.

use crate::error::{Result, SnakeError};
use crate::game_input::{STATE_SIZE, State};
use crate::network::Net;
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::snake::Action;
use crate::utils::argmax;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub hidden: usize,
    pub lr: f32,
    pub gamma: f32,
    pub adam_beta1: f32,
    pub adam_beta2: f32,
    pub adam_eps: f32,
    pub buffer_capacity: usize,
    pub batch_size: usize,
    /// Epsilon is `max(0, epsilon_base - completed games)` ...
    pub epsilon_base: u32,
    /// ... and a random move is taken with probability `epsilon / epsilon_range`.
    pub epsilon_range: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hidden: 256,
            lr: 0.001,
            gamma: 0.9,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            adam_eps: 1e-8,
            buffer_capacity: 100_000,
            batch_size: 1000,
            epsilon_base: 80,
            epsilon_range: 200,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        let bad = |message: &str| Err(SnakeError::InvalidConfig { message: message.into() });
        if self.hidden == 0 {
            return bad("hidden layer width must be positive");
        }
        if self.batch_size == 0 || self.buffer_capacity == 0 {
            return bad("batch size and buffer capacity must be positive");
        }
        if self.epsilon_range == 0 {
            return bad("epsilon range must be positive");
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) || !(0.0..=1.0).contains(&self.gamma) {
            return bad("learning rate must be positive and gamma within [0, 1]");
        }
        Ok(())
    }
}

/// The value update. Targets come from the same live network that is being
/// trained; there is no separate target network.
#[derive(Debug, Clone)]
pub struct QTrainer {
    lr: f32,
    gamma: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
}

impl QTrainer {
    pub fn new(cfg: &AgentConfig) -> Self {
        Self {
            lr: cfg.lr,
            gamma: cfg.gamma,
            beta1: cfg.adam_beta1,
            beta2: cfg.adam_beta2,
            eps: cfg.adam_eps,
        }
    }

    /// One Adam step on the mean squared error between `net(s)` and its
    /// target copy, where only the taken action's entry is replaced by
    /// `r` (terminal) or `r + gamma * max net(s')`. Returns the loss.
    pub fn train_step(&self, net: &mut Net, batch: &[&Transition]) -> Result<f32> {
        if batch.is_empty() {
            return Ok(0.0);
        }
        let n_out = net.output_size;
        let denom = (batch.len() * n_out) as f32;

        // targets are computed before any parameter moves
        let samples: Vec<(usize, f32, f32)> = batch
            .iter()
            .map(|t| {
                let pred = net.forward(&t.state);
                let q_new = if t.done {
                    t.reward
                } else {
                    let next = net.forward(&t.next_state);
                    t.reward + self.gamma * next.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
                };
                let a = t.action.index();
                (a, pred[a], q_new)
            })
            .collect();

        net.zero_grad();
        let mut loss = 0.0f32;
        let mut d_out = vec![0.0f32; n_out];
        for (t, &(a, pred, target)) in batch.iter().zip(&samples) {
            let diff = pred - target;
            loss += diff * diff;
            d_out.iter_mut().for_each(|g| *g = 0.0);
            d_out[a] = 2.0 * diff / denom;
            net.backward_from_output_grad(&t.state, &d_out);
        }
        let loss = loss / denom;

        if !loss.is_finite() {
            return Err(SnakeError::NonFinite { what: "Q-learning loss".into() });
        }
        net.step_adam(self.lr, self.beta1, self.beta2, self.eps);
        if net.non_finite_any() {
            return Err(SnakeError::NonFinite { what: "network parameters after Adam step".into() });
        }
        Ok(loss)
    }
}

pub struct Agent {
    cfg: AgentConfig,
    pub net: Net,
    trainer: QTrainer,
    memory: ReplayBuffer,
    rng: StdRng, // exploration + replay sampling
    training: bool,
    pub n_games: u32,
    pub last_loss: f32,
}

impl Agent {
    /// Fresh agent with random weights.
    pub fn new(cfg: AgentConfig, training: bool, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let net = Net::new(STATE_SIZE, cfg.hidden, Action::ALL.len(), &mut rng);
        Self {
            trainer: QTrainer::new(&cfg),
            memory: ReplayBuffer::new(cfg.buffer_capacity),
            cfg,
            net,
            rng,
            training,
            n_games: 0,
            last_loss: 0.0,
        }
    }

    /// Swaps in loaded parameters; they must match this agent's layer sizes.
    pub fn set_net(&mut self, net: Net) -> Result<()> {
        net.ensure_shape(STATE_SIZE, self.cfg.hidden, Action::ALL.len())?;
        self.net = net;
        Ok(())
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Current exploration budget; always 0 outside training.
    pub fn epsilon(&self) -> u32 {
        if self.training { self.cfg.epsilon_base.saturating_sub(self.n_games) } else { 0 }
    }

    pub fn select_action(&mut self, state: &State) -> Action {
        let epsilon = self.epsilon();
        if epsilon > 0 && self.rng.gen_range(0..self.cfg.epsilon_range) < epsilon {
            return Action::ALL[self.rng.gen_range(0..Action::ALL.len())];
        }
        greedy_action(&self.net, state)
    }

    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Update on the single transition just observed.
    pub fn train_short_memory(&mut self, transition: &Transition) -> Result<f32> {
        let loss = self.trainer.train_step(&mut self.net, &[transition])?;
        self.last_loss = loss;
        Ok(loss)
    }

    /// Update on a replay batch (the whole memory when it is small).
    pub fn train_long_memory(&mut self) -> Result<f32> {
        let batch = self.memory.sample(self.cfg.batch_size, &mut self.rng);
        let loss = self.trainer.train_step(&mut self.net, &batch)?;
        self.last_loss = loss;
        Ok(loss)
    }
}

/// `argmax net(state)`, no exploration.
pub fn greedy_action(net: &Net, state: &State) -> Action {
    Action::ALL[argmax(&net.forward(state))]
}
