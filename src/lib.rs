//! Snake played by a one-step Q-learning agent: environment, 11-flag state
//! encoding, replay memory, a small MLP with an Adam trainer and the
//! train/watch/versus loops around them.

pub mod config;
pub mod db;
pub mod dqn;
pub mod error;
pub mod food;
pub mod game;
pub mod game_input;
pub mod log;
pub mod network;
pub mod replay_buffer;
pub mod snake;
pub mod training;
pub mod utils;
pub mod versus;
