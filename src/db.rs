//! Checkpoint persistence: one JSON file holding the network parameters plus
//! the completed-game count and the best score.

use crate::error::{Result, SnakeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Raw network parameters. A file holding only this is the legacy format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NetModel {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub weights: Vec<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CheckpointMeta {
    pub n_games: u32,
    pub record: u32,
    pub saved_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub meta: CheckpointMeta,
    pub model: NetModel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Modern(Checkpoint),
    /// Parameters without counters; treat as 0 games and record 0.
    Legacy(NetModel),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseOutcome {
    Removed,
    NothingToRemove,
}

/// Overwrites the checkpoint at `path`, creating parent directories.
pub fn save_checkpoint(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| SnakeError::io(format!("create directory {}", parent.display()), e))?;
    }
    let json = serde_json::to_string(checkpoint)?;
    fs::write(path, json).map_err(|e| SnakeError::io(format!("write checkpoint {}", path.display()), e))
}

/// Missing file is `NotFound`; a file matching neither the modern nor the
/// legacy layout is `CorruptCheckpoint`.
pub fn load_checkpoint(path: &Path) -> Result<LoadOutcome> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no checkpoint found, starting fresh");
            return Ok(LoadOutcome::NotFound);
        }
        Err(e) => return Err(SnakeError::io(format!("read checkpoint {}", path.display()), e)),
    };

    match serde_json::from_str::<Checkpoint>(&content) {
        Ok(ckpt) => {
            info!(
                n_games = ckpt.meta.n_games,
                record = ckpt.meta.record,
                "checkpoint loaded"
            );
            Ok(LoadOutcome::Modern(ckpt))
        }
        Err(modern_err) => match serde_json::from_str::<NetModel>(&content) {
            Ok(model) => {
                warn!(path = %path.display(), "legacy checkpoint without counters, progress reset to zero");
                Ok(LoadOutcome::Legacy(model))
            }
            Err(legacy_err) => Err(SnakeError::CorruptCheckpoint {
                path: path.to_path_buf(),
                reason: format!("not a checkpoint ({modern_err}) nor raw parameters ({legacy_err})"),
            }),
        },
    }
}

pub fn erase_checkpoint(path: &Path) -> Result<EraseOutcome> {
    match fs::remove_file(path) {
        Ok(()) => Ok(EraseOutcome::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(EraseOutcome::NothingToRemove),
        Err(e) => Err(SnakeError::io(format!("delete checkpoint {}", path.display()), e)),
    }
}
