use snake_qlearn::config::{Config, GameConfig};
use snake_qlearn::db::{self, EraseOutcome, LoadOutcome};
use snake_qlearn::dqn::AgentConfig;
use snake_qlearn::training::{Mode, TrainingLoop};
use std::path::Path;

fn cfg(checkpoint: &Path) -> Config {
    Config {
        game: GameConfig { width: 160, height: 160, ..GameConfig::default() },
        agent: AgentConfig { hidden: 16, batch_size: 32, ..AgentConfig::default() },
        checkpoint: checkpoint.to_path_buf(),
        autosave_every: 1,
        ..Config::default()
    }
}

fn saved_games(path: &Path) -> u32 {
    match db::load_checkpoint(path).unwrap() {
        LoadOutcome::Modern(c) => c.meta.n_games,
        other => panic!("expected a checkpoint, got {other:?}"),
    }
}

#[test]
fn training_picks_up_where_it_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");

    let mut first = TrainingLoop::new(cfg(&path), Mode::Train, Some(1)).unwrap();
    first.run(Some(3)).unwrap();
    assert_eq!(saved_games(&path), 3);

    let mut second = TrainingLoop::new(cfg(&path), Mode::Train, Some(2)).unwrap();
    assert_eq!(second.agent().n_games, 3);
    assert_eq!(second.agent().epsilon(), 77);
    second.run(Some(2)).unwrap();
    assert_eq!(saved_games(&path), 5);
    assert_eq!(second.stats().games(), 2);
}

#[test]
fn reset_then_start_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    TrainingLoop::new(cfg(&path), Mode::Train, Some(1)).unwrap().run(Some(1)).unwrap();

    assert_eq!(db::erase_checkpoint(&path).unwrap(), EraseOutcome::Removed);
    let tl = TrainingLoop::new(cfg(&path), Mode::Train, Some(1)).unwrap();
    assert_eq!(tl.agent().n_games, 0);
    assert_eq!(tl.record(), 0);
}
