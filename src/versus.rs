use crate::config::GameConfig;
use crate::dqn::greedy_action;
use crate::error::Result;
use crate::game::Game;
use crate::game_input::GameInput;
use crate::network::Net;
use crate::snake::Direction;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersusScores {
    pub human: u32,
    pub ai: u32,
}

/// Human against a frozen policy, each on its own board. A side that dies
/// is respawned with its score reset; the other side plays on.
pub struct Versus {
    human: Game,
    ai: Game,
    policy: Net,
}

impl Versus {
    pub fn new(game_cfg: &GameConfig, policy: Net, seed: Option<u64>) -> Result<Self> {
        // sides die only by collision here
        let cfg = GameConfig { stall_factor: 0, ..game_cfg.clone() };
        Ok(Self {
            human: Game::new(cfg.clone(), seed)?,
            ai: Game::new(cfg, seed.map(|s| s.wrapping_add(1)))?,
            policy,
        })
    }

    pub fn human(&self) -> &Game {
        &self.human
    }

    pub fn ai(&self) -> &Game {
        &self.ai
    }

    /// Advances both boards one tick. `human_heading` of `None` keeps the
    /// human snake's heading.
    pub fn tick(&mut self, human_heading: Option<Direction>) -> Result<VersusScores> {
        let heading = human_heading.unwrap_or(self.human.direction());
        if self.human.step_heading(heading)?.done {
            info!(score = self.human.score(), "human snake died");
            self.human.reset()?;
        }

        let action = greedy_action(&self.policy, &GameInput::from_game(&self.ai));
        if self.ai.step(action)?.done {
            info!(score = self.ai.score(), "ai snake died");
            self.ai.reset()?;
        }

        Ok(VersusScores { human: self.human.score(), ai: self.ai.score() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_input::STATE_SIZE;
    use crate::utils::Point;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn versus() -> Versus {
        let net = Net::new(STATE_SIZE, 16, 3, &mut StdRng::seed_from_u64(0));
        Versus::new(&GameConfig::default(), net, Some(5)).unwrap()
    }

    #[test]
    fn boards_are_independent() {
        let mut v = versus();
        v.human.set_food(Point::new(340, 240)).unwrap();
        v.ai.set_food(Point::new(0, 0)).unwrap();
        let scores = v.tick(None).unwrap();
        assert_eq!(scores.human, 1);
        assert_eq!(v.human().body().len(), 4);
        assert_eq!(v.ai().body().len(), 3);
    }

    #[test]
    fn human_cannot_reverse() {
        let mut v = versus();
        v.human.set_food(Point::new(0, 0)).unwrap();
        v.tick(Some(Direction::Left)).unwrap();
        assert_eq!(v.human().direction(), Direction::Right);
        assert_eq!(v.human().head(), Point::new(340, 240));
    }

    #[test]
    fn dead_side_respawns_with_zero_score() {
        let mut v = versus();
        v.human.set_food(Point::new(340, 240)).unwrap();
        assert_eq!(v.tick(None).unwrap().human, 1);
        v.human.set_food(Point::new(0, 0)).unwrap();
        // run into the right wall
        let mut scores = v.tick(None).unwrap();
        for _ in 0..20 {
            if v.human().body().len() == 3 {
                break;
            }
            scores = v.tick(None).unwrap();
        }
        assert_eq!(scores.human, 0);
        assert_eq!(v.human().head(), Point::new(320, 240));
        assert_eq!(v.human().direction(), Direction::Right);
    }
}
