use crate::game::Game;
use crate::snake::Direction;
use crate::utils::Point;

pub const STATE_SIZE: usize = 11;

/// Eleven 0/1 flags:
/// `[danger straight, danger right, danger left,
///   heading left, heading right, heading up, heading down,
///   food left, food right, food up, food down]`.
pub type State = [f32; STATE_SIZE];

pub struct GameInput;

impl GameInput {
    pub fn from_game(game: &Game) -> State {
        Self::encode(
            game.head(),
            game.direction(),
            game.food(),
            game.config().block_size,
            |p| game.is_collision(p),
        )
    }

    /// Pure encoder; `is_collision` is probed on the three cells reachable
    /// from `head` without reversing.
    pub fn encode(
        head: Point,
        heading: Direction,
        food: Point,
        cell: i32,
        is_collision: impl Fn(Point) -> bool,
    ) -> State {
        let probe = |d: Direction| {
            let (dx, dy) = d.delta();
            flag(is_collision(head.offset(dx, dy, cell)))
        };

        [
            probe(heading),
            probe(heading.right()),
            probe(heading.left()),
            flag(heading == Direction::Left),
            flag(heading == Direction::Right),
            flag(heading == Direction::Up),
            flag(heading == Direction::Down),
            flag(food.x < head.x),
            flag(food.x > head.x),
            flag(food.y < head.y),
            flag(food.y > head.y),
        ]
    }
}

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::snake::Action;

    #[test]
    fn spawn_state() {
        let mut g = Game::new(GameConfig::default(), Some(3)).unwrap();
        g.set_food(Point::new(0, 0)).unwrap();
        let s = GameInput::from_game(&g);
        assert_eq!(s, [0., 0., 0., 0., 1., 0., 0., 1., 0., 1., 0.]);
    }

    #[test]
    fn food_flags_are_independent() {
        let s = GameInput::encode(Point::new(100, 100), Direction::Up, Point::new(140, 160), 20, |_| false);
        assert_eq!(&s[7..], &[0., 1., 0., 1.]);
        let s = GameInput::encode(Point::new(100, 100), Direction::Up, Point::new(100, 100), 20, |_| false);
        assert_eq!(&s[7..], &[0., 0., 0., 0.]);
    }

    #[test]
    fn danger_is_relative_to_heading() {
        // heading up at the left wall: only the left turn is deadly
        let s = GameInput::encode(Point::new(0, 100), Direction::Up, Point::new(0, 0), 20, |p| p.x < 0);
        assert_eq!(&s[..3], &[0., 0., 1.]);
        // heading down at the left wall: the right turn is deadly
        let s = GameInput::encode(Point::new(0, 100), Direction::Down, Point::new(0, 0), 20, |p| p.x < 0);
        assert_eq!(&s[..3], &[0., 1., 0.]);
        assert_eq!(&s[3..7], &[0., 0., 0., 1.]);
    }

    #[test]
    fn danger_straight_at_wall() {
        let mut g = Game::new(GameConfig::default(), Some(3)).unwrap();
        g.set_food(Point::new(0, 0)).unwrap();
        for _ in 0..15 {
            g.step(Action::Straight).unwrap();
        }
        assert_eq!(g.head(), Point::new(620, 240));
        let s = GameInput::from_game(&g);
        assert_eq!(&s[..3], &[1., 0., 0.]);
    }

    #[test]
    fn body_counts_as_danger() {
        let mut g = Game::new(GameConfig::default(), Some(3)).unwrap();
        g.set_food(Point::new(340, 240)).unwrap();
        g.step(Action::Straight).unwrap();
        g.set_food(Point::new(0, 0)).unwrap();
        g.step(Action::TurnRight).unwrap();
        g.step(Action::TurnRight).unwrap();
        assert_eq!(g.direction(), Direction::Left);
        assert_eq!(g.head(), Point::new(320, 260));
        // a right turn from here leads up into (320,240), which is body
        let s = GameInput::from_game(&g);
        assert_eq!(&s[..3], &[0., 1., 0.]);
    }
}
