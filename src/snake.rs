use crate::utils::Point;
use serde::{Deserialize, Serialize};

/// Heading of a snake. Declaration order is the clockwise cycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const CLOCKWISE: [Direction; 4] =
        [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    fn clockwise_index(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Up => 3,
        }
    }

    /// Opposite heading (180°).
    pub fn opposite(self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_index() + 2) % 4]
    }

    /// One step counter-clockwise.
    pub fn left(self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_index() + 3) % 4]
    }

    /// One step clockwise.
    pub fn right(self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_index() + 1) % 4]
    }

    /// Unit offset in cells; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Move relative to the current heading. A reversal is not representable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Straight,
    TurnRight,
    TurnLeft,
}

impl Action {
    /// Network output order.
    pub const ALL: [Action; 3] = [Action::Straight, Action::TurnRight, Action::TurnLeft];

    pub fn index(self) -> usize {
        match self {
            Action::Straight => 0,
            Action::TurnRight => 1,
            Action::TurnLeft => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Action> {
        Self::ALL.get(i).copied()
    }

    /// Heading after taking this action from `heading`.
    pub fn apply(self, heading: Direction) -> Direction {
        match self {
            Action::Straight => heading,
            Action::TurnRight => heading.right(),
            Action::TurnLeft => heading.left(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Snake {
    body: Vec<Point>, // body[0] is the head
    direction: Direction,
}

impl Snake {
    /// Head at `head_position`, the rest trailing behind it, one cell apart.
    pub fn new(head_position: Point, init_length: usize, direction: Direction, cell: i32) -> Snake {
        let (dx, dy) = direction.opposite().delta();
        let body = (0..init_length as i32)
            .map(|i| head_position.offset(dx * i, dy * i, cell))
            .collect();
        Snake { body, direction }
    }

    pub fn head(&self) -> Point {
        self.body[0]
    }

    pub fn body(&self) -> &[Point] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn contains(&self, p: Point) -> bool {
        self.body.contains(&p)
    }

    /// Whether `p` is on the body behind the head.
    pub fn hits_tail_section(&self, p: Point) -> bool {
        self.body[1..].contains(&p)
    }

    pub fn push_head(&mut self, p: Point) {
        self.body.insert(0, p);
    }

    pub fn pop_tail(&mut self) {
        self.body.pop();
    }
}
