use crate::error::{Result, SnakeError};
use crate::snake::Snake;
use crate::utils::Point;
use rand::Rng;
use rand::seq::IteratorRandom;

#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    pub position: Point,
}

impl Food {
    pub fn new(position: Point) -> Self {
        Self { position }
    }

    /// Moves the food to a uniformly chosen cell not covered by the snake.
    /// Samples the free cells directly, so a nearly full grid costs no retries.
    pub fn respawn<R: Rng>(&mut self, snake: &Snake, cols: i32, rows: i32, cell: i32, rng: &mut R) -> Result<()> {
        let free = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| Point::new(c * cell, r * cell)))
            .filter(|p| !snake.contains(*p));
        match free.choose(rng) {
            Some(p) => {
                self.position = p;
                Ok(())
            }
            None => Err(SnakeError::GridFull { cells: (cols * rows) as usize }),
        }
    }

    /// Places the food at a fixed cell, refusing cells under the snake.
    pub fn place_at(&mut self, p: Point, snake: &Snake) -> Result<()> {
        if snake.contains(p) {
            return Err(SnakeError::FoodOnSnake { x: p.x, y: p.y });
        }
        self.position = p;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn respawn_avoids_body() {
        let snake = Snake::new(Point::new(40, 0), 3, Direction::Right, 20);
        let mut food = Food::new(Point::new(0, 0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            food.respawn(&snake, 4, 1, 20, &mut rng).unwrap();
            assert_eq!(food.position, Point::new(60, 0));
        }
    }

    #[test]
    fn full_grid_is_an_error() {
        let snake = Snake::new(Point::new(40, 0), 3, Direction::Right, 20);
        let mut food = Food::new(Point::new(0, 0));
        let mut rng = StdRng::seed_from_u64(7);
        let err = food.respawn(&snake, 3, 1, 20, &mut rng).unwrap_err();
        assert!(matches!(err, SnakeError::GridFull { cells: 3 }));
    }

    #[test]
    fn place_at_rejects_occupied_cell() {
        let snake = Snake::new(Point::new(40, 0), 3, Direction::Right, 20);
        let mut food = Food::new(Point::new(100, 100));
        assert!(food.place_at(Point::new(20, 0), &snake).is_err());
        assert_eq!(food.position, Point::new(100, 100));
        food.place_at(Point::new(60, 0), &snake).unwrap();
        assert_eq!(food.position, Point::new(60, 0));
    }

    #[test]
    fn respawn_stays_on_grid() {
        let snake = Snake::new(Point::new(320, 240), 3, Direction::Right, 20);
        let mut food = Food::new(Point::new(0, 0));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            food.respawn(&snake, 32, 24, 20, &mut rng).unwrap();
            let p = food.position;
            assert!(p.x >= 0 && p.x <= 620 && p.y >= 0 && p.y <= 460);
            assert_eq!(p.x % 20, 0);
            assert_eq!(p.y % 20, 0);
            assert!(!snake.contains(p));
        }
    }
}
