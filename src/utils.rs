use serde::{Deserialize, Serialize};

/// Grid coordinate in pixels, always a multiple of the cell size.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Point shifted by `(dx, dy)` cells of `cell` pixels each.
    pub fn offset(self, dx: i32, dy: i32, cell: i32) -> Self {
        Self { x: self.x + dx * cell, y: self.y + dy * cell }
    }
}

/// Index of the largest element; the first one wins on ties.
pub fn argmax(v: &[f32]) -> usize {
    let mut best_i = 0;
    let mut best_v = f32::NEG_INFINITY;
    for (i, &x) in v.iter().enumerate() {
        if x > best_v {
            best_v = x;
            best_i = i;
        }
    }
    best_i
}

pub fn has_non_finite(xs: &[f32]) -> bool {
    xs.iter().any(|&v| !v.is_finite())
}

/// min / max / mean of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

pub fn vec_stats(xs: &[f32]) -> Stats {
    if xs.is_empty() {
        return Stats { min: 0.0, max: 0.0, mean: 0.0 };
    }
    let mut mn = xs[0];
    let mut mx = xs[0];
    let mut sum = 0.0f32;
    for &v in xs {
        mn = mn.min(v);
        mx = mx.max(v);
        sum += v;
    }
    Stats { min: mn, max: mx, mean: sum / xs.len() as f32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
        assert_eq!(argmax(&[5.0]), 0);
    }

    #[test]
    fn stats_of_series() {
        let s = vec_stats(&[1.0, 3.0, 2.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert!((s.mean - 2.0).abs() < 1e-6);
        assert_eq!(vec_stats(&[]).mean, 0.0);
    }

    #[test]
    fn non_finite_detection() {
        assert!(!has_non_finite(&[0.0, 1.0]));
        assert!(has_non_finite(&[0.0, f32::NAN]));
        assert!(has_non_finite(&[f32::INFINITY]));
    }

    #[test]
    fn offset_moves_whole_cells() {
        let p = Point::new(320, 240);
        assert_eq!(p.offset(1, 0, 20), Point::new(340, 240));
        assert_eq!(p.offset(0, -1, 20), Point::new(320, 220));
    }
}
