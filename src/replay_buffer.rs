use crate::game_input::State;
use crate::snake::Action;
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::VecDeque;

/// One (s, a, r, s', done) experience.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f32,
    pub next_state: State,
    pub done: bool,
}

/// Bounded FIFO of transitions; the oldest entry goes first once full.
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
        }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// `batch_size` distinct transitions chosen uniformly, or everything when
    /// the buffer holds no more than that. Order is unspecified.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<&Transition> {
        if self.buffer.len() > batch_size {
            self.buffer.iter().choose_multiple(rng, batch_size)
        } else {
            self.buffer.iter().collect()
        }
    }
}
