//! Two-layer MLP (input -> ReLU hidden -> linear output) with hand-written
//! backprop and an Adam optimizer.
//!
//! Parameters live in one flat vector laid out as
//! `[w1 (hidden x input), b1 (hidden), w2 (output x hidden), b2 (output)]`,
//! rows indexed by the receiving neuron.

use crate::db::NetModel;
use crate::error::{Result, SnakeError};
use crate::utils::has_non_finite;
use rand::Rng;

fn relu(x: f32) -> f32 {
    x.max(0.0)
}

#[derive(Clone, Debug)]
pub struct Net {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    weights: Vec<f32>,
    grads: Vec<f32>,
    adam_m: Vec<f32>,
    adam_v: Vec<f32>,
    adam_t: i32,
}

impl Net {
    /// Uniform init in `±1/sqrt(fan_in)` for weights and biases alike.
    pub fn new<R: Rng>(input: usize, hidden: usize, output: usize, rng: &mut R) -> Self {
        let total = Self::total_weights(input, hidden, output);
        let mut weights = Vec::with_capacity(total);
        let bound1 = 1.0 / (input as f32).sqrt();
        let bound2 = 1.0 / (hidden as f32).sqrt();
        weights.extend((0..hidden * input + hidden).map(|_| rng.gen_range(-bound1..bound1)));
        weights.extend((0..output * hidden + output).map(|_| rng.gen_range(-bound2..bound2)));
        Self::with_weights(input, hidden, output, weights)
    }

    fn with_weights(input: usize, hidden: usize, output: usize, weights: Vec<f32>) -> Self {
        let n = weights.len();
        Self {
            input_size: input,
            hidden_size: hidden,
            output_size: output,
            weights,
            grads: vec![0.0; n],
            adam_m: vec![0.0; n],
            adam_v: vec![0.0; n],
            adam_t: 0,
        }
    }

    pub fn total_weights(input: usize, hidden: usize, output: usize) -> usize {
        hidden * input + hidden + output * hidden + output
    }

    fn b1_offset(&self) -> usize {
        self.hidden_size * self.input_size
    }

    fn w2_offset(&self) -> usize {
        self.b1_offset() + self.hidden_size
    }

    fn b2_offset(&self) -> usize {
        self.w2_offset() + self.output_size * self.hidden_size
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn grads(&self) -> &[f32] {
        &self.grads
    }

    /// Hidden activations and outputs.
    fn forward_full(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        debug_assert_eq!(input.len(), self.input_size);
        let (i_n, h_n) = (self.input_size, self.hidden_size);
        let w1 = &self.weights[..self.b1_offset()];
        let b1 = &self.weights[self.b1_offset()..self.w2_offset()];
        let w2 = &self.weights[self.w2_offset()..self.b2_offset()];
        let b2 = &self.weights[self.b2_offset()..];

        let hidden: Vec<f32> = (0..h_n)
            .map(|j| {
                let row = &w1[j * i_n..(j + 1) * i_n];
                relu(b1[j] + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>())
            })
            .collect();
        let output = (0..self.output_size)
            .map(|k| {
                let row = &w2[k * h_n..(k + 1) * h_n];
                b2[k] + row.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f32>()
            })
            .collect();
        (hidden, output)
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.forward_full(input).1
    }

    pub fn zero_grad(&mut self) {
        self.grads.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Accumulates dL/dθ for one sample given dL/d(output).
    pub fn backward_from_output_grad(&mut self, input: &[f32], d_out: &[f32]) {
        let (hidden, _) = self.forward_full(input);
        let (i_n, h_n, o_n) = (self.input_size, self.hidden_size, self.output_size);
        let (b1_off, w2_off, b2_off) = (self.b1_offset(), self.w2_offset(), self.b2_offset());

        let mut d_hidden = vec![0.0f32; h_n];
        for k in 0..o_n {
            let g = d_out[k];
            if g == 0.0 {
                continue;
            }
            self.grads[b2_off + k] += g;
            for j in 0..h_n {
                self.grads[w2_off + k * h_n + j] += g * hidden[j];
                d_hidden[j] += g * self.weights[w2_off + k * h_n + j];
            }
        }

        for j in 0..h_n {
            // relu'(z) is 0 wherever the activation was clamped
            if hidden[j] <= 0.0 || d_hidden[j] == 0.0 {
                continue;
            }
            let g = d_hidden[j];
            self.grads[b1_off + j] += g;
            for i in 0..i_n {
                self.grads[j * i_n + i] += g * input[i];
            }
        }
    }

    pub fn step_adam(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32) {
        self.adam_t += 1;
        let bc1 = 1.0 - beta1.powi(self.adam_t);
        let bc2 = 1.0 - beta2.powi(self.adam_t);
        for idx in 0..self.weights.len() {
            let g = self.grads[idx];
            let m = beta1 * self.adam_m[idx] + (1.0 - beta1) * g;
            let v = beta2 * self.adam_v[idx] + (1.0 - beta2) * g * g;
            self.adam_m[idx] = m;
            self.adam_v[idx] = v;
            let m_hat = m / bc1;
            let v_hat = v / bc2;
            self.weights[idx] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }

    pub fn non_finite_any(&self) -> bool {
        has_non_finite(&self.weights)
    }

    pub fn to_model(&self) -> NetModel {
        NetModel {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            output_size: self.output_size,
            weights: self.weights.clone(),
        }
    }

    /// Rebuilds a network from persisted parameters. Optimizer state starts
    /// fresh.
    pub fn from_model(model: NetModel) -> Result<Self> {
        let expected = Self::total_weights(model.input_size, model.hidden_size, model.output_size);
        if model.weights.len() != expected {
            return Err(SnakeError::ShapeMismatch {
                expected: format!("{expected} weights"),
                got: format!("{} weights", model.weights.len()),
            });
        }
        if has_non_finite(&model.weights) {
            return Err(SnakeError::NonFinite { what: "stored network parameters".into() });
        }
        Ok(Self::with_weights(model.input_size, model.hidden_size, model.output_size, model.weights))
    }

    /// Fails unless the layer sizes are exactly `(input, hidden, output)`.
    pub fn ensure_shape(&self, input: usize, hidden: usize, output: usize) -> Result<()> {
        let have = (self.input_size, self.hidden_size, self.output_size);
        if have != (input, hidden, output) {
            return Err(SnakeError::ShapeMismatch {
                expected: format!("{input}-{hidden}-{output}"),
                got: format!("{}-{}-{}", have.0, have.1, have.2),
            });
        }
        Ok(())
    }
}
