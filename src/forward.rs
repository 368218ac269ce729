//! The arithmetic of the forward pass.
//!
//! The pipeline stages and the sequential reference share these functions so both
//! accumulate in the same order and produce bit-identical activations.

use crate::params::{ParameterStore, Unit};

/// The logistic function `1 / (1 + e^-x)`.
pub fn logistic(x: f64) -> f64 {
    1. / (1. + (-x).exp())
}

/// ReLU activation of a hidden unit for one record.
///
/// The weighted pixel sum is accumulated in pixel order before the bias is added.
pub fn hidden_activation(unit: &Unit, pixels: &[u8]) -> f64 {
    let sum = unit
        .weights()
        .iter()
        .zip(pixels)
        .fold(0., |acc, (w, &p)| acc + f64::from(p) * w);

    (sum + unit.bias()).max(0.)
}

/// Activation of an output unit given every hidden activation in unit order.
///
/// The logistic term is added to the weighted sum rather than replacing it.
///
/// # Arguments
/// * `unit` - The output unit.
/// * `hidden` - The hidden layer activations.
/// * `with_bias` - Whether to add the unit's bias to the weighted sum.
pub fn output_activation(unit: &Unit, hidden: &[f64], with_bias: bool) -> f64 {
    let mut sum = unit
        .weights()
        .iter()
        .zip(hidden)
        .fold(0., |acc, (w, h)| acc + h * w);

    if with_bias {
        sum += unit.bias();
    }

    sum + logistic(sum)
}

/// Index of the highest activation, the first one wins on ties.
pub fn predict(outputs: &[f64]) -> usize {
    let mut best = 0;

    for (idx, &value) in outputs.iter().enumerate().skip(1) {
        if value > outputs[best] {
            best = idx;
        }
    }

    best
}

/// Runs one record through the whole network on the calling thread.
///
/// # Returns
/// The output activations and the predicted class.
pub fn classify(store: &ParameterStore, pixels: &[u8], with_bias: bool) -> (Vec<f64>, usize) {
    let hidden: Vec<_> = store
        .hidden()
        .iter()
        .map(|unit| hidden_activation(unit, pixels))
        .collect();

    let outputs: Vec<_> = store
        .output()
        .iter()
        .map(|unit| output_activation(unit, &hidden, with_bias))
        .collect();

    let prediction = predict(&outputs);
    (outputs, prediction)
}
