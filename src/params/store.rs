use log::debug;

use super::{
    error::{ParamErr, Result},
    text::{self, ParamPaths},
};

/// A single neuron's parameters: its incoming weights and its bias.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    weights: Box<[f64]>,
    bias: f64,
}

impl Unit {
    /// Creates a new `Unit`.
    ///
    /// # Arguments
    /// * `weights` - One weight per input of the layer.
    /// * `bias` - The unit's bias.
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self {
            weights: weights.into_boxed_slice(),
            bias,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

/// The read-only parameters of the 2-layer network.
///
/// Built once before the pipeline starts and shared by every stage afterwards,
/// nothing mutates it during a run.
#[derive(Debug)]
pub struct ParameterStore {
    inputs: usize,
    hidden: Box<[Unit]>,
    output: Box<[Unit]>,
}

impl ParameterStore {
    /// Creates a new `ParameterStore` checking that both layers line up.
    ///
    /// # Arguments
    /// * `hidden` - The hidden layer units, all of them with the same amount of weights.
    /// * `output` - The output layer units, each with one weight per hidden unit.
    ///
    /// # Returns
    /// A `ParamErr` if either layer is empty or the weight rows don't match in size.
    pub fn new(hidden: Vec<Unit>, output: Vec<Unit>) -> Result<Self> {
        let inputs = hidden
            .first()
            .map(|unit| unit.weights.len())
            .ok_or(ParamErr::Empty {
                what: "hidden layer",
            })?;

        if output.is_empty() {
            return Err(ParamErr::Empty {
                what: "output layer",
            });
        }

        if let Some(unit) = hidden.iter().find(|unit| unit.weights.len() != inputs) {
            return Err(ParamErr::Shape {
                what: "hidden unit weights",
                expected: inputs,
                got: unit.weights.len(),
            });
        }

        if let Some(unit) = output.iter().find(|unit| unit.weights.len() != hidden.len()) {
            return Err(ParamErr::Shape {
                what: "output unit weights",
                expected: hidden.len(),
                got: unit.weights.len(),
            });
        }

        Ok(Self {
            inputs,
            hidden: hidden.into_boxed_slice(),
            output: output.into_boxed_slice(),
        })
    }

    /// Loads the four parameter files of the network.
    ///
    /// # Arguments
    /// * `paths` - Where the weights and biases of each layer live.
    pub fn from_files(paths: &ParamPaths) -> Result<Self> {
        let hidden = text::read_layer(&paths.hidden_weights, &paths.hidden_biases, "hidden")?;
        let output = text::read_layer(&paths.output_weights, &paths.output_biases, "output")?;

        let store = Self::new(hidden, output)?;
        debug!(
            "loaded network: {} inputs, {} hidden units, {} output units",
            store.inputs(),
            store.hidden().len(),
            store.output().len()
        );

        Ok(store)
    }

    /// The record length every hidden unit expects.
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn hidden(&self) -> &[Unit] {
        &self.hidden
    }

    pub fn output(&self) -> &[Unit] {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_line_up() {
        let hidden = vec![Unit::new(vec![1., 2., 3.], 0.), Unit::new(vec![4., 5., 6.], 1.)];
        let output = vec![Unit::new(vec![1., 1.], 0.)];

        let store = ParameterStore::new(hidden, output).unwrap();
        assert_eq!(store.inputs(), 3);
        assert_eq!(store.hidden().len(), 2);
        assert_eq!(store.output().len(), 1);
        assert_eq!(store.hidden()[1].bias(), 1.);
    }

    #[test]
    fn test_ragged_hidden_layer_is_rejected() {
        let hidden = vec![Unit::new(vec![1., 2.], 0.), Unit::new(vec![1.], 0.)];
        let output = vec![Unit::new(vec![1., 1.], 0.)];

        let err = ParameterStore::new(hidden, output).unwrap_err();
        assert!(matches!(
            err,
            ParamErr::Shape {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_output_width_must_match_hidden_count() {
        let hidden = vec![Unit::new(vec![1.], 0.); 3];
        let output = vec![Unit::new(vec![1., 1.], 0.)];

        let err = ParameterStore::new(hidden, output).unwrap_err();
        assert!(matches!(
            err,
            ParamErr::Shape {
                expected: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_layers_are_rejected() {
        let err = ParameterStore::new(Vec::new(), vec![Unit::new(vec![], 0.)]).unwrap_err();
        assert!(matches!(err, ParamErr::Empty { .. }));

        let err = ParameterStore::new(vec![Unit::new(vec![1.], 0.)], Vec::new()).unwrap_err();
        assert!(matches!(err, ParamErr::Empty { .. }));
    }
}
