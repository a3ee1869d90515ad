use super::Layer;
use crate::{
    error::{Result, TrainErr},
    training::Scratch,
};

/// An ordered chain of fully-connected sigmoid layers.
///
/// The shape is fixed at construction: each layer's `input_size` equals the previous
/// layer's `size`. Only the update step mutates the parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Creates a new `Network`.
    ///
    /// # Arguments
    /// * `layers` - The layers, from the input side to the output side.
    ///
    /// # Returns
    /// A new `Network` or an error if there are no layers or consecutive layers don't
    /// chain.
    pub fn new(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(TrainErr::EmptyNetwork);
        }

        for pair in layers.windows(2) {
            if pair[1].input_size() != pair[0].size() {
                return Err(TrainErr::shape(
                    "layer input",
                    pair[1].input_size(),
                    pair[0].size(),
                ));
            }
        }

        Ok(Self { layers })
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// The length every input vector must have.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    /// The length of the output vector.
    #[inline]
    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].size()
    }

    /// The total amount of trainable parameters.
    pub fn param_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights().len() + l.biases().len())
            .sum()
    }

    /// Runs a forward pass, returning the output layer's activations.
    ///
    /// # Errors
    /// `ShapeMismatch` if `input` doesn't match the first layer.
    pub fn calculate(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        Ok(self.forward(input))
    }

    /// Unchecked [`Network::calculate`], for inputs already validated against the network.
    pub(crate) fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.calculate(&current);
        }
        current
    }

    /// Runs a forward pass recording every pre-activation and activation in `scratch`.
    ///
    /// The output is left in `scratch.output()`. Shapes are only debug-checked, callers
    /// on the hot path validate them once up front.
    pub fn calculate_with(&self, input: &[f64], scratch: &mut Scratch) {
        debug_assert_eq!(input.len(), self.input_size());
        debug_assert!(scratch.matches(&self.layers));

        for (i, layer) in self.layers.iter().enumerate() {
            let (inputs, pre, out) = scratch.forward_slots(i, input);
            layer.calculate_into(inputs, Some(pre), out);
        }
    }

    /// Flattens every parameter for a compute shader.
    ///
    /// Layers follow each other in order; inside a layer every node contributes its
    /// `input_size` weights followed by its bias.
    pub fn flatten_params(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.param_count());
        for layer in &self.layers {
            layer.flatten_into(&mut flat);
        }
        flat
    }

    /// Errors with `ShapeMismatch` unless `input` fits the first layer.
    pub fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(TrainErr::shape("input", input.len(), self.input_size()));
        }
        Ok(())
    }

    /// Errors with `ShapeMismatch` unless `expected` fits the output layer.
    pub fn check_expected(&self, expected: &[f64]) -> Result<()> {
        if expected.len() != self.output_size() {
            return Err(TrainErr::shape(
                "expected output",
                expected.len(),
                self.output_size(),
            ));
        }
        Ok(())
    }
}

/// Appends the constant `1.0` a compute shader multiplies against each bias.
pub fn bias_augmented(input: &[f64]) -> Vec<f32> {
    input
        .iter()
        .map(|&x| x as f32)
        .chain(std::iter::once(1.))
        .collect()
}
