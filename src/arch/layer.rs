use super::activation::sigmoid;
use crate::{
    error::{Result, TrainErr},
    initialization::ParamGen,
};

/// A fully-connected sigmoid layer.
///
/// Weights are stored row-major, one row per node: the weight connecting input `i` to
/// node `n` lives at `n * input_size + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    input_size: usize,
    size: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Layer {
    /// Creates a new `Layer` from explicit parameters.
    ///
    /// # Arguments
    /// * `input_size` - The amount of inputs feeding each node.
    /// * `weights` - The row-major weights, `biases.len() * input_size` of them.
    /// * `biases` - One bias per node.
    ///
    /// # Returns
    /// A new `Layer` or a `ShapeMismatch` if the weights don't fill the layer.
    pub fn new(input_size: usize, weights: Vec<f64>, biases: Vec<f64>) -> Result<Self> {
        let size = biases.len();

        if weights.len() != size * input_size {
            return Err(TrainErr::shape("layer weights", weights.len(), size * input_size));
        }

        Ok(Self {
            input_size,
            size,
            weights,
            biases,
        })
    }

    /// Creates a new `Layer` whose parameters are drawn from a generator.
    ///
    /// For every node, `input_size` weights are sampled followed by its bias.
    ///
    /// # Arguments
    /// * `input_size` - The amount of inputs feeding each node.
    /// * `size` - The amount of nodes.
    /// * `param_gen` - The generator to draw the initial parameters from.
    /// * `index` - The position of the layer in the network, for error reporting.
    ///
    /// # Returns
    /// A new `Layer` or an error if the generator runs dry.
    pub fn generate<G>(
        input_size: usize,
        size: usize,
        param_gen: &mut G,
        index: usize,
    ) -> Result<Self>
    where
        G: ParamGen + ?Sized,
    {
        let mut weights = Vec::with_capacity(size * input_size);
        let mut biases = Vec::with_capacity(size);
        let exhausted = || TrainErr::ParamGenExhausted { layer: index };

        for _ in 0..size {
            weights.extend(param_gen.sample_exact(input_size).ok_or_else(exhausted)?);
            biases.extend(param_gen.sample_exact(1).ok_or_else(exhausted)?);
        }

        Self::new(input_size, weights, biases)
    }

    /// The amount of inputs feeding each node.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// The amount of nodes in the layer.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Returns mutable views of the weights and biases, for the update step.
    #[inline]
    pub fn params_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.weights, &mut self.biases)
    }

    /// Returns the weight connecting `input` to `node`.
    #[inline]
    pub fn weight(&self, node: usize, input: usize) -> f64 {
        self.weights[node * self.input_size + input]
    }

    /// Returns the pre-activation of `node`: its bias plus the weighted sum of `inputs`.
    #[inline]
    pub fn weighted_sum(&self, node: usize, inputs: &[f64]) -> f64 {
        debug_assert!(node < self.size);
        debug_assert_eq!(inputs.len(), self.input_size);

        let row = &self.weights[node * self.input_size..(node + 1) * self.input_size];
        let mut sum = self.biases[node];
        for (x, w) in inputs.iter().zip(row) {
            sum += x * w;
        }

        sum
    }

    /// Computes the activation of a single node.
    ///
    /// # Arguments
    /// * `node` - The index of the node.
    /// * `inputs` - The layer's input vector.
    #[inline]
    pub fn calculate_node(&self, node: usize, inputs: &[f64]) -> f64 {
        sigmoid(self.weighted_sum(node, inputs))
    }

    /// Computes every node of the layer into `out`.
    ///
    /// Every slot of `out` (and of `pre`, when given) is overwritten.
    ///
    /// # Arguments
    /// * `inputs` - The layer's input vector.
    /// * `pre` - Optional buffer where the pre-activations are recorded for backprop.
    /// * `out` - Buffer for the activations, one per node.
    pub fn calculate_into(&self, inputs: &[f64], mut pre: Option<&mut [f64]>, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.size);

        for (node, a) in out.iter_mut().enumerate() {
            let z = self.weighted_sum(node, inputs);
            if let Some(pre) = pre.as_deref_mut() {
                pre[node] = z;
            }
            *a = sigmoid(z);
        }
    }

    /// Computes every node of the layer into a new vector.
    pub fn calculate(&self, inputs: &[f64]) -> Vec<f64> {
        let mut out = vec![0.; self.size];
        self.calculate_into(inputs, None, &mut out);
        out
    }

    /// Appends the layer's parameters flattened for a compute shader: for each node its
    /// `input_size` weights followed by its bias.
    pub fn flatten_into(&self, out: &mut Vec<f32>) {
        for (node, &bias) in self.biases.iter().enumerate() {
            let row = &self.weights[node * self.input_size..(node + 1) * self.input_size];
            out.extend(row.iter().map(|&w| w as f32));
            out.push(bias as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::LiteralParamGen;

    fn layer_2x2() -> Layer {
        Layer::new(2, vec![0.15, 0.2, 0.25, 0.3], vec![0.35, 0.35]).unwrap()
    }

    #[test]
    fn weights_are_row_major() {
        let layer = layer_2x2();
        assert_eq!(layer.weight(0, 1), 0.2);
        assert_eq!(layer.weight(1, 0), 0.25);
    }

    #[test]
    fn rejects_ragged_weights() {
        let err = Layer::new(3, vec![0.; 5], vec![0.; 2]).unwrap_err();
        assert!(matches!(
            err,
            TrainErr::ShapeMismatch {
                got: 5,
                expected: 6,
                ..
            }
        ));
    }

    #[test]
    fn calculate_records_pre_activations() {
        let layer = layer_2x2();
        let mut pre = [0.; 2];
        let mut out = [0.; 2];

        layer.calculate_into(&[0.05, 0.1], Some(&mut pre), &mut out);

        assert!((pre[0] - 0.3775).abs() < 1e-12);
        assert!((out[0] - 0.593_269_992).abs() < 1e-6);
        assert!((out[1] - 0.596_884_378).abs() < 1e-6);
        assert_eq!(out[1], layer.calculate_node(1, &[0.05, 0.1]));
    }

    #[test]
    fn generate_consumes_weights_then_bias_per_node() {
        let mut param_gen = LiteralParamGen::new(vec![0.15, 0.2, 0.35, 0.25, 0.3, 0.35]);
        let layer = Layer::generate(2, 2, &mut param_gen, 0).unwrap();

        assert_eq!(layer, layer_2x2());
        assert_eq!(param_gen.remaining(), 0);
    }

    #[test]
    fn generate_reports_exhaustion() {
        let mut param_gen = LiteralParamGen::new(vec![0.5; 4]);
        let err = Layer::generate(2, 2, &mut param_gen, 3).unwrap_err();
        assert!(matches!(err, TrainErr::ParamGenExhausted { layer: 3 }));
    }

    #[test]
    fn flatten_appends_bias_after_each_row() {
        let mut flat = Vec::new();
        layer_2x2().flatten_into(&mut flat);
        assert_eq!(flat, vec![0.15, 0.2, 0.35, 0.25, 0.3, 0.35]);
    }

    #[test]
    fn flatten_keeps_biases_of_inputless_nodes() {
        let layer = Layer::new(0, vec![], vec![0.5, -0.25]).unwrap();
        let mut flat = Vec::new();
        layer.flatten_into(&mut flat);
        assert_eq!(flat, vec![0.5, -0.25]);
    }
}
