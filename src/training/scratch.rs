use crate::arch::Layer;

/// Per-worker buffers for one in-flight example.
///
/// Holds, for every layer and node, the pre-activation, the activation and the
/// backpropagated delta. Each worker owns exactly one and reuses it for every example
/// it processes, so the hot path never allocates once the scratch is warmed up.
#[derive(Debug, Clone)]
pub struct Scratch {
    pre_activations: Vec<Vec<f64>>,
    activations: Vec<Vec<f64>>,
    deltas: Vec<Vec<f64>>,
}

impl Scratch {
    /// Creates a new zeroed `Scratch` shaped after `layers`.
    pub fn new(layers: &[Layer]) -> Self {
        let zeros: Vec<Vec<f64>> = layers.iter().map(|l| vec![0.; l.size()]).collect();

        Self {
            pre_activations: zeros.clone(),
            activations: zeros.clone(),
            deltas: zeros,
        }
    }

    /// Zeroes every slot in place.
    pub fn reset(&mut self) {
        for buf in self
            .pre_activations
            .iter_mut()
            .chain(&mut self.activations)
            .chain(&mut self.deltas)
        {
            buf.fill(0.);
        }
    }

    /// Whether this scratch has one slot per node of `layers`.
    pub fn matches(&self, layers: &[Layer]) -> bool {
        self.activations.len() == layers.len()
            && self
                .activations
                .iter()
                .zip(layers)
                .all(|(a, l)| a.len() == l.size())
    }

    /// The number of layers this scratch covers.
    #[inline]
    pub fn nlayers(&self) -> usize {
        self.activations.len()
    }

    #[inline]
    pub fn pre_activations(&self, layer: usize) -> &[f64] {
        &self.pre_activations[layer]
    }

    #[inline]
    pub fn activations(&self, layer: usize) -> &[f64] {
        &self.activations[layer]
    }

    #[inline]
    pub fn deltas(&self, layer: usize) -> &[f64] {
        &self.deltas[layer]
    }

    /// The activations of the last layer.
    #[inline]
    pub fn output(&self) -> &[f64] {
        self.activations.last().map_or(&[], Vec::as_slice)
    }

    /// The vector that fed `layer`: `input` for the first layer, the previous layer's
    /// activations otherwise.
    #[inline]
    pub fn layer_input<'a>(&'a self, layer: usize, input: &'a [f64]) -> &'a [f64] {
        match layer {
            0 => input,
            _ => &self.activations[layer - 1],
        }
    }

    /// Splits out the buffers the forward pass of `layer` needs: its input, and
    /// mutable slots for its pre-activations and activations.
    pub(crate) fn forward_slots<'a>(
        &'a mut self,
        layer: usize,
        input: &'a [f64],
    ) -> (&'a [f64], &'a mut [f64], &'a mut [f64]) {
        let (done, rest) = self.activations.split_at_mut(layer);
        let inputs = done.last().map_or(input, Vec::as_slice);
        (inputs, &mut self.pre_activations[layer], &mut rest[0])
    }

    /// Splits out the buffers the backward pass of `layer` needs: its pre-activations,
    /// its activations, the deltas of the following layer (empty for the output layer)
    /// and a mutable slot for its own deltas.
    pub(crate) fn backward_slots(
        &mut self,
        layer: usize,
    ) -> (&[f64], &[f64], &[f64], &mut [f64]) {
        let (head, tail) = self.deltas.split_at_mut(layer + 1);
        let next = tail.first().map_or(&[][..], Vec::as_slice);
        (
            &self.pre_activations[layer],
            &self.activations[layer],
            next,
            &mut head[layer],
        )
    }
}
