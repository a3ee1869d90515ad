use crate::{
    arch::Layer,
    error::{Result, TrainErr},
};

/// Per-layer sums of weight and bias gradients, mirroring each layer's shape.
///
/// Every worker owns one, plus one combined instance the trainer reduces into. The
/// default value covers no layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gradients {
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
}

impl Gradients {
    /// Creates a new zeroed `Gradients` shaped after `layers`.
    pub fn new(layers: &[Layer]) -> Self {
        Self {
            weights: layers.iter().map(|l| vec![0.; l.weights().len()]).collect(),
            biases: layers.iter().map(|l| vec![0.; l.size()]).collect(),
        }
    }

    /// Zeroes every slot in place.
    pub fn reset(&mut self) {
        for buf in self.weights.iter_mut().chain(&mut self.biases) {
            buf.fill(0.);
        }
    }

    #[inline]
    pub fn weights(&self, layer: usize) -> &[f64] {
        &self.weights[layer]
    }

    #[inline]
    pub fn biases(&self, layer: usize) -> &[f64] {
        &self.biases[layer]
    }

    /// Returns mutable views of one layer's weight and bias sums.
    #[inline]
    pub fn layer_mut(&mut self, layer: usize) -> (&mut [f64], &mut [f64]) {
        (&mut self.weights[layer], &mut self.biases[layer])
    }

    #[inline]
    pub fn nlayers(&self) -> usize {
        self.weights.len()
    }

    /// Adds every slot of `other` into `self`.
    ///
    /// # Panics
    /// Debug-asserts both accumulators have the same shape.
    pub fn accumulate(&mut self, other: &Gradients) {
        debug_assert!(self.same_shape(other));

        let dst = self.weights.iter_mut().chain(&mut self.biases);
        let src = other.weights.iter().chain(&other.biases);
        for (d, s) in dst.zip(src) {
            for (a, b) in d.iter_mut().zip(s) {
                *a += b;
            }
        }
    }

    /// Whether both accumulators have identical per-layer lengths.
    pub fn same_shape(&self, other: &Gradients) -> bool {
        let lens = |v: &Vec<Vec<f64>>| v.iter().map(Vec::len).collect::<Vec<_>>();
        lens(&self.weights) == lens(&other.weights) && lens(&self.biases) == lens(&other.biases)
    }

    /// Errors with `ShapeMismatch` unless this accumulator mirrors `layers`.
    pub fn check_shape(&self, layers: &[Layer]) -> Result<()> {
        if self.weights.len() != layers.len() {
            return Err(TrainErr::shape(
                "gradient layers",
                self.weights.len(),
                layers.len(),
            ));
        }

        for ((w, b), layer) in self.weights.iter().zip(&self.biases).zip(layers) {
            if w.len() != layer.weights().len() {
                return Err(TrainErr::shape(
                    "weight gradients",
                    w.len(),
                    layer.weights().len(),
                ));
            }
            if b.len() != layer.size() {
                return Err(TrainErr::shape("bias gradients", b.len(), layer.size()));
            }
        }

        Ok(())
    }

    /// Whether every slot is zero.
    pub fn is_zero(&self) -> bool {
        self.weights
            .iter()
            .chain(&self.biases)
            .all(|buf| buf.iter().all(|&g| g == 0.))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers() -> Vec<Layer> {
        vec![
            Layer::new(3, vec![0.; 6], vec![0.; 2]).unwrap(),
            Layer::new(2, vec![0.; 2], vec![0.; 1]).unwrap(),
        ]
    }

    #[test]
    fn mirrors_layer_shapes() {
        let layers = layers();
        let grads = Gradients::new(&layers);

        assert_eq!(grads.nlayers(), 2);
        assert_eq!(grads.weights(0).len(), 6);
        assert_eq!(grads.biases(1).len(), 1);
        assert!(grads.check_shape(&layers).is_ok());
        assert!(grads.check_shape(&layers[1..]).is_err());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut grads = Gradients::new(&layers());
        let (w, b) = grads.layer_mut(0);
        w[4] = 1.5;
        b[1] = -2.;

        grads.reset();
        let once = grads.clone();
        grads.reset();

        assert!(grads.is_zero());
        assert_eq!(grads, once);
    }

    #[test]
    fn accumulate_sums_slotwise() {
        let layers = layers();
        let mut a = Gradients::new(&layers);
        let mut b = Gradients::new(&layers);
        a.layer_mut(1).0[0] = 1.;
        b.layer_mut(1).0[0] = 2.;
        b.layer_mut(0).1[1] = 0.5;

        a.accumulate(&b);

        assert_eq!(a.weights(1), &[3., 0.]);
        assert_eq!(a.biases(0), &[0., 0.5]);
    }
}
