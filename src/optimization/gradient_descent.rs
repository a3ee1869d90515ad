use std::num::NonZeroUsize;

use super::{Optimizer, optimizer::check_lengths};
use crate::error::Result;

/// Plain mini-batch gradient descent: `p -= g * lr / batch_len`.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    ///
    /// # Returns
    /// A new `GradientDescent` instance.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Optimizer for GradientDescent {
    fn update_params(
        &mut self,
        grad: &[f64],
        params: &mut [f64],
        batch_len: NonZeroUsize,
    ) -> Result<()> {
        check_lengths(grad, params)?;

        let lr = self.learning_rate;
        let n = batch_len.get() as f64;

        for (p, g) in params.iter_mut().zip(grad) {
            *p -= g * lr / n;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arch::{Layer, Network},
        error::TrainErr,
        training::Gradients,
    };

    fn batch(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn averages_over_the_batch() {
        let mut optimizer = GradientDescent::new(0.5);
        let mut params = [1., 2.];

        optimizer.update_params(&[4., -2.], &mut params, batch(2)).unwrap();

        assert_eq!(params, [0., 2.5]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let mut optimizer = GradientDescent::new(0.1);
        let err = optimizer
            .update_params(&[1.], &mut [0., 0.], batch(1))
            .unwrap_err();

        assert!(matches!(err, TrainErr::ShapeMismatch { .. }));
    }

    #[test]
    fn updates_every_layer() {
        let mut net = Network::new(vec![
            Layer::new(1, vec![1.], vec![1.]).unwrap(),
            Layer::new(1, vec![1.], vec![1.]).unwrap(),
        ])
        .unwrap();
        let mut grads = Gradients::new(net.layers());
        grads.layer_mut(0).0[0] = 2.;
        grads.layer_mut(1).1[0] = -2.;

        GradientDescent::new(1.)
            .update_network(&mut net, &grads, batch(2))
            .unwrap();

        assert_eq!(net.layers()[0].weights(), &[0.]);
        assert_eq!(net.layers()[0].biases(), &[1.]);
        assert_eq!(net.layers()[1].biases(), &[2.]);
    }

    #[test]
    fn foreign_gradients_leave_network_untouched() {
        let mut net = Network::new(vec![Layer::new(1, vec![1.], vec![1.]).unwrap()]).unwrap();
        let other = Network::new(vec![Layer::new(2, vec![1., 1.], vec![1.]).unwrap()]).unwrap();
        let grads = Gradients::new(other.layers());
        let before = net.clone();

        let res = GradientDescent::new(1.).update_network(&mut net, &grads, batch(1));

        assert!(res.is_err());
        assert_eq!(net, before);
    }
}
