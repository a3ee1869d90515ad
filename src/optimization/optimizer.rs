use std::num::NonZeroUsize;

use crate::{
    arch::Network,
    error::{Result, TrainErr},
    training::Gradients,
};

/// Defines the strategy for updating model parameters based on accumulated gradients.
pub trait Optimizer {
    /// Updates the provided slice of parameters using the gradients summed over a batch.
    ///
    /// # Arguments
    /// * `grad` - The gradients summed over every example of the batch.
    /// * `params` - The parameters to update.
    /// * `batch_len` - The amount of examples the gradients were summed over.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: &[f64], params: &mut [f64], batch_len: NonZeroUsize)
    -> Result<()>;

    /// Updates every layer of `network` from the matching slots of `grads`.
    ///
    /// # Errors
    /// `ShapeMismatch` if `grads` wasn't built for `network`; no parameter is touched
    /// in that case.
    fn update_network(
        &mut self,
        network: &mut Network,
        grads: &Gradients,
        batch_len: NonZeroUsize,
    ) -> Result<()> {
        grads.check_shape(network.layers())?;

        for (i, layer) in network.layers_mut().iter_mut().enumerate() {
            let (weights, biases) = layer.params_mut();
            self.update_params(grads.weights(i), weights, batch_len)?;
            self.update_params(grads.biases(i), biases, batch_len)?;
        }

        Ok(())
    }
}

/// Errors with `ShapeMismatch` unless `grad` and `params` have the same length.
pub(super) fn check_lengths(grad: &[f64], params: &[f64]) -> Result<()> {
    if grad.len() != params.len() {
        return Err(TrainErr::shape("gradient", grad.len(), params.len()));
    }
    Ok(())
}
