/// A source of initial values for a network's parameters.
///
/// Layers draw from it node by node: every node's weights, then its bias.
pub trait ParamGen {
    /// Samples up to `n` values, fewer once the generator is close to its limit.
    ///
    /// # Returns
    /// `None` when the generator has nothing left.
    fn sample(&mut self, n: usize) -> Option<Vec<f64>>;

    /// Samples exactly `n` values, or `None` if the generator can't provide all of them.
    fn sample_exact(&mut self, n: usize) -> Option<Vec<f64>> {
        self.sample(n).filter(|values| values.len() == n)
    }
}
