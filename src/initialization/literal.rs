use std::vec;

use super::ParamGen;

/// Hands out a fixed list of values in order, for networks whose parameters are known
/// up front.
#[derive(Debug, Clone)]
pub struct LiteralParamGen {
    values: vec::IntoIter<f64>,
}

impl LiteralParamGen {
    /// Creates a new `LiteralParamGen`.
    ///
    /// # Arguments
    /// * `values` - The parameters in generation order: per node, its weights then its bias.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// The amount of values not handed out yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl ParamGen for LiteralParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f64>> {
        if self.values.as_slice().is_empty() {
            return None;
        }
        Some(self.values.by_ref().take(n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_values_in_order() {
        let mut param_gen = LiteralParamGen::new(vec![1., 2., 3.]);

        assert_eq!(param_gen.sample(2), Some(vec![1., 2.]));
        assert_eq!(param_gen.remaining(), 1);
        assert_eq!(param_gen.sample(2), Some(vec![3.]));
        assert_eq!(param_gen.sample(1), None);
    }

    #[test]
    fn sample_exact_refuses_short_reads() {
        let mut param_gen = LiteralParamGen::new(vec![1., 2.]);
        assert_eq!(param_gen.sample_exact(3), None);
        assert_eq!(param_gen.sample_exact(1), None);
    }
}
