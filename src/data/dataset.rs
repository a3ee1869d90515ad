use std::ops::Range;

use super::DataPoint;
use crate::{arch::Network, error::Result};

/// An ordered, immutable set of examples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    points: Vec<DataPoint>,
}

impl Dataset {
    /// Creates a new dataset from owned examples.
    pub fn new(points: Vec<DataPoint>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the example at `idx` (panics if out of bounds).
    #[inline]
    pub fn get(&self, idx: usize) -> &DataPoint {
        &self.points[idx]
    }

    #[inline]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Returns the examples in `range` (panics if out of bounds).
    #[inline]
    pub fn slice(&self, range: Range<usize>) -> &[DataPoint] {
        &self.points[range]
    }

    /// Checks every example's input and expected output against `network`.
    ///
    /// # Errors
    /// `ShapeMismatch` on the first example that doesn't fit.
    pub fn check_shapes(&self, network: &Network) -> Result<()> {
        for point in &self.points {
            network.check_input(point.input())?;
            network.check_expected(point.expected())?;
        }
        Ok(())
    }
}

impl From<Vec<DataPoint>> for Dataset {
    fn from(points: Vec<DataPoint>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<DataPoint> for Dataset {
    fn from_iter<I: IntoIterator<Item = DataPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{arch::Layer, error::TrainErr};

    fn net() -> Network {
        Network::new(vec![Layer::new(2, vec![0.; 6], vec![0.; 3]).unwrap()]).unwrap()
    }

    #[test]
    fn accepts_fitting_examples() {
        let ds: Dataset = (0..3).map(|i| DataPoint::labeled(vec![0.; 2], i, 3)).collect();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.slice(1..3)[0].label(), 1);
        assert!(ds.check_shapes(&net()).is_ok());
    }

    #[test]
    fn reports_bad_input_and_expected_lengths() {
        let bad_input = Dataset::new(vec![DataPoint::labeled(vec![0.; 3], 0, 3)]);
        let bad_expected = Dataset::new(vec![DataPoint::labeled(vec![0.; 2], 0, 2)]);

        assert!(matches!(
            bad_input.check_shapes(&net()),
            Err(TrainErr::ShapeMismatch { what: "input", .. })
        ));
        assert!(matches!(
            bad_expected.check_shapes(&net()),
            Err(TrainErr::ShapeMismatch {
                what: "expected output",
                ..
            })
        ));
    }
}
