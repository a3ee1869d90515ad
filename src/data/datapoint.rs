/// A single labelled example.
///
/// The expected output is one-hot for classification data, but any vector of the
/// output layer's length works.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    input: Vec<f64>,
    label: usize,
    expected: Vec<f64>,
}

impl DataPoint {
    /// Creates a new `DataPoint` with an explicit expected output.
    pub fn new(input: Vec<f64>, label: usize, expected: Vec<f64>) -> Self {
        Self {
            input,
            label,
            expected,
        }
    }

    /// Creates a new `DataPoint` whose expected output is the one-hot vector of `label`.
    ///
    /// # Arguments
    /// * `input` - The feature vector.
    /// * `label` - The class index.
    /// * `nclasses` - The length of the expected output.
    ///
    /// `label` must be below `nclasses`. Debug builds panic otherwise; release builds
    /// produce an all-zero target.
    pub fn labeled(input: Vec<f64>, label: usize, nclasses: usize) -> Self {
        debug_assert!(label < nclasses, "label {label} out of {nclasses} classes");

        let mut expected = vec![0.; nclasses];
        if let Some(slot) = expected.get_mut(label) {
            *slot = 1.;
        }

        Self::new(input, label, expected)
    }

    #[inline]
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    #[inline]
    pub fn expected(&self) -> &[f64] {
        &self.expected
    }

    /// Whether the largest output is the one at `label`. Ties go to the lowest index.
    pub fn is_correct(&self, output: &[f64]) -> bool {
        argmax(output) == Some(self.label)
    }
}

/// The index of the largest value, the first one on ties. `None` when empty.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }

    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_builds_one_hot() {
        let point = DataPoint::labeled(vec![0.5], 2, 4);
        assert_eq!(point.expected(), &[0., 0., 1., 0.]);
        assert_eq!(point.label(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "label 4 out of 4 classes")]
    fn labeled_rejects_out_of_range_label() {
        DataPoint::labeled(vec![0.5], 4, 4);
    }

    #[test]
    fn is_correct_uses_argmax() {
        let point = DataPoint::labeled(vec![], 1, 3);

        assert!(point.is_correct(&[0.1, 0.8, 0.3]));
        assert!(!point.is_correct(&[0.9, 0.8, 0.3]));
        assert!(!point.is_correct(&[]));
    }

    #[test]
    fn ties_go_to_the_first_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
        assert!(!DataPoint::labeled(vec![], 1, 2).is_correct(&[0.5, 0.5]));
    }
}
