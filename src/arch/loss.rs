/// Squared error of one example, `0.5 * Σ (o - e)²`.
///
/// # Panics
/// Debug-asserts that both slices have the same length.
pub fn cost(output: &[f64], expected: &[f64]) -> f64 {
    debug_assert_eq!(output.len(), expected.len());

    let error: f64 = output
        .iter()
        .zip(expected)
        .map(|(o, e)| (o - e) * (o - e))
        .sum();

    0.5 * error
}

/// Derivative of [`cost`] with respect to one output.
#[inline]
pub fn cost_prime(output: f64, expected: f64) -> f64 {
    output - expected
}
