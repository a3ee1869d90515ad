/// The logistic function, `1 / (1 + e^-z)`.
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    1. / (1. + (-z).exp())
}

/// Derivative of [`sigmoid`] evaluated at the pre-activation `z`.
#[inline]
pub fn sigmoid_prime(z: f64) -> f64 {
    let s = sigmoid(z);
    s * (1. - s)
}
