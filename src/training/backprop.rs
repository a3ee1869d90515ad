use crate::{
    arch::{Network, activation::sigmoid_prime, loss::cost_prime},
    error::{Result, TrainErr},
};

use super::{Gradients, Scratch};

/// Computes the deltas of every layer into `scratch`.
///
/// `scratch` must hold the pre-activations and activations of a forward pass over the
/// same example. The output layer uses `(o - e) * sigmoid'(z)`; hidden layers
/// propagate the following layer's deltas back through its weights.
///
/// # Errors
/// `ShapeMismatch` if `expected` doesn't match the output layer or `scratch` wasn't
/// built for `network`.
pub fn compute_deltas(network: &Network, expected: &[f64], scratch: &mut Scratch) -> Result<()> {
    network.check_expected(expected)?;
    if !scratch.matches(network.layers()) {
        return Err(TrainErr::shape(
            "scratch layers",
            scratch.nlayers(),
            network.layers().len(),
        ));
    }

    backpropagate(network, expected, scratch);
    Ok(())
}

/// Unchecked [`compute_deltas`] for the hot path.
pub(crate) fn backpropagate(network: &Network, expected: &[f64], scratch: &mut Scratch) {
    let layers = network.layers();
    let last = layers.len() - 1;

    for i in (0..=last).rev() {
        let (pre, act, next_deltas, deltas) = scratch.backward_slots(i);

        if i == last {
            for (node, d) in deltas.iter_mut().enumerate() {
                *d = cost_prime(act[node], expected[node]) * sigmoid_prime(pre[node]);
            }
            continue;
        }

        let next = &layers[i + 1];
        for (node, d) in deltas.iter_mut().enumerate() {
            let mut sum = 0.;
            for (next_node, nd) in next_deltas.iter().enumerate() {
                sum += nd * next.weight(next_node, node);
            }
            *d = sigmoid_prime(pre[node]) * sum;
        }
    }
}

/// Adds one example's gradients to `grads`, using the deltas left in `scratch`.
///
/// `weight_grad += delta(node) * layer_input(input)` and `bias_grad += delta(node)`.
pub(crate) fn accumulate_example(
    network: &Network,
    input: &[f64],
    scratch: &Scratch,
    grads: &mut Gradients,
) {
    for (i, layer) in network.layers().iter().enumerate() {
        let inputs = scratch.layer_input(i, input);
        let deltas = scratch.deltas(i);
        let (w_grads, b_grads) = grads.layer_mut(i);

        for (node, &delta) in deltas.iter().enumerate() {
            let row = &mut w_grads[node * layer.input_size()..(node + 1) * layer.input_size()];
            for (g, x) in row.iter_mut().zip(inputs) {
                *g += delta * x;
            }
            b_grads[node] += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Layer;

    fn reference() -> Network {
        Network::new(vec![
            Layer::new(2, vec![0.15, 0.2, 0.25, 0.3], vec![0.35, 0.35]).unwrap(),
            Layer::new(2, vec![0.4, 0.45, 0.5, 0.55], vec![0.6, 0.6]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn output_deltas_match_closed_form() {
        let net = reference();
        let mut scratch = Scratch::new(net.layers());
        net.calculate_with(&[0.05, 0.1], &mut scratch);

        compute_deltas(&net, &[0.01, 0.99], &mut scratch).unwrap();

        // dE/dw5 = delta_o1 * h1 = 0.082167041 for the classic worked example
        let dw5 = scratch.deltas(1)[0] * scratch.activations(0)[0];
        assert!((dw5 - 0.082_167_041).abs() < 1e-6);
    }

    #[test]
    fn gradients_match_finite_differences() {
        const H: f64 = 1e-6;
        let input = [0.05, 0.1];
        let expected = [0.01, 0.99];
        let net = reference();

        let mut scratch = Scratch::new(net.layers());
        let mut grads = Gradients::new(net.layers());
        net.calculate_with(&input, &mut scratch);
        compute_deltas(&net, &expected, &mut scratch).unwrap();
        accumulate_example(&net, &input, &scratch, &mut grads);

        let loss = |net: &Network| crate::arch::loss::cost(&net.calculate(&input).unwrap(), &expected);
        for layer in 0..2 {
            for k in 0..4 {
                let mut plus = net.clone();
                plus.layers_mut()[layer].params_mut().0[k] += H;
                let mut minus = net.clone();
                minus.layers_mut()[layer].params_mut().0[k] -= H;

                let numeric = (loss(&plus) - loss(&minus)) / (2. * H);
                assert!((numeric - grads.weights(layer)[k]).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn rejects_wrong_expected_length() {
        let net = reference();
        let mut scratch = Scratch::new(net.layers());
        let err = compute_deltas(&net, &[0.; 3], &mut scratch).unwrap_err();

        assert!(matches!(
            err,
            TrainErr::ShapeMismatch {
                got: 3,
                expected: 2,
                ..
            }
        ));
    }
}
