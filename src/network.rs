use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;

use crate::error::{MetisError, Result};

/// An enumeration of the activation functions available to network layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    /// Apply the activation function to a batch of pre-activation outputs in-place.
    fn apply(&self, outputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => {
                outputs.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Linear => {}
        }
    }

    /// Derivative of the activation function evaluated at the pre-activation outputs.
    fn derivative(&self, pre_activation: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => pre_activation.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(pre_activation.dim()),
        }
    }
}

/// A fully connected layer: weights, biases, and an activation function.
#[derive(Clone, Debug)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
}

impl Layer {
    /// Create a new layer with weights drawn uniformly from [-0.1, 0.1) using
    /// the caller's RNG, and zeroed biases. Taking the RNG as a parameter keeps
    /// initialization reproducible for a given seed.
    pub fn new(input_size: usize, output_size: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let weights = Array2::random_using((input_size, output_size), Uniform::new(-0.1, 0.1), rng);
        let biases = Array1::zeros(output_size);
        Layer {
            weights,
            biases,
            activation,
        }
    }

    /// Forward pass for a batch of inputs. Pure: no intermediate state is
    /// cached on the layer, so immutable queries stay cheap and side-effect free.
    fn forward(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.activation.apply(&mut outputs);
        outputs
    }
}

/// The trainable function approximator behind an agent brain: a small dense
/// network mapping a feature vector to one value per action.
///
/// The training algorithm (plain SGD backpropagation on squared error) is an
/// internal detail; callers interact with it through [`query`](Self::query),
/// [`train_single`](Self::train_single) and [`train_batch`](Self::train_batch).
/// `Clone` produces an independent copy preserving all learned parameters,
/// which is how offspring inherit a parent's behavior.
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<Layer>,
    input_size: usize,
    output_size: usize,
}

impl NeuralNetwork {
    /// Create a network from a list of layer sizes. Hidden layers use ReLU,
    /// the output layer is linear. Weights are initialized from `rng`.
    pub fn new(layer_sizes: &[usize], rng: &mut StdRng) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(MetisError::invalid_parameter(
                "layer_sizes",
                "network needs at least an input and an output layer",
            ));
        }
        if layer_sizes.iter().any(|&s| s == 0) {
            return Err(MetisError::invalid_parameter(
                "layer_sizes",
                "layer sizes must be non-zero",
            ));
        }

        let last = layer_sizes.len() - 2;
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, window)| {
                let activation = if i == last { Activation::Linear } else { Activation::Relu };
                Layer::new(window[0], window[1], activation, rng)
            })
            .collect::<Vec<_>>();

        Ok(NeuralNetwork {
            layers,
            input_size: layer_sizes[0],
            output_size: *layer_sizes.last().unwrap(),
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Compute the per-action values for a single feature vector.
    ///
    /// Pure with respect to the network: no parameter or cache is touched.
    /// `features` must have length `input_size`.
    pub fn query(&self, features: ArrayView1<f32>) -> Array1<f32> {
        let mut current = features.insert_axis(Axis(0)).to_owned();
        for layer in &self.layers {
            current = layer.forward(current.view());
        }
        current.index_axis_move(Axis(0), 0)
    }

    /// Train on a single (features, targets) pair for `epochs` passes.
    pub fn train_single(
        &mut self,
        features: ArrayView1<f32>,
        targets: ArrayView1<f32>,
        epochs: usize,
        learning_rate: f32,
    ) -> Result<()> {
        self.check_dims(features.len(), targets.len())?;
        let inputs = features.insert_axis(Axis(0));
        let targets = targets.insert_axis(Axis(0));
        for _ in 0..epochs {
            self.fit(inputs.view(), targets.view(), learning_rate);
        }
        Ok(())
    }

    /// Train on a list of (features, targets) pairs, split into minibatches of
    /// `batch_size` rows, for `epochs` passes over the whole list.
    pub fn train_batch(
        &mut self,
        features: &[Array1<f32>],
        targets: &[Array1<f32>],
        epochs: usize,
        batch_size: usize,
        learning_rate: f32,
    ) -> Result<()> {
        if features.len() != targets.len() {
            return Err(MetisError::dimension_mismatch(
                format!("{} target rows", features.len()),
                format!("{} target rows", targets.len()),
            ));
        }
        if batch_size == 0 {
            return Err(MetisError::invalid_parameter("batch_size", "must be at least 1"));
        }
        if features.is_empty() {
            return Err(MetisError::EmptyBuffer("train_batch with no samples".to_string()));
        }
        for (f, t) in features.iter().zip(targets) {
            self.check_dims(f.len(), t.len())?;
        }

        let mut inputs = Array2::zeros((features.len(), self.input_size));
        let mut outputs = Array2::zeros((features.len(), self.output_size));
        for (i, (f, t)) in features.iter().zip(targets).enumerate() {
            inputs.row_mut(i).assign(f);
            outputs.row_mut(i).assign(t);
        }

        for _ in 0..epochs {
            for (input_chunk, target_chunk) in inputs
                .axis_chunks_iter(Axis(0), batch_size)
                .zip(outputs.axis_chunks_iter(Axis(0), batch_size))
            {
                self.fit(input_chunk, target_chunk, learning_rate);
            }
        }
        Ok(())
    }

    fn check_dims(&self, feature_len: usize, target_len: usize) -> Result<()> {
        if feature_len != self.input_size {
            return Err(MetisError::dimension_mismatch(
                format!("{} features", self.input_size),
                format!("{} features", feature_len),
            ));
        }
        if target_len != self.output_size {
            return Err(MetisError::dimension_mismatch(
                format!("{} targets", self.output_size),
                format!("{} targets", target_len),
            ));
        }
        Ok(())
    }

    /// One SGD step on a minibatch: forward with per-layer caches held in
    /// locals, backpropagate the squared-error gradient, update in place.
    fn fit(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>, learning_rate: f32) {
        let mut layer_inputs: Vec<Array2<f32>> = Vec::with_capacity(self.layers.len());
        let mut pre_activations: Vec<Array2<f32>> = Vec::with_capacity(self.layers.len());

        let mut current = inputs.to_owned();
        for layer in &self.layers {
            let pre = current.dot(&layer.weights) + &layer.biases.view().insert_axis(Axis(0));
            layer_inputs.push(current);
            let mut out = pre.clone();
            layer.activation.apply(&mut out);
            pre_activations.push(pre);
            current = out;
        }

        let mut error = current - &targets;
        for i in (0..self.layers.len()).rev() {
            let adjusted = &error * &self.layers[i].activation.derivative(&pre_activations[i]);
            let weight_gradients = layer_inputs[i].t().dot(&adjusted);
            let bias_gradients = adjusted.sum_axis(Axis(0));

            // Propagate before updating: the input gradient uses this layer's
            // pre-update weights.
            if i > 0 {
                error = adjusted.dot(&self.layers[i].weights.t());
            }

            let layer = &mut self.layers[i];
            layer.weights.scaled_add(-learning_rate, &weight_gradients);
            layer.biases.scaled_add(-learning_rate, &bias_gradients);
        }
    }
}
