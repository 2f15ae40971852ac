use candle_core::{Result, Tensor};
use candle_nn::{Activation, Linear, Module, VarBuilder, linear};
use either::Either;

#[derive(Debug, Clone)]
pub struct ActivationLayer(pub Activation);

impl Module for ActivationLayer {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.0.forward(xs)
    }
}

#[derive(Debug, Clone)]
pub struct ThreadSafeLayer(pub Either<Linear, ActivationLayer>);

impl ThreadSafeLayer {
    pub fn linear(linear: Linear) -> Self {
        Self(Either::Left(linear))
    }

    pub fn activation(activation: Activation) -> Self {
        Self(Either::Right(ActivationLayer(activation)))
    }
}

impl Module for ThreadSafeLayer {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match &self.0 {
            Either::Left(linear) => linear.forward(xs),
            Either::Right(activation) => activation.forward(xs),
        }
    }
}

/// A `Sequential` that only holds linear and activation layers, so unlike
/// `candle_nn::Sequential` it is `Send`, `Sync` and `Clone`.
#[derive(Default, Debug, Clone)]
pub struct ThreadSafeSequential {
    layers: Vec<ThreadSafeLayer>,
}

impl ThreadSafeSequential {
    pub fn add_layer(mut self, layer: ThreadSafeLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Module for ThreadSafeSequential {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        for layer in self.layers.iter() {
            xs = layer.forward(&xs)?
        }
        Ok(xs)
    }
}

/// `n_layers` hidden layers of width `size`, each followed by `activation`, then a linear output
/// layer without activation.
pub fn build_mlp(
    input_size: usize,
    output_size: usize,
    n_layers: usize,
    size: usize,
    activation: Activation,
    vb: &VarBuilder,
    prefix: &str,
) -> Result<ThreadSafeSequential> {
    let mut last_dim = input_size;
    let mut nn = ThreadSafeSequential::default();
    for layer_idx in 0..n_layers {
        let layer = linear(last_dim, size, vb.pp(format!("{prefix}{layer_idx}")))?;
        nn = nn
            .add_layer(ThreadSafeLayer::linear(layer))
            .add_layer(ThreadSafeLayer::activation(activation));
        last_dim = size;
    }
    let output = linear(last_dim, output_size, vb.pp(format!("{prefix}{n_layers}")))?;
    Ok(nn.add_layer(ThreadSafeLayer::linear(output)))
}
