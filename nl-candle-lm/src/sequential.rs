use candle_core::{Result, Tensor};
use candle_nn::{Activation, Linear, Module, VarBuilder, linear};
use either::Either;

#[derive(Debug, Clone)]
pub struct Layer(pub Either<Linear, Activation>);

impl Layer {
    pub fn linear(linear: Linear) -> Self {
        Self(Either::Left(linear))
    }

    pub fn activation(activation: Activation) -> Self {
        Self(Either::Right(activation))
    }
}

impl Module for Layer {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        match &self.0 {
            Either::Left(linear) => linear.forward(xs),
            Either::Right(activation) => activation.forward(xs),
        }
    }
}

/// Feed forward network of linear layers with ReLU in between.
#[derive(Default, Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Module for Sequential {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        for layer in self.layers.iter() {
            xs = layer.forward(&xs)?
        }
        Ok(xs)
    }
}

impl Sequential {
    pub fn add_layer(mut self, layer: Layer) -> Self {
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

/// `layers` lists the output size of every linear layer, the last entry is the output size of
/// the network. Variables are registered under `{prefix}{layer_idx}`.
pub fn build_sequential(
    input_dim: usize,
    layers: &[usize],
    vb: &VarBuilder,
    prefix: &str,
) -> Result<Sequential> {
    let mut last_dim = input_dim;
    let mut nn = Sequential::default();
    let num_layers = layers.len();
    for (layer_idx, layer_size) in layers.iter().enumerate() {
        let layer = linear(last_dim, *layer_size, vb.pp(format!("{prefix}{layer_idx}")))?;
        nn = nn.add_layer(Layer::linear(layer));
        if layer_idx != num_layers - 1 {
            nn = nn.add_layer(Layer::activation(Activation::Relu));
        }
        last_dim = *layer_size;
    }
    Ok(nn)
}

#[cfg(test)]
mod test {
    use super::build_sequential;
    use candle_core::{DType, Device, Result, Tensor};
    use candle_nn::{Module, VarBuilder, VarMap};

    #[test]
    fn output_has_last_layer_size() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let nn = build_sequential(4, &[8, 8, 3], &vb, "test")?;
        assert_eq!(nn.len(), 5);
        let xs = Tensor::zeros((2, 4), DType::F32, &Device::Cpu)?;
        assert_eq!(nn.forward(&xs)?.dims(), &[2, 3]);
        assert_eq!(varmap.all_vars().len(), 6);
        Ok(())
    }
}
