// ============================================================
// Layer 5 — Sequence Encoder Stage
// ============================================================
// One stage of the encoder cascade: `num_layers` LSTM layers
// stacked on top of each other, each consuming the full output
// sequence of the layer below.
//
// Burn's Lstm is single-layer and batch-first:
//   input  [batch, seq_len, d_input]
//   output [batch, seq_len, d_hidden]
// so depth is a Vec of layers, the same way the encoder blocks
// of a transformer are stacked.
//
// Every layer starts each call from a zero hidden and cell
// state sized from the batch actually passed in. Nothing is
// carried over between calls.
//
// Reference: Burn Book §3 (Building Blocks)
//            Hochreiter & Schmidhuber (1997) LSTM

use burn::{
    nn::{Lstm, LstmConfig, LstmState},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct SequenceEncoderConfig {
    pub d_input:    usize,
    pub d_hidden:   usize,
    #[config(default = 2)]
    pub num_layers: usize,
}

impl SequenceEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceEncoder<B> {
        let layers = (0..self.num_layers)
            .map(|i| {
                // Only the first layer sees the stage input width
                let d_input = if i == 0 { self.d_input } else { self.d_hidden };
                LstmConfig::new(d_input, self.d_hidden, true).init(device)
            })
            .collect();
        SequenceEncoder { layers, d_hidden: self.d_hidden }
    }
}

#[derive(Module, Debug)]
pub struct SequenceEncoder<B: Backend> {
    pub layers:   Vec<Lstm<B>>,
    pub d_hidden: usize,
}

impl<B: Backend> SequenceEncoder<B> {
    /// x: [batch, seq_len, d_input] → [batch, seq_len, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, _, _] = x.dims();
        let device = x.device();

        let mut out = x;
        for layer in &self.layers {
            let state = LstmState::new(
                Tensor::zeros([batch_size, self.d_hidden], &device),
                Tensor::zeros([batch_size, self.d_hidden], &device),
            );
            let (sequence, _) = layer.forward(out, Some(state));
            out = sequence;
        }
        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_stage_output_shape() {
        let device  = Default::default();
        let encoder = SequenceEncoderConfig::new(4, 7)
            .with_num_layers(3)
            .init::<TestBackend>(&device);
        assert_eq!(encoder.layers.len(), 3);

        let x   = Tensor::<TestBackend, 3>::random([2, 5, 4], Distribution::Default, &device);
        let out = encoder.forward(x);
        assert_eq!(out.dims(), [2, 5, 7]);
    }

    #[test]
    fn test_no_state_carried_between_calls() {
        let device  = Default::default();
        let encoder = SequenceEncoderConfig::new(3, 4).init::<TestBackend>(&device);
        let x       = Tensor::<TestBackend, 3>::random([1, 6, 3], Distribution::Default, &device);

        let first  = encoder.forward(x.clone());
        let second = encoder.forward(x);
        let first: Vec<f32>  = first.into_data().iter::<f32>().collect();
        let second: Vec<f32> = second.into_data().iter::<f32>().collect();
        assert_eq!(first, second);
    }
}
