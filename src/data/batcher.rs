// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Turns a SequenceWindow into the tensor the model consumes.
//
// SequenceWindow is already rectangular, so batching is a
// flatten followed by a reshape:
//
//   steps[t][b][f] → flat Vec<f32> → Tensor [seq_len, batch, features]
//
// The batcher is generic over the backend so the same code
// feeds Wgpu at the CLI and NdArray in tests.
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;

use crate::domain::sequence::SequenceWindow;

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// [seq_len, batch, features] input tensor
    pub fn batch(&self, window: &SequenceWindow) -> Tensor<B, 3> {
        Tensor::<B, 3>::from_data(
            TensorData::new(window.flatten(), window.dims()),
            &self.device,
        )
    }
}
