use burn::{
    module::Ignored,
    nn::{
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::encoder::{SequenceEncoder, SequenceEncoderConfig};
use crate::ml::error::ModelError;
use crate::ml::qp_layer::QpProjection;
use crate::qp::{PdipmSolver, QpProblem};

/// Number of cascaded encoder stages
pub const NUM_STAGES: usize = 3;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally. Do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct RegressorConfig {
    /// Dimension of the projected output (QP variable count)
    pub nz:           usize,
    /// Equality constraint count; the model encodes none, so this must be 0
    pub neq:          usize,
    /// Inequality constraint count; the model needs the full box, 2·nz
    pub nineq:        usize,
    /// Diagonal weight of the quadratic cost Q = q_penalty · I
    pub q_penalty:    f64,
    pub input_size:   usize,
    /// Hidden width of each encoder stage
    pub hidden_sizes: Vec<usize>,
    /// Default batch of generated sequences; forward sizes its state
    /// from the actual input instead
    pub batch_size:   usize,
    /// Decoder width, must equal nz
    pub n_outputs:    usize,
    #[config(default = 2)]
    pub num_layers:   usize,
    #[config(default = 0.3)]
    pub dropout:      f64,
    #[config(default = 100)]
    pub qp_max_iter:  usize,
    #[config(default = 1e-9)]
    pub qp_tolerance: f64,
}

impl RegressorConfig {
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<ConstrainedSequenceRegressor<B>, ModelError> {
        self.validate()?;

        let [h0, h1, h2] = [self.hidden_sizes[0], self.hidden_sizes[1], self.hidden_sizes[2]];
        let stage = |d_input, d_hidden| {
            SequenceEncoderConfig::new(d_input, d_hidden)
                .with_num_layers(self.num_layers)
                .init::<B>(device)
        };

        let problem = QpProblem::box_constrained(self.nz, self.nineq, self.q_penalty)?;
        let solver  = PdipmSolver::new(self.qp_max_iter, self.qp_tolerance);

        Ok(ConstrainedSequenceRegressor {
            encoder1:   stage(self.input_size, h0),
            encoder2:   stage(h0, h1),
            encoder3:   stage(h1, h2),
            decoder:    LinearConfig::new(h2, self.n_outputs).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            qp:         Ignored(QpProjection::new(problem, solver)),
            input_size: self.input_size,
        })
    }

    fn validate(&self) -> Result<(), ModelError> {
        let fail = |reason: String| Err(ModelError::InvalidConfig { reason });

        if self.hidden_sizes.len() != NUM_STAGES {
            return fail(format!(
                "expected {NUM_STAGES} hidden sizes, got {}", self.hidden_sizes.len()
            ));
        }
        if self.hidden_sizes.iter().any(|&h| h == 0) || self.input_size == 0 {
            return fail("input size and hidden sizes must be positive".into());
        }
        if self.num_layers == 0 {
            return fail("num_layers must be at least 1".into());
        }
        if self.n_outputs != self.nz {
            return fail(format!(
                "decoder width {} must equal nz {}", self.n_outputs, self.nz
            ));
        }
        if self.nineq != 2 * self.nz {
            return fail(format!(
                "nineq must be 2·nz = {} so every output is bounded on both sides, got {}",
                2 * self.nz, self.nineq
            ));
        }
        if self.neq != 0 {
            return fail(format!("equality constraints are not encoded, neq must be 0 (got {})", self.neq));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return fail(format!("dropout must lie in [0, 1), got {}", self.dropout));
        }
        Ok(())
    }
}

#[derive(Module, Debug)]
pub struct ConstrainedSequenceRegressor<B: Backend> {
    pub encoder1:   SequenceEncoder<B>,
    pub encoder2:   SequenceEncoder<B>,
    pub encoder3:   SequenceEncoder<B>,
    pub decoder:    Linear<B>,
    pub dropout:    Dropout,
    pub qp:         Ignored<QpProjection>,
    pub input_size: usize,
}

impl<B: Backend> ConstrainedSequenceRegressor<B> {
    /// input: [seq_len, batch, input_size] → projected output: [batch, nz]
    pub fn forward(&self, input: Tensor<B, 3>) -> Result<Tensor<B, 2>, ModelError> {
        let dims = input.dims();
        let [seq_len, batch_size, features] = dims;

        if seq_len == 0 || batch_size == 0 {
            return Err(ModelError::EmptyInput { dims: dims.to_vec() });
        }
        if features != self.input_size {
            return Err(ModelError::InputShape {
                expected: format!("[seq_len, batch, {}]", self.input_size),
                actual:   dims.to_vec(),
            });
        }

        // Burn's LSTM is batch-first
        let x = input.swap_dims(0, 1);

        let x = self.encoder1.forward(x);
        let x = self.dropout.forward(x);
        let x = self.encoder2.forward(x);
        let x = self.encoder3.forward(x);
        let x = self.dropout.forward(x);

        // Decode the hidden state of the last time step only
        let [_, _, hidden] = x.dims();
        let last = x
            .slice([0..batch_size, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch_size, hidden]);
        let raw = self.decoder.forward(last).reshape([batch_size, self.qp.nz()]);

        self.qp.forward(raw)
    }

    /// Summed squared error against `target` ([batch, nz]).
    pub fn forward_loss(
        &self,
        input:  Tensor<B, 3>,
        target: Tensor<B, 2>,
    ) -> Result<(Tensor<B, 1>, Tensor<B, 2>), ModelError> {
        let output = self.forward(input)?;
        if output.dims() != target.dims() {
            return Err(ModelError::InputShape {
                expected: format!("{:?}", output.dims()),
                actual:   target.dims().to_vec(),
            });
        }
        let loss = MseLoss::new().forward(output.clone(), target, Reduction::Sum);
        Ok((loss, output))
    }

    pub fn nz(&self) -> usize {
        self.qp.nz()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::{AutodiffModule, Param};
    use burn::tensor::{backend::AutodiffBackend, Distribution};

    type TestBackend  = NdArray;
    type TestAutodiff = Autodiff<NdArray>;

    fn small_config() -> RegressorConfig {
        RegressorConfig::new(4, 0, 8, 0.1, 5, vec![6, 5, 4], 1, 4)
    }

    fn random_input<B: Backend>(seq_len: usize, batch: usize, features: usize, device: &B::Device) -> Tensor<B, 3> {
        Tensor::random([seq_len, batch, features], Distribution::Uniform(-1.0, 1.0), device)
    }

    fn values<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    fn assert_linear_grads<B: AutodiffBackend>(linear: &Linear<B>, grads: &B::Gradients, what: &str) {
        let w = linear.weight.grad(grads).unwrap_or_else(|| panic!("{what}: no weight gradient"));
        assert!(values(w).iter().all(|g| g.is_finite()), "{what}: non-finite weight gradient");

        let bias = linear.bias.as_ref().unwrap_or_else(|| panic!("{what}: no bias"));
        let b = bias.grad(grads).unwrap_or_else(|| panic!("{what}: no bias gradient"));
        assert!(values(b).iter().all(|g| g.is_finite()), "{what}: non-finite bias gradient");
    }

    #[test]
    fn test_output_shape_for_various_inputs() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device).unwrap();

        for (seq_len, batch) in [(1, 1), (7, 1), (3, 4), (10, 2)] {
            let out = model.forward(random_input(seq_len, batch, 5, &device)).unwrap();
            assert_eq!(out.dims(), [batch, 4]);
        }
    }

    #[test]
    fn test_outputs_respect_box() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device).unwrap();

        let out = model.forward(random_input(6, 8, 5, &device)).unwrap();
        for v in values(out) {
            assert!(v.abs() <= 1.0 + 1e-5, "output {v} leaves the box");
        }
    }

    #[test]
    fn test_large_decoder_output_is_clipped() {
        let device = Default::default();
        let mut model = small_config().init::<TestBackend>(&device).unwrap();
        // Push the raw output far outside the box: p = ±50 → −p/q = ∓500
        let bias = Tensor::<TestBackend, 1>::from_floats([50.0, -50.0, 50.0, -50.0], &device);
        model.decoder.bias = Some(Param::from_tensor(bias));

        let out = values(model.forward(random_input(3, 2, 5, &device)).unwrap());
        // Hidden features are tanh-bounded so the bias dominates
        for row in out.chunks(4) {
            assert!((row[0] + 1.0).abs() < 1e-3);
            assert!((row[1] - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_gradients_are_finite_for_trainable_parameters() {
        let device = Default::default();
        let model  = small_config().init::<TestAutodiff>(&device).unwrap();

        let input  = random_input(4, 2, 5, &device);
        let target = Tensor::<TestAutodiff, 2>::zeros([2, 4], &device);
        let (loss, _) = model.forward_loss(input, target).unwrap();
        assert!(values(loss.clone())[0].is_finite());

        let grads = loss.backward();

        assert_linear_grads(&model.decoder, &grads, "decoder");

        // Every gate of every LSTM layer, input and hidden transforms
        for (s, stage) in [&model.encoder1, &model.encoder2, &model.encoder3].into_iter().enumerate() {
            for (l, layer) in stage.layers.iter().enumerate() {
                let gates = [
                    ("input",  &layer.input_gate),
                    ("forget", &layer.forget_gate),
                    ("output", &layer.output_gate),
                    ("cell",   &layer.cell_gate),
                ];
                for (name, gate) in gates {
                    let what = format!("stage {s} layer {l} {name} gate");
                    assert_linear_grads(&gate.input_transform, &grads, &format!("{what} input"));
                    assert_linear_grads(&gate.hidden_transform, &grads, &format!("{what} hidden"));
                }
            }
        }
    }

    #[test]
    fn test_dropout_is_active_in_training_mode() {
        let device = Default::default();
        // A stiff cost keeps −p/q well inside the box, so dropout noise
        // is not hidden by clipping
        let model = RegressorConfig::new(4, 0, 8, 10.0, 5, vec![6, 5, 4], 1, 4)
            .with_dropout(0.5)
            .init::<TestAutodiff>(&device)
            .unwrap();

        let input  = random_input::<TestAutodiff>(6, 4, 5, &device);
        let first  = values(model.forward(input.clone()).unwrap());
        let second = values(model.forward(input).unwrap());
        assert_ne!(first, second);
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let device = Default::default();
        let model  = small_config().init::<TestAutodiff>(&device).unwrap();
        // valid() drops to the inner backend where dropout is a no-op
        let model  = model.valid();

        let input = random_input::<TestBackend>(5, 3, 5, &device);
        let first  = values(model.forward(input.clone()).unwrap());
        let second = values(model.forward(input).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_wrong_feature_count() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device).unwrap();
        let result = model.forward(random_input(3, 1, 6, &device));
        assert!(matches!(result, Err(ModelError::InputShape { .. })));
    }

    #[test]
    fn test_rejects_empty_sequence() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device).unwrap();
        let input  = Tensor::<TestBackend, 3>::zeros([0, 1, 5], &device);
        assert!(matches!(model.forward(input), Err(ModelError::EmptyInput { .. })));
    }

    #[test]
    fn test_invalid_configurations() {
        let device = Default::default();
        let cases = [
            RegressorConfig::new(4, 0, 8, 0.1, 5, vec![6, 5], 1, 4),
            RegressorConfig::new(4, 0, 8, 0.1, 5, vec![6, 5, 4], 1, 3),
            RegressorConfig::new(4, 1, 8, 0.1, 5, vec![6, 5, 4], 1, 4),
            RegressorConfig::new(4, 0, 8, 0.1, 5, vec![6, 5, 4], 1, 4).with_num_layers(0),
            // one-sided box leaves z_3 unbounded above
            RegressorConfig::new(4, 0, 7, 0.1, 5, vec![6, 5, 4], 1, 4),
            RegressorConfig::new(4, 0, 9, 0.1, 5, vec![6, 5, 4], 1, 4),
        ];
        for cfg in cases {
            assert!(matches!(
                cfg.init::<TestBackend>(&device),
                Err(ModelError::InvalidConfig { .. })
            ));
        }

        let bad_box = RegressorConfig::new(4, 0, 8, 0.0, 5, vec![6, 5, 4], 1, 4);
        assert!(matches!(
            bad_box.init::<TestBackend>(&device),
            Err(ModelError::Constraints(_))
        ));
    }
}
