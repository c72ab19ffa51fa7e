// ============================================================
// Layer 2 — Model Settings
// ============================================================
// Every constructor argument of the regressor, in one serde
// struct. It is written to model_settings.json next to the
// weights so `predict` can rebuild the exact architecture
// before loading parameters into it.
//
// Defaults describe the reference setup:
//   nz = 6, neq = 0, nineq = 12, Q = 0.1·I,
//   9 input features, hidden widths [9, 6, 6], batch 1,
//   two LSTM layers per stage, dropout 0.3.
//
// The decoder width defaults to nz: the projection needs
// exactly nz raw values per batch element.

use serde::{Deserialize, Serialize};

use crate::ml::model::RegressorConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub checkpoint_dir: String,
    pub nz:             usize,
    pub neq:            usize,
    pub nineq:          usize,
    pub q_penalty:      f64,
    pub input_size:     usize,
    pub hidden_sizes:   Vec<usize>,
    pub batch_size:     usize,
    pub n_outputs:      usize,
    pub num_layers:     usize,
    pub dropout:        f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            nz:             6,
            neq:            0,
            nineq:          12,
            q_penalty:      0.1,
            input_size:     9,
            hidden_sizes:   vec![9, 6, 6],
            batch_size:     1,
            n_outputs:      6,
            num_layers:     2,
            dropout:        0.3,
        }
    }
}

impl ModelSettings {
    /// Convert into the ml-layer config
    pub fn to_model_config(&self) -> RegressorConfig {
        RegressorConfig::new(
            self.nz,
            self.neq,
            self.nineq,
            self.q_penalty,
            self.input_size,
            self.hidden_sizes.clone(),
            self.batch_size,
            self.n_outputs,
        )
        .with_num_layers(self.num_layers)
        .with_dropout(self.dropout)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_setup() {
        let s = ModelSettings::default();
        assert_eq!((s.nz, s.neq, s.nineq), (6, 0, 12));
        assert_eq!(s.hidden_sizes, vec![9, 6, 6]);
        assert_eq!(s.n_outputs, s.nz);
    }

    #[test]
    fn test_json_round_trip() {
        let s    = ModelSettings { q_penalty: 0.25, ..ModelSettings::default() };
        let json = serde_json::to_string(&s).unwrap();
        let back: ModelSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_model_config_carries_every_field() {
        let s   = ModelSettings { num_layers: 3, dropout: 0.1, ..ModelSettings::default() };
        let cfg = s.to_model_config();
        assert_eq!(cfg.nz, 6);
        assert_eq!(cfg.num_layers, 3);
        assert_eq!(cfg.dropout, 0.1);
        assert_eq!(cfg.hidden_sizes, vec![9, 6, 6]);
    }
}
