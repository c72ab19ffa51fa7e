// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//   init, predict, project, demo
//
// clap's derive macros generate help text, missing-argument
// errors and string → number conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::model_settings::ModelSettings;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a freshly initialised model and save it as a checkpoint
    Init(InitArgs),

    /// Project a JSON input window through a saved checkpoint
    Predict(PredictArgs),

    /// Solve the box-constrained QP for a raw vector
    Project(ProjectArgs),

    /// Forward and backward pass on a generated window
    Demo(DemoArgs),
}

/// Architecture flags shared by `init` and `demo`.
/// Defaults match ModelSettings::default().
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Dimension of the projected output
    #[arg(long, default_value_t = 6)]
    pub nz: usize,

    /// Equality constraint count (must be 0)
    #[arg(long, default_value_t = 0)]
    pub neq: usize,

    /// Inequality constraint count (must be 2·nz, the full box)
    #[arg(long, default_value_t = 12)]
    pub nineq: usize,

    /// Diagonal of the quadratic cost, Q = q_penalty · I
    #[arg(long, default_value_t = 0.1)]
    pub q_penalty: f64,

    /// Features per time step
    #[arg(long, default_value_t = 9)]
    pub input_size: usize,

    /// Hidden widths of the three encoder stages, comma separated
    #[arg(long, value_delimiter = ',', default_value = "9,6,6")]
    pub hidden_sizes: Vec<usize>,

    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Decoder width (must equal nz)
    #[arg(long, default_value_t = 6)]
    pub n_outputs: usize,

    /// LSTM layers per encoder stage
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    /// Dropout probability, only active while gradients are tracked
    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,
}

impl ModelArgs {
    fn into_settings(self, checkpoint_dir: String) -> ModelSettings {
        ModelSettings {
            checkpoint_dir,
            nz:           self.nz,
            neq:          self.neq,
            nineq:        self.nineq,
            q_penalty:    self.q_penalty,
            input_size:   self.input_size,
            hidden_sizes: self.hidden_sizes,
            batch_size:   self.batch_size,
            n_outputs:    self.n_outputs,
            num_layers:   self.num_layers,
            dropout:      self.dropout,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write model.mpk.gz and model_settings.json to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// The application layer never sees clap types.
impl From<InitArgs> for ModelSettings {
    fn from(a: InitArgs) -> Self {
        a.model.into_settings(a.checkpoint_dir)
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// JSON file holding a [seq_len][batch][features] array
    #[arg(long)]
    pub input: String,

    /// Directory written by `init`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Optional CSV file for the projected rows
    #[arg(long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Raw values, comma separated; their count sets nz
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub values: Vec<f64>,

    /// Inequality rows (defaults to 2·nz, the full box)
    #[arg(long)]
    pub nineq: Option<usize>,

    #[arg(long, default_value_t = 0.1)]
    pub q_penalty: f64,

    /// Upstream gradient ∂L/∂z*, comma separated; prints ∂L/∂(Q, p, G, h)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub grad: Option<Vec<f64>>,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Time steps in the generated window
    #[arg(long, default_value_t = 10)]
    pub seq_len: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl DemoArgs {
    pub fn settings(&self) -> ModelSettings {
        self.model.clone().into_settings(ModelSettings::default().checkpoint_dir)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_init_defaults_match_settings_defaults() {
        let cli = Cli::try_parse_from(["lstm-qp", "init"]).unwrap();
        let Commands::Init(args) = cli.command else { panic!("expected init") };
        assert_eq!(ModelSettings::from(args), ModelSettings::default());
    }

    #[test]
    fn test_hidden_sizes_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "lstm-qp", "init", "--hidden-sizes", "4,3,2", "--checkpoint-dir", "out",
        ]).unwrap();
        let Commands::Init(args) = cli.command else { panic!("expected init") };
        let settings = ModelSettings::from(args);
        assert_eq!(settings.hidden_sizes, vec![4, 3, 2]);
        assert_eq!(settings.checkpoint_dir, "out");
    }

    #[test]
    fn test_project_accepts_negative_values() {
        let cli = Cli::try_parse_from([
            "lstm-qp", "project", "--values", "0.05,-0.2,0.5",
        ]).unwrap();
        let Commands::Project(args) = cli.command else { panic!("expected project") };
        assert_eq!(args.values, vec![0.05, -0.2, 0.5]);
        assert_eq!(args.nineq, None);
        assert_eq!(args.grad, None);
    }

    #[test]
    fn test_project_upstream_gradient() {
        let cli = Cli::try_parse_from([
            "lstm-qp", "project", "--values", "0.1,0.2", "--grad", "1,-1",
        ]).unwrap();
        let Commands::Project(args) = cli.command else { panic!("expected project") };
        assert_eq!(args.grad, Some(vec![1.0, -1.0]));
    }
}
