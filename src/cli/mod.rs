// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application); this layer
// picks the backend and prints results.
//
// Commands:
//   1. `init`    — build a model and save a checkpoint
//   2. `predict` — project an input window through a checkpoint
//   3. `project` — run the QP projection on a raw vector
//   4. `demo`    — forward + backward on generated data
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};
use clap::Parser;
use commands::{Commands, DemoArgs, InitArgs, PredictArgs, ProjectArgs};

use crate::domain::projection::ProjectedBatch;

type InferenceBackend = Wgpu;
type DemoBackend      = Autodiff<Wgpu>;

#[derive(Parser, Debug)]
#[command(
    name = "lstm-qp",
    version = "0.1.0",
    about = "LSTM sequence regressor whose outputs are projected onto a box by a differentiable QP."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args)    => run_init(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Project(args) => run_project(args),
            Commands::Demo(args)    => run_demo(args),
        }
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    use crate::application::init_use_case::InitUseCase;

    let device   = WgpuDevice::default();
    let use_case = InitUseCase::new(args.into());
    let manager  = use_case.execute::<InferenceBackend>(&device)?;

    println!("Checkpoint written to {}", manager.dir().display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;
    use crate::data::loader::JsonSequenceLoader;
    use crate::domain::traits::ProjectionSink;
    use crate::infra::projection_writer::CsvProjectionWriter;

    let device   = WgpuDevice::default();
    let use_case = PredictUseCase::<InferenceBackend>::new(args.checkpoint_dir, device)?;
    let source   = JsonSequenceLoader::new(args.input);

    let writer = args.output.map(CsvProjectionWriter::new).transpose()?;
    let sink   = writer.as_ref().map(|w| w as &dyn ProjectionSink);

    let projected = use_case.execute(&source, sink)?;
    print_batch(&projected);
    if let Some(writer) = &writer {
        println!("Wrote {} rows to {}", projected.len(), writer.csv_path().display());
    }
    Ok(())
}

fn run_project(args: ProjectArgs) -> Result<()> {
    use crate::application::project_use_case::ProjectUseCase;

    let use_case = ProjectUseCase::new(args.values.len(), args.nineq, args.q_penalty)?;
    let report   = use_case.execute(&args.values, args.grad.as_deref())?;

    println!("z*         = [{}]", join(report.z.iter()));
    println!("objective  = {:.6}", report.objective);
    println!("active     = {:?}", report.active);
    println!("iterations = {}", report.iterations);

    if let Some(grads) = &report.gradients {
        println!("∂L/∂p      = [{}]", join(grads.p.iter()));
        println!("∂L/∂h      = [{}]", join(grads.h.iter()));
        println!("‖∂L/∂Q‖    = {:.6}", grads.q.norm());
        println!("‖∂L/∂G‖    = {:.6}", grads.g.norm());
        if !grads.b.is_empty() {
            println!("‖∂L/∂A‖    = {:.6}", grads.a.norm());
            println!("∂L/∂b      = [{}]", join(grads.b.iter()));
        }
    }
    Ok(())
}

fn join<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values.map(|v| format!("{v:.6}")).collect::<Vec<_>>().join(", ")
}

fn run_demo(args: DemoArgs) -> Result<()> {
    use crate::application::demo_use_case::DemoUseCase;

    let device   = WgpuDevice::default();
    let use_case = DemoUseCase::new(args.settings(), args.seq_len, args.seed);
    let report   = use_case.execute::<DemoBackend>(&device)?;

    print_batch(&report.output);
    println!("loss (sum of squares) = {:.6}", report.loss);
    println!("decoder grad norm     = {:.6}", report.decoder_grad_norm);
    Ok(())
}

fn print_batch(batch: &ProjectedBatch) {
    for (i, row) in batch.rows().iter().enumerate() {
        let values = row.iter().map(|v| format!("{v:+.4}")).collect::<Vec<_>>();
        println!("[{i}] {}", values.join("  "));
    }
}
