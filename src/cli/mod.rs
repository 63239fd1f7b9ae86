// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, picks a backend, and hands off to
// a use case in Layer 2. The only place that prints.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use clap::Parser;
use commands::{BackendKind, Commands, EncodingArgs, ForwardArgs, InitArgs};

use transformer_blocks::application::{
    encoding_use_case::EncodingUseCase,
    forward_use_case::{ForwardReport, ForwardUseCase},
    init_use_case::InitUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "transformer-blocks",
    version,
    about = "Multi-head attention and sinusoidal embeddings: build, run and inspect."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args)     => run_init(args),
            Commands::Forward(args)  => run_forward(args),
            Commands::Encoding(args) => run_encoding(args),
        }
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config   = args.model.resolve()?;
    let use_case = InitUseCase::new(config, args.checkpoint_dir.clone());

    let params = match args.backend {
        BackendKind::Ndarray => use_case.execute::<NdArray>(&Default::default())?,
        BackendKind::Wgpu    => use_case.execute::<Wgpu>(&WgpuDevice::default())?,
    };

    println!("Checkpoint written to {} ({params} parameters)", args.checkpoint_dir.display());
    Ok(())
}

fn run_forward(args: ForwardArgs) -> Result<()> {
    let request  = args.request()?;
    let use_case = ForwardUseCase::new(args.checkpoint_dir.clone());

    // Mode is chosen here: autodiff backends keep dropout active
    let report = match (args.backend, args.training) {
        (BackendKind::Ndarray, false) => use_case.execute::<NdArray>(&request, &Default::default())?,
        (BackendKind::Ndarray, true)  => use_case.execute::<Autodiff<NdArray>>(&request, &Default::default())?,
        (BackendKind::Wgpu, false)    => use_case.execute::<Wgpu>(&request, &WgpuDevice::default())?,
        (BackendKind::Wgpu, true)     => use_case.execute::<Autodiff<Wgpu>>(&request, &WgpuDevice::default())?,
    };

    print_report(&report);
    Ok(())
}

fn run_encoding(args: EncodingArgs) -> Result<()> {
    let config = args.model.resolve()?;
    let rows   = EncodingUseCase::new(config).rows::<NdArray>(args.from..args.to, &Default::default())?;

    for (offset, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:+.4}")).collect();
        println!("pos {:>4}: {}", args.from + offset, cells.join(" "));
    }
    Ok(())
}

fn print_report(report: &ForwardReport) {
    println!("context shape : {:?}", report.context_shape);
    println!("weights shape : {:?}", report.weights_shape);
    println!("max |Σw - 1|  : {:.2e}", report.max_row_deviation);
    println!("context mean  : {:.6}", report.context_mean);
    for path in &report.exported {
        println!("exported      : {}", path.display());
    }
}
