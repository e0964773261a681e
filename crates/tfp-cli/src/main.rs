use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tfp_core::errors::TfError;
use tfp_core::INPUT_FILE_NAME;
use tfp_pipeline::{run, NormalizationPolicy, RunOptions, RunSummary};
use tfp_solver::CommandSolver;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "tfprep",
    version,
    about = "Prepare a sigma8-normalized linear transfer table for initial-condition generators"
)]
struct Cli {
    /// Parameter document to read.
    #[arg(long, default_value = INPUT_FILE_NAME)]
    input: PathBuf,
    /// Directory receiving the transfer table and the updated parameter record.
    #[arg(long = "out-dir", default_value = ".")]
    out_dir: PathBuf,
    /// External solver command line; receives JSON on stdin and answers on stdout.
    #[arg(long, env = "TFPREP_SOLVER")]
    solver: String,
    /// Maximum sigma8 correction passes. The default applies a single analytic rescale.
    #[arg(long = "normalization-passes", default_value_t = 1)]
    normalization_passes: usize,
    /// Relative sigma8 tolerance at which extra passes stop.
    #[arg(long, default_value_t = 1e-4)]
    tolerance: f64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: &Cli) -> Result<RunSummary, TfError> {
    let solver = CommandSolver::from_command_line(&cli.solver)?;
    let options = RunOptions {
        input: cli.input.clone(),
        out_dir: cli.out_dir.clone(),
        normalization: NormalizationPolicy {
            max_passes: cli.normalization_passes,
            tolerance: cli.tolerance,
        },
    };
    run(&options, &solver)
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match execute(&cli) {
        Ok(summary) => {
            info!(
                transfer = %summary.artifacts.transfer.display(),
                provenance = %summary.artifacts.provenance.display(),
                sigma8 = summary.sigma8,
                a_s = summary.amplitude,
                "transfer table ready"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
