//! Syndra Command-Line Interface
//!
//! The main entry point for the Syndra CLI tool.
//!
//! ```text
//!   syndra generate --experiment rep.yaml --noise uniform:0.001 --rounds 10
//!   syndra noise --input memory.stim --noise si1000:0.001 --immune 9,10
//!   syndra transpile --input noisy.stim --z-basis
//!   syndra stats --input noisy.stim --format json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{generate, noise, stats, transpile, version};

/// Syndra - stabilizer circuit generation, noise injection and transpilation
#[derive(Parser)]
#[command(name = "syndra")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a memory experiment for a patch
    Generate {
        /// Experiment description (JSON or YAML): patch, observables, ancillas
        #[arg(short, long, visible_alias = "patch")]
        experiment: String,

        /// Per-round noise: uniform:<p>, bitflip:<p>, none, or a rule file
        #[arg(short, long)]
        noise: Option<String>,

        /// Number of noisy rounds
        #[arg(short, long)]
        rounds: Option<u64>,

        /// Experiment kind (phenomenological, code-capacity)
        #[arg(short, long, default_value = "phenomenological")]
        kind: String,

        /// How checks are measured (mpp, ancilla)
        #[arg(long)]
        style: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Add noise channels to a circuit
    Noise {
        /// Input circuit file
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Noise model: uniform:<p>, si1000:<p>, or a model file (JSON or YAML)
        #[arg(short, long, env = "SYNDRA_NOISE")]
        noise: String,

        /// Qubits that never receive noise
        #[arg(long, value_delimiter = ',')]
        immune: Vec<u32>,

        /// Fail on operations no rule covers
        #[arg(long)]
        strict: bool,
    },

    /// Translate and optimize a circuit
    Transpile {
        /// Input circuit file
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Rewrite interactions into CZ plus single-qubit rotations
        #[arg(long)]
        z_basis: bool,

        /// Optimization level (0-3)
        #[arg(long, default_value = "1")]
        optimization_level: u8,
    },

    /// Show gate counts and other statistics for a circuit
    Stats {
        /// Input circuit file
        #[arg(short, long)]
        input: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Generate {
            experiment,
            noise,
            rounds,
            kind,
            style: check_style,
            output,
        } => generate::execute(
            &experiment,
            noise.as_deref(),
            rounds,
            &kind,
            check_style.as_deref(),
            output.as_deref(),
        ),

        Commands::Noise {
            input,
            output,
            noise: model,
            immune,
            strict,
        } => noise::execute(&input, output.as_deref(), &model, &immune, strict),

        Commands::Transpile {
            input,
            output,
            z_basis,
            optimization_level,
        } => transpile::execute(&input, output.as_deref(), z_basis, optimization_level),

        Commands::Stats { input, format } => stats::execute(&input, &format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
