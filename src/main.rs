use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use e91::protocol::{AliceSetting, BobSetting, EveStrategy, Trial, stages};
use e91::{LocalBackend, ProtocolConfig, run_protocol};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "e91", version, about = "E91 quantum key distribution with a CHSH security check")]
struct Cli {
    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the protocol and print the report
    Run {
        #[arg(long, help = "JSON configuration file")]
        config: Option<PathBuf>,
        #[arg(long, help = "Number of singlet pairs")]
        singlets: Option<usize>,
        #[arg(long, help = "Let Eve intercept every pair")]
        eavesdropper: bool,
        #[arg(long, help = "Seed for reproducible runs")]
        seed: Option<u64>,
        #[arg(long, help = "Most circuits per job")]
        batch_size: Option<usize>,
        #[arg(long, default_value_t = 0, help = "Status checks a job spends queued before finishing")]
        latency_polls: u32,
        #[arg(long, help = "Output machine-readable JSON")]
        json: bool,
    },
    /// Print the measurement circuits for every setting combination
    Circuits {
        #[arg(long, help = "Include Eve's stage")]
        eavesdropper: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            singlets,
            eavesdropper,
            seed,
            batch_size,
            latency_polls,
            json,
        } => {
            let cfg = match config {
                Some(path) => ProtocolConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ProtocolConfig::default(),
            }
            .with_overrides(singlets, eavesdropper, seed, batch_size);
            cfg.validate().context("invalid configuration")?;

            let backend = match cfg.backend_seed() {
                Some(s) => LocalBackend::seeded(s),
                None => LocalBackend::default(),
            };
            let mut backend = backend.with_latency_polls(latency_polls);
            let report = run_protocol(&cfg, &mut backend).context("protocol run failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Commands::Circuits { eavesdropper } => {
            let strategies: Vec<Option<EveStrategy>> = if eavesdropper {
                vec![Some(EveStrategy::WW), Some(EveStrategy::ZZ)]
            } else {
                vec![None]
            };
            for eve in strategies {
                for alice in AliceSetting::ALL {
                    for bob in BobSetting::ALL {
                        let trial = Trial { alice, bob, eve };
                        println!("{}", stages::trial_circuit(&trial));
                    }
                }
            }
        }
    }
    Ok(())
}
