//! energy-dash entry point: CLI wiring, store selection and server startup.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use energy_dash::api::{self, AppState};
use energy_dash::config::{AppConfig, StorageBackend};
use energy_dash::demo::seed_demo;
use energy_dash::io::export::export_csv;
use energy_dash::model::EnergyDataFilter;
use energy_dash::service::EnergyService;
use energy_dash::store::{EnergyStore, FileStore, MemoryStore};

/// Seed used for demo data when `--seed` is not given.
const DEFAULT_DEMO_SEED: u64 = 42;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    port: Option<u16>,
    data_dir: Option<String>,
    seed_demo: Option<String>,
    seed: u64,
    export_csv: Option<String>,
    #[cfg(feature = "tui")]
    dashboard: Option<String>,
}

fn print_help() {
    eprintln!("energy-dash: building energy monitoring service");
    eprintln!();
    eprintln!("Usage: energy-dash [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from a TOML file");
    eprintln!("  --port <u16>             Override the listen port");
    eprintln!("  --data-dir <path>        Persist to JSON-lines files under <path>");
    eprintln!("  --seed-demo <name>       Create a demo building with synthetic readings");
    eprintln!("  --seed <u64>             Random seed for --seed-demo (default: 42)");
    eprintln!("  --export-csv <path>      Write all energy data to CSV and exit");
    #[cfg(feature = "tui")]
    eprintln!("  --dashboard <url>        Open the terminal dashboard against a server");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("RUST_LOG overrides the configured log filter.");
}

/// Returns the value following a flag, or exits with an error.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        port: None,
        data_dir: None,
        seed_demo: None,
        seed: DEFAULT_DEMO_SEED,
        export_csv: None,
        #[cfg(feature = "tui")]
        dashboard: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                cli.config_path = Some(flag_value(&args, i, "--config", "a path argument"));
            }
            "--port" => {
                i += 1;
                let raw = flag_value(&args, i, "--port", "a u16 argument");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = Some(p);
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            "--data-dir" => {
                i += 1;
                cli.data_dir = Some(flag_value(&args, i, "--data-dir", "a path argument"));
            }
            "--seed-demo" => {
                i += 1;
                cli.seed_demo = Some(flag_value(&args, i, "--seed-demo", "a building name"));
            }
            "--seed" => {
                i += 1;
                let raw = flag_value(&args, i, "--seed", "a u64 argument");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed = s;
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--export-csv" => {
                i += 1;
                cli.export_csv = Some(flag_value(&args, i, "--export-csv", "a path argument"));
            }
            #[cfg(feature = "tui")]
            "--dashboard" => {
                i += 1;
                cli.dashboard = Some(flag_value(&args, i, "--dashboard", "a URL argument"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the config file (or defaults) and applies CLI overrides.
fn load_config(cli: &CliArgs) -> AppConfig {
    let mut cfg = if let Some(ref path) = cli.config_path {
        match AppConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };

    if let Some(port) = cli.port {
        cfg.set_port(port);
    }
    if let Some(ref dir) = cli.data_dir {
        cfg.storage.backend = StorageBackend::File;
        cfg.storage.data_dir = PathBuf::from(dir);
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

async fn open_store(cfg: &AppConfig) -> Result<Arc<dyn EnergyStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn EnergyStore> = match cfg.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File => Arc::new(FileStore::open(&cfg.storage.data_dir).await?),
    };
    Ok(store)
}

async fn run(cfg: AppConfig, cli: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = EnergyService::new(open_store(&cfg).await?);

    if let Some(ref name) = cli.seed_demo {
        let (building, count) = seed_demo(&service, name, cli.seed).await?;
        eprintln!("Seeded \"{}\" ({}) with {count} readings", building.name, building.id);
    }

    if let Some(ref path) = cli.export_csv {
        let rows = service.list_energy_data(&EnergyDataFilter::default()).await?;
        export_csv(&rows, Path::new(path))?;
        eprintln!("{} readings written to {path}", rows.len());
        return Ok(());
    }

    let Some(addr) = cfg.bind_addr() else {
        return Err(format!("invalid bind address \"{}\"", cfg.server.bind).into());
    };
    api::serve(AppState::new(service), addr, &cfg.server.base_path, cfg.server.cors).await?;
    Ok(())
}

fn main() {
    let cli = parse_args();
    let cfg = load_config(&cli);

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });

    // The dashboard owns the terminal, so it runs without a log subscriber.
    #[cfg(feature = "tui")]
    if let Some(ref url) = cli.dashboard {
        let client = energy_dash::client::EnergyClient::new(url);
        if let Err(e) = energy_dash::tui::run(&client, &rt) {
            eprintln!("error: dashboard crashed: {e}");
            process::exit(1);
        }
        return;
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter)),
        )
        .init();

    if let Err(e) = rt.block_on(run(cfg, cli)) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
