use std::fs::{self, OpenOptions};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use procdash::app::App;
use procdash::config::{Config, DEFAULT_HINT, load_config, load_config_from_path};
use procdash::event;
use procdash::system::collector::Collector;
use procdash::system::platform::Platform;
use procdash::system::probe::probe;
use procdash::system::process::SysinfoProcessTable;
use procdash::system::registry::CapabilityRegistry;
use procdash::terminal::{self, TerminalGuard};

#[derive(Parser)]
#[command(
    name = "procdash",
    about = "Terminal process dashboard with a sortable per-process table"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh rate in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Comma-separated visible columns: pid, name, path, user, cpu, memory
    #[arg(long)]
    columns: Option<String>,

    /// Initial sort column
    #[arg(long)]
    sort: Option<String>,

    /// Sort ascending instead of descending
    #[arg(long, default_value_t = false)]
    ascending: bool,

    /// Do not enable mouse reporting
    #[arg(long, default_value_t = false)]
    no_mouse: bool,

    /// Log file (default: procdash.log in the user cache directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print which capabilities are available as JSON and exit.
    #[arg(long, default_value_t = false)]
    probe: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(&cli)?;
    let config = load_config_for_cli(&cli);

    let platform = Platform::detect()?;
    let registry = Arc::new(CapabilityRegistry::new(platform));
    info!(%platform, "starting");

    if cli.probe {
        let cpu_window = Duration::from_millis(config.general.cpu_sample_ms);
        let report = probe(&registry, std::process::id(), cpu_window);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    run(config, registry).await
}

async fn run(config: Config, registry: Arc<CapabilityRegistry>) -> Result<()> {
    let mouse = config.general.mouse;
    let collector = Collector::new(registry, Box::new(SysinfoProcessTable::new()))
        .with_cpu_window(Duration::from_millis(config.general.cpu_sample_ms));
    let app = Arc::new(App::new(
        collector,
        &config,
        Box::new(stdout()),
        Box::new(terminal::size),
    ));

    let _guard = TerminalGuard::enter(mouse)?;
    terminal::install_panic_hook(mouse);

    app.refresh_and_draw()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tick_rate = Duration::from_millis(config.general.refresh_rate_ms.max(1));
    let refresh = event::spawn_refresh(Arc::clone(&app), tick_rate, shutdown_rx);
    let input = event::spawn_input(Arc::clone(&app), std::io::stdin())?;

    let outcome = tokio::select! {
        done = input => done.unwrap_or_else(|_| {
            warn!("input thread ended without reporting");
            Ok(())
        }),
        () = shutdown_signal() => {
            info!("termination signal received");
            Ok(())
        }
    };

    let _ = shutdown_tx.send(true);
    let _ = refresh.await;
    info!("shutting down");

    Ok(outcome?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let Some(path) = cli.log_file.clone().or_else(default_log_path) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| eyre!("failed to initialise logging: {err}"))
}

fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("procdash").join("procdash.log"))
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    if let Some(ref columns) = cli.columns {
        config.table.columns = columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }
    if let Some(ref sort) = cli.sort {
        config.table.sort_column = sort.clone();
    }
    if cli.ascending {
        config.table.sort_ascending = true;
    }
    if cli.no_mouse {
        config.general.mouse = false;
    }
    if config.footer.keybindings.is_empty() {
        config.footer.keybindings = DEFAULT_HINT.to_string();
    }

    config
}
