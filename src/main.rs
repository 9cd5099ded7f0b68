use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use folio::{
    AppState, Config,
    derive::DerivedAssetPipeline,
    gallery::paths,
    router, startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Overrides `app.log_level` from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Import untracked uploads into the photo collections
    Sync {
        /// Only this gallery context; all contexts when omitted
        #[arg(long)]
        context: Option<String>,
    },

    /// Generate missing WebP renditions once and exit
    Derive,

    /// Print the storage paths a file name will be stored under
    Predict { file_name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Read config before logging so the file can pick the log level
    let (config, loaded) = load_config(&cli.config)?;

    let level = resolve_log_level(cli.log_level.as_deref(), &config.app.log_level);

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if loaded {
        info!("Configuration loaded from: {:?}", cli.config);
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
    }

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        Some(Commands::Sync { context }) => run_sync(config, context).await,
        Some(Commands::Derive) => run_derive(config).await,
        Some(Commands::Predict { file_name }) => {
            paths::validate_file_name(&file_name)?;
            let predicted = paths::predict(&file_name);
            println!("original: {}", predicted.original_path);
            println!("standard: {}", predicted.standard_path);
            println!("title:    {}", paths::clean_title(&file_name));
            Ok(())
        }
        None => run_server(config, None, None, None).await,
    }
}

/// The `--log-level` flag wins over the config file.
fn resolve_log_level(flag: Option<&str>, configured: &str) -> Level {
    match flag.unwrap_or(configured).to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Returns the parsed config and whether it came from a file.
fn load_config(config_path: &Path) -> Result<(Config, bool), Box<dyn std::error::Error>> {
    if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        Ok((toml_edit::de::from_str::<Config>(&config_content)?, true))
    } else {
        Ok((Config::default(), false))
    }
}

async fn checked_config(config: Config) -> Result<Config, Box<dyn std::error::Error>> {
    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for error in &errors {
            warn!("Startup check failed: {}", error);
        }
        if errors.iter().any(startup_checks::StartupCheckError::is_critical) {
            error!("Critical startup check failed, exiting");
            return Err("Critical startup check failed".into());
        }
        warn!("Non-critical startup checks failed, continuing");
    }

    Ok(config)
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = checked_config(config).await?;

    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    for context in &config.gallery.contexts {
        info!("Gallery context: {}", context);
    }

    let state = AppState::new(config.clone()).await?;

    if config.derive.enabled {
        let pipeline = Arc::new(DerivedAssetPipeline::new(
            state.objects.clone(),
            config.derive.clone(),
        ));
        pipeline.start_background();
    }

    let app = router(state.clone());

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        error!("Server error: {}", e);
    }

    info!("Shutting down - closing live galleries");
    state.shutdown();

    Ok(())
}

async fn run_sync(
    config: Config,
    context: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = checked_config(config).await?;
    let state = AppState::new(config).await?;

    let contexts: Vec<String> = match context {
        Some(context) => vec![context],
        None => state.config.gallery.contexts.clone(),
    };

    for name in contexts {
        let Some(gallery) = state.galleries.get(&name) else {
            error!("Unknown gallery context: {}", name);
            state.shutdown();
            return Err(format!("Unknown gallery context: {}", name).into());
        };
        let report = gallery.manager.sync().await?;
        println!("{}: {}", name, serde_json::to_string_pretty(&report)?);
    }

    state.shutdown();
    Ok(())
}

async fn run_derive(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let config = checked_config(config).await?;
    let objects = folio::storage::create_store(&config.storage)?;

    let report = DerivedAssetPipeline::new(objects, config.derive.clone())
        .run_once()
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
