//! supervisord-exporter - version 0.1.0
//!
//! Prometheus exporter for supervisord with tracing logging.
//! This is the main entry point that drives the scrape loop, serves the
//! HTTP endpoints and handles subcommands.

mod cli;
mod commands;
mod handlers;
mod metrics;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{
    net::TcpListener,
    signal,
    sync::{Mutex, RwLock},
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, warn};

use supervisord_exporter::config::{
    render_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use supervisord_exporter::{BuildInfo, ScrapeStats, SupervisordScraper};

use cli::{effective_log_level, resolve_config, Args, Commands};
use commands::{command_check, command_config, command_test};
use handlers::{config_handler, health_handler, metrics_handler, root_handler};
use metrics::ExporterMetrics;
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = effective_log_level(config, args);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Drives one scrape per collection interval and publishes the result.
///
/// A scraper that failed to start is retried on every tick; a failed cycle
/// clears the published metrics and the next tick proceeds normally.
async fn run_scrape_loop(state: SharedState, mut scraper: SupervisordScraper) {
    let mut ticker = tokio::time::interval(state.config.collection_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if !scraper.is_started() {
            if let Err(e) = scraper.start() {
                warn!("supervisord scraper not ready: {}", e);
                *state.latest.write().await = None;
                continue;
            }
        }

        let outcome = scraper.scrape().await;
        match outcome {
            Ok(metrics) => {
                debug!("Scrape produced {} data points", metrics.data_point_count());
                *state.latest.write().await = Some(metrics);
            }
            Err(e) => {
                error!("Scrape failed: {}", e);
                *state.latest.write().await = None;
            }
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        println!("{}", render_config(&config.redacted(), args.config_format)?);
        return Ok(());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config { output, format } => command_config(output.clone(), *format),
            Commands::Check { scrape } => {
                let config = resolve_config(&args)?;
                command_check(*scrape, &config).await
            }
            Commands::Test {
                iterations,
                verbose,
            } => {
                let config = load_validated_config(&args)?;
                setup_logging(&config, &args);
                command_test(*iterations, *verbose, &config).await
            }
        };
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    info!("Starting supervisord-exporter");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let metrics = ExporterMetrics::new(&registry)?;
    debug!("All metrics registered successfully");

    let scrape_stats = Arc::new(ScrapeStats::new());

    let state = Arc::new(AppState {
        registry,
        metrics,
        latest: RwLock::new(None),
        render_lock: Mutex::new(()),
        scrape_stats: scrape_stats.clone(),
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    let mut scraper =
        SupervisordScraper::new(config.clone(), BuildInfo::default()).with_stats(scrape_stats);
    match scraper.start() {
        Ok(_) => info!("Connected scraper to {}", config.endpoint()),
        Err(e) => error!(
            "Failed to start scraper: {} - will retry every {:?}",
            e,
            config.collection_interval()
        ),
    }

    let scrape_task = tokio::spawn(run_scrape_loop(state.clone(), scraper));

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(config_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "supervisord-exporter listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                scrape_task.abort();
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    scrape_task.abort();
    info!("supervisord-exporter stopped gracefully");
    Ok(())
}
