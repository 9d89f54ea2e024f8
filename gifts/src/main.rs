mod config;

use crate::config::{Config, ConfigError, MetricsConfig};
use clap::{Args, Parser};
use gateway::metrics_defs::{ALL_METRICS, MetricType};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_PATH_VAR: &str = "GIFTS_CONFIG_PATH";
const METRICS_PREFIX: &str = "gifts";

#[derive(Parser)]
#[command(name = "gifts", about = "GIFTs job submission gateway")]
enum CliCommand {
    /// Resolve settings and run the HTTP gateway
    Serve(ConfigArgs),
    /// Resolve settings, log them and exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// YAML config file, defaults to $GIFTS_CONFIG_PATH
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            std::env::var_os(CONFIG_PATH_VAR)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
        })
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
}

fn main() {
    let cli = CliCommand::parse();

    if let Err(e) = run(cli) {
        eprintln!("gifts: {e}");
        std::process::exit(1);
    }
}

fn run(cli: CliCommand) -> Result<(), CliError> {
    let (args, serve) = match &cli {
        CliCommand::Serve(args) => (args, true),
        CliCommand::CheckConfig(args) => (args, false),
    };

    let config = Config::load(args.path().as_deref())?;
    let _sentry = init_logging(&config);

    let settings = config.settings(|name| std::env::var(name).ok())?;
    tracing::info!(?settings, "Resolved settings");

    if !serve {
        return Ok(());
    }

    if let Some(metrics) = &config.metrics {
        init_metrics(metrics)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(gateway::run(settings))?;

    tracing::info!("Shut down");
    Ok(())
}

/// Installs the global subscriber. The returned guard flushes Sentry events
/// when dropped and must outlive the server.
fn init_logging(config: &Config) -> Option<sentry::ClientInitGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let guard = config.sentry_dsn().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
