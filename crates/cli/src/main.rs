//! Scanwatch CLI
//!
//! Lists clusters with runtime vulnerability findings, flags those whose
//! daily scan volume has dropped off and prints their agent status.

mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use scanwatch_lib::{ApiError, ClientConfig, DropOffScanner, Lookback, SecureClient};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use config::Settings;
use output::{DetailLevel, OutputFormat, Reporter};

/// Scanning drop-off report for Secure clusters
#[derive(Parser)]
#[command(name = "scanwatch")]
#[command(author, version, about = "Scanning drop-off report for Secure clusters", long_about = None)]
pub struct Cli {
    /// Authority component (host[:port]) of the Secure URL
    #[arg(long = "secure_url_authority", env = "SECURE_URL_AUTHORITY")]
    pub secure_url_authority: String,

    /// Secure API token
    #[arg(long = "api_token", env = "SECURE_API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Window for listing clusters (e.g. 30d, 24h)
    #[arg(long)]
    pub cluster_lookback: Option<Lookback>,

    /// Window for each cluster's daily usage series
    #[arg(long)]
    pub usage_lookback: Option<Lookback>,

    /// Output detail level
    #[arg(long, value_enum)]
    pub detail: Option<DetailLevel>,

    /// Output format
    #[arg(long, short, value_enum)]
    pub format: Option<OutputFormat>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Settings file (JSON)
    #[arg(long, env = "SCANWATCH_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short)]
    pub verbose: bool,

    /// Scheme and authority to use instead of https://{authority}
    #[arg(long, env = "SCANWATCH_BASE_URL", hide = true)]
    pub base_url: Option<Url>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings
    fn apply(&self, mut settings: Settings) -> Result<Settings> {
        if let Some(lookback) = self.cluster_lookback {
            settings.cluster_lookback = lookback;
        }
        if let Some(lookback) = self.usage_lookback {
            settings.usage_lookback = lookback;
        }
        if let Some(detail) = self.detail {
            settings.detail = detail;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_secs = timeout;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let settings = cli.apply(Settings::load(cli.config.as_deref())?)?;
    info!(
        cluster_lookback = %settings.cluster_lookback,
        usage_lookback = %settings.usage_lookback,
        "Settings loaded"
    );

    let client_config = match &cli.base_url {
        Some(base_url) => ClientConfig::with_base_url(base_url.clone(), cli.api_token.as_str()),
        None => ClientConfig::new(&cli.secure_url_authority, cli.api_token.as_str())?,
    };
    let client_config = client_config
        .with_timeout(settings.timeout())
        .with_cluster_limit(settings.cluster_limit)
        .with_agent_limit(settings.agent_limit);
    let client = SecureClient::new(client_config).context("Failed to create HTTP client")?;

    let scanner = DropOffScanner::new(client, settings.detector(), settings.scan_window(), Utc::now());
    let reporter = Reporter::new(settings.format, settings.detail, scanner.detector());

    match run(&scanner, &reporter).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(Failure::Api(err)) if err.is_transport() => {
            println!("An error occurred: {}", err);
            Ok(ExitCode::FAILURE)
        }
        Err(Failure::Api(err)) => Err(err.into()),
        Err(Failure::Render(err)) => Err(err).context("Failed to render report"),
    }
}

enum Failure {
    Api(ApiError),
    Render(serde_json::Error),
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Api(err)
    }
}

/// Scan clusters one at a time, printing each as soon as it is evaluated
async fn run(scanner: &DropOffScanner, reporter: &Reporter) -> Result<(), Failure> {
    if reporter.format() == OutputFormat::Json {
        let report = scanner.run().await?;
        let json = reporter.render_report(&report).map_err(Failure::Render)?;
        println!("{}", json);
        return Ok(());
    }

    let clusters = scanner.list_clusters().await?;
    if let Some(out) = reporter.render_clusters(&clusters).map_err(Failure::Render)? {
        print!("{}", out);
    }

    let mut findings = Vec::with_capacity(clusters.values.len());
    for cluster in &clusters.values {
        let mut finding = scanner.evaluate_cluster(cluster).await?;
        for series in &mut finding.series {
            // The drop-off line is shown even if the agent lookup fails
            if let Some(out) = reporter.render_series(cluster, series) {
                print!("{}", out);
            }
            if series.anomaly.is_some() {
                scanner.fetch_agents(cluster, series).await?;
                if let Some(out) = reporter.render_agents(series) {
                    print!("{}", out);
                }
            }
        }
        findings.push(finding);
    }

    let report = scanner.report(findings);
    if let Some(out) = reporter.render_summary(&report) {
        print!("{}", out);
    }

    Ok(())
}
