use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hnotif_core::app::{AppBuilder, RetryPolicy};
use hnotif_core::config::{AppConfig, FetchFailurePolicy};
use hnotif_core::domain::Policy;
use hnotif_core::impls::{DEFAULT_BASE_URL, HackerNewsFetcher, OutputFormat, StdoutSink};

const HOUR: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnFetchError {
    Abort,
    Skip,
}

impl From<OnFetchError> for FetchFailurePolicy {
    fn from(value: OnFetchError) -> Self {
        match value {
            OnFetchError::Abort => FetchFailurePolicy::Abort,
            OnFetchError::Skip => FetchFailurePolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Text,
    Json,
}

impl From<Output> for OutputFormat {
    fn from(value: Output) -> Self {
        match value {
            Output::Text => OutputFormat::Text,
            Output::Json => OutputFormat::Json,
        }
    }
}

/// Hacker News の人気ストーリーを 1 度だけ通知する
#[derive(Debug, Parser)]
#[command(name = "hnotif", version, about)]
struct Args {
    /// Notify once a story's score reaches this value
    #[arg(long, env = "HNOTIF_THRESHOLD", default_value_t = 100)]
    threshold: i64,

    /// Stop watching stories older than this
    #[arg(long, env = "HNOTIF_STALE_AGE_HOURS", default_value_t = 48)]
    stale_age_hours: u64,

    /// Forget resolved stories older than this
    #[arg(long, env = "HNOTIF_RETENTION_DAYS", default_value_t = 5)]
    retention_days: u64,

    #[arg(long, env = "HNOTIF_EVAL_INTERVAL_SECS", default_value_t = 10)]
    eval_interval_secs: u64,

    #[arg(long, env = "HNOTIF_EVICT_INTERVAL_HOURS", default_value_t = 8)]
    evict_interval_hours: u64,

    /// Per-request timeout for the HN API
    #[arg(long, env = "HNOTIF_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    fetch_timeout_secs: u64,

    /// Attempts per tick for the ranked list
    #[arg(long, env = "HNOTIF_RANKED_ATTEMPTS", default_value_t = 3)]
    ranked_attempts: u32,

    #[arg(long, env = "HNOTIF_ON_FETCH_ERROR", value_enum, default_value_t = OnFetchError::Skip)]
    on_fetch_error: OnFetchError,

    #[arg(long, env = "HNOTIF_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "HNOTIF_OUTPUT", value_enum, default_value_t = Output::Text)]
    output: Output,

    #[arg(long, env = "HNOTIF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            policy: Policy::new(
                self.threshold,
                Duration::from_secs(self.stale_age_hours.saturating_mul(HOUR)),
            ),
            retention_horizon: Duration::from_secs(self.retention_days.saturating_mul(24 * HOUR)),
            evaluation_interval: Duration::from_secs(self.eval_interval_secs),
            eviction_interval: Duration::from_secs(self.evict_interval_hours.saturating_mul(HOUR)),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            on_fetch_error: self.on_fetch_error.into(),
            ranked_retry: RetryPolicy {
                max_attempts: self.ranked_attempts,
                ..RetryPolicy::default()
            },
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hnotif=info,hnotif_core=info".into());

    // 通知は stdout、ログは stderr
    let pretty = (format == LogFormat::Pretty)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env を先に読んで HNOTIF_* を clap から見えるようにする
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = args.app_config();
    config.validate()?;

    let fetcher = HackerNewsFetcher::new(config.fetch_timeout)
        .context("failed to build HTTP client")?
        .with_base_url(args.base_url.as_str());

    let app = AppBuilder::new()
        .config(config)
        .fetcher(Arc::new(fetcher))
        .sink(Arc::new(StdoutSink::new(args.output.into())))
        .build()?;

    if args.once {
        let report = app
            .run_once()
            .await
            .context("ranked list unavailable")?;
        info!(pass_id = %report.pass_id, notified = report.notified.len(), "single pass done");
        return Ok(());
    }

    let handle = app.spawn();
    shutdown_signal()
        .await
        .context("failed to install signal handlers")?;

    info!("shutdown requested, waiting for in-flight pass");
    let status = handle.shutdown_and_join().await;
    info!(
        passes = status.passes,
        notified_total = status.notified_total,
        "hnotif stopped"
    );
    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("received Ctrl+C");
            }
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use hnotif_core::config::ConfigError;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_reference_config() {
        let args = Args::try_parse_from(["hnotif"]).unwrap();
        assert_eq!(args.app_config(), AppConfig::default());
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
        assert!(!args.once);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "hnotif",
            "--threshold",
            "250",
            "--stale-age-hours",
            "12",
            "--on-fetch-error",
            "abort",
            "--output",
            "json",
            "--once",
        ])
        .unwrap();

        let config = args.app_config();
        assert_eq!(config.policy.score_threshold, 250);
        assert_eq!(config.policy.stale_age, Duration::from_secs(12 * HOUR));
        assert_eq!(config.on_fetch_error, FetchFailurePolicy::Abort);
        assert_eq!(args.output, Output::Json);
        assert!(args.once);
    }

    #[test]
    fn saturated_interval_fails_validation() {
        let args = Args::try_parse_from([
            "hnotif",
            "--evict-interval-hours",
            "18446744073709551615",
        ])
        .unwrap();
        assert!(matches!(
            args.app_config().validate(),
            Err(ConfigError::DurationTooLong { .. })
        ));
    }

    #[test]
    fn rejects_unknown_failure_policy() {
        assert!(Args::try_parse_from(["hnotif", "--on-fetch-error", "retry"]).is_err());
    }
}
