//! AI Task Scheduler - command-line entry point.
//!
//! Owns the two things no library crate is allowed to do (§4.10, §4.11):
//! reading configuration from a file/environment, and installing the
//! tracing subscriber. Everything else is constructed and handed down as
//! explicit arguments.

mod backends;
mod cli;
mod commands;
mod config;
mod error;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use scheduler_foundation::{
    DefaultScheduleCalculator, DefaultTimeParser, InMemoryTaskRepository, SqliteTaskRepository, TaskValidator,
};
use scheduler_kernel::clock::SystemClock;
use scheduler_kernel::repository::TaskRepository;
use scheduler_runtime::{Executor, ExecutorConfig, NotificationDispatcher, Poller, PollerConfig, RetryPolicy, TaskManager};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app_config = config::load(cli.config.as_deref())?;
    install_subscriber(cli.verbose, &app_config.log_format);

    let clock = Arc::new(SystemClock);
    let repository: Arc<dyn TaskRepository> = match &app_config.database_url {
        Some(url) => Arc::new(SqliteTaskRepository::connect(url).await?),
        None => Arc::new(InMemoryTaskRepository::new()),
    };
    let calculator = Arc::new(DefaultScheduleCalculator);
    let time_parser = Arc::new(DefaultTimeParser);

    let manager = TaskManager::new(
        repository.clone(),
        calculator.clone(),
        time_parser,
        TaskValidator::default(),
        clock.clone(),
        app_config.default_max_retries,
    );

    match cli.command {
        Commands::Task { action } => commands::run(&manager, action).await?,
        Commands::Serve => serve(repository, calculator, clock, &app_config).await?,
    }

    Ok(())
}

async fn serve(
    repository: Arc<dyn TaskRepository>,
    calculator: Arc<dyn scheduler_kernel::schedule::ScheduleCalculator>,
    clock: Arc<dyn scheduler_kernel::clock::Clock>,
    app_config: &config::AppConfig,
) -> anyhow::Result<()> {
    let dispatcher = NotificationDispatcher::new(Arc::new(backends::LoggingNotificationSink));
    let executor_config = ExecutorConfig {
        agent_timeout: std::time::Duration::from_secs(app_config.agent_timeout_seconds),
        retry_policy: RetryPolicy::ExponentialBackoff {
            base_ms: app_config.retry_base_ms,
            max_ms: app_config.retry_max_ms,
            jitter_fraction: app_config.retry_jitter_fraction,
        },
        quality_threshold: app_config.quality_threshold,
    };
    let executor = Arc::new(Executor::new(
        repository.clone(),
        Arc::new(backends::LoggingAgent),
        calculator,
        clock.clone(),
        dispatcher,
        executor_config,
    ));

    let poller_config = PollerConfig {
        tick_interval: std::time::Duration::from_secs(app_config.poll_interval_seconds),
        stuck_threshold: chrono::Duration::minutes(app_config.stuck_threshold_minutes),
        batch_limit: app_config.batch_limit,
        worker_count: app_config.worker_count,
        queue_capacity: app_config.queue_capacity,
        shutdown_grace: std::time::Duration::from_secs(app_config.shutdown_grace_seconds),
    };
    let poller = Poller::new(repository, executor, clock, poller_config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, draining poller");
        let _ = shutdown_tx.send(true);
    });

    poller.run(shutdown_rx).await;
    Ok(())
}

fn install_subscriber(verbose: bool, log_format: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
