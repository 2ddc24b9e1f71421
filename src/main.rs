use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use hostpanel::alerts::AlertDispatcher;
use hostpanel::catalog::TaskCatalog;
use hostpanel::config::ConfigManager;
use hostpanel::constants::runs::OVERDUE_CHECK_INTERVAL_SECONDS;
use hostpanel::database::SqliteResultSink;
use hostpanel::executor::operations::OperationRegistry;
use hostpanel::executor::TaskExecutor;
use hostpanel::health::{HealthAggregator, SystemProbe};
use hostpanel::history::HistoryLedger;
use hostpanel::run_guard::RunGuard;
use hostpanel::scheduler::{MaintenanceScheduler, SweepCoordinator};
use hostpanel::web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("hostpanel=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Hostpanel Maintenance Engine");

    // Load configuration
    let config_manager = ConfigManager::new("config").await?;
    let config = config_manager.get_current_config().await;
    let timezone = config.tz()?;
    info!(
        "Configuration loaded: {} tasks, schedules evaluate in {}",
        config.tasks.len(),
        timezone
    );

    // Build the task catalog
    let catalog = TaskCatalog::new(config.tasks.clone())?;

    // Result history, optionally backed by SQLite
    let history = match &config.history_database_path {
        Some(path) => {
            let sink = SqliteResultSink::new(path).await?;
            info!("Result history persisted to {}", path);
            HistoryLedger::with_sink(Arc::new(sink))
        }
        None => HistoryLedger::new(),
    };

    let run_guard = RunGuard::new();

    // Alert dispatcher with startup connectivity check
    let alerts = Arc::new(AlertDispatcher::new(
        config.alarm_webhook_url.clone(),
        config.alert_cooldown_minutes,
    ));
    if alerts.is_enabled() {
        info!("Alerting enabled with webhook: {}", alerts.webhook_url());
        match alerts.test_webhook().await {
            Ok(()) => info!("Alert webhook test successful"),
            Err(e) => {
                warn!("Alert webhook test failed: {}", e);
                warn!("Alerts may not be delivered. Check the webhook URL and network connectivity.");
            }
        }
    } else {
        warn!("No alert webhook configured, alerting disabled");
        warn!("Set 'alarm_webhook_url' in config/main.toml to enable alerts");
    }

    // Health aggregation over local system probes
    let probe = Arc::new(SystemProbe::new(config.disk_path.clone()));
    let aggregator = Arc::new(HealthAggregator::new(
        probe,
        config.warning_threshold_percent,
        config.critical_threshold_percent,
        config.monitored_services.clone(),
    ));
    info!(
        "Health aggregator initialized, monitoring {} services",
        config.monitored_services.len()
    );

    // Operation registry; every builtin reference must resolve before start
    let registry = Arc::new(OperationRegistry::standard(
        aggregator.clone(),
        alerts.clone(),
    ));
    for task in catalog.list_tasks().await {
        registry
            .validate(&task)
            .map_err(|e| anyhow!("Task '{}' cannot be executed: {}", task.id, e))?;
    }

    let executor = Arc::new(TaskExecutor::new(
        catalog.clone(),
        history.clone(),
        run_guard.clone(),
        registry,
        alerts.clone(),
    ));

    let sweep = Arc::new(SweepCoordinator::new(catalog.clone(), executor.clone()));

    // Register cron jobs and start the scheduler
    let scheduler =
        MaintenanceScheduler::new(catalog.clone(), executor.clone(), timezone).await?;
    scheduler.start().await?;

    // Watch for runs that blew far past their estimate
    let overdue_guard = run_guard.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            OVERDUE_CHECK_INTERVAL_SECONDS,
        ));
        loop {
            interval.tick().await;
            for run in overdue_guard.overdue_runs().await {
                warn!(
                    "Run {} of task '{}' has been active for {}m (estimated {}m)",
                    run.run_id,
                    run.task_id,
                    run.running_for_minutes(),
                    run.estimated_minutes
                );
            }
        }
    });

    // Start web server
    let state = AppState {
        config: config.clone(),
        catalog,
        executor,
        history,
        run_guard,
        aggregator,
        sweep,
    };
    start_web_server(state).await?;

    Ok(())
}
