//! Assembles an executor wired to in-memory components

use super::probes::FixedProbe;
use hostpanel::alerts::AlertDispatcher;
use hostpanel::catalog::{TaskCatalog, TaskDefinition};
use hostpanel::executor::operations::{OperationRegistry, TaskOperation};
use hostpanel::executor::TaskExecutor;
use hostpanel::health::HealthAggregator;
use hostpanel::history::HistoryLedger;
use hostpanel::run_guard::RunGuard;
use hostpanel::scheduler::SweepCoordinator;
use std::sync::Arc;

pub struct TestEngine {
    pub catalog: TaskCatalog,
    pub history: HistoryLedger,
    pub run_guard: RunGuard,
    pub executor: Arc<TaskExecutor>,
    pub aggregator: Arc<HealthAggregator>,
    pub alerts: Arc<AlertDispatcher>,
}

impl TestEngine {
    pub fn sweep(&self) -> Arc<SweepCoordinator> {
        Arc::new(SweepCoordinator::new(
            self.catalog.clone(),
            self.executor.clone(),
        ))
    }
}

pub struct TestEngineBuilder {
    tasks: Vec<TaskDefinition>,
    builtins: Vec<(String, Arc<dyn TaskOperation>)>,
    webhook_url: String,
    cooldown_minutes: i64,
    probe: FixedProbe,
    monitored_services: Vec<String>,
    history: Option<HistoryLedger>,
}

impl TestEngineBuilder {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            builtins: Vec::new(),
            webhook_url: String::new(),
            // Cooldown off by default so every alert is observable
            cooldown_minutes: 0,
            probe: FixedProbe::healthy(),
            monitored_services: Vec::new(),
            history: None,
        }
    }

    pub fn task(mut self, task: TaskDefinition) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn builtin(mut self, name: &str, operation: Arc<dyn TaskOperation>) -> Self {
        self.builtins.push((name.to_string(), operation));
        self
    }

    pub fn webhook(mut self, url: &str) -> Self {
        self.webhook_url = url.to_string();
        self
    }

    pub fn cooldown(mut self, minutes: i64) -> Self {
        self.cooldown_minutes = minutes;
        self
    }

    pub fn probe(mut self, probe: FixedProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn monitored_services(mut self, services: &[&str]) -> Self {
        self.monitored_services = services.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn history(mut self, history: HistoryLedger) -> Self {
        self.history = Some(history);
        self
    }

    pub fn build(self) -> TestEngine {
        let catalog = TaskCatalog::new(self.tasks).expect("test catalog should be valid");
        let history = self.history.unwrap_or_default();
        let run_guard = RunGuard::new();
        let alerts = Arc::new(AlertDispatcher::new(
            self.webhook_url,
            self.cooldown_minutes,
        ));
        let aggregator = Arc::new(HealthAggregator::new(
            Arc::new(self.probe),
            80.0,
            90.0,
            self.monitored_services,
        ));

        let mut registry = OperationRegistry::standard(aggregator.clone(), alerts.clone());
        for (name, operation) in self.builtins {
            registry.register(&name, operation);
        }

        let executor = Arc::new(TaskExecutor::new(
            catalog.clone(),
            history.clone(),
            run_guard.clone(),
            Arc::new(registry),
            alerts.clone(),
        ));

        TestEngine {
            catalog,
            history,
            run_guard,
            executor,
            aggregator,
            alerts,
        }
    }
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
