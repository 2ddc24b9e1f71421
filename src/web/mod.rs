pub mod handlers;
pub mod server;

pub use server::start_web_server;

use crate::catalog::TaskCatalog;
use crate::config::Config;
use crate::executor::TaskExecutor;
use crate::health::HealthAggregator;
use crate::history::HistoryLedger;
use crate::run_guard::RunGuard;
use crate::scheduler::SweepCoordinator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: TaskCatalog,
    pub executor: Arc<TaskExecutor>,
    pub history: HistoryLedger,
    pub run_guard: RunGuard,
    pub aggregator: Arc<HealthAggregator>,
    pub sweep: Arc<SweepCoordinator>,
}
