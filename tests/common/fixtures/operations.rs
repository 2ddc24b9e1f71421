//! Controllable task operations for executor and sweep tests

use async_trait::async_trait;
use hostpanel::catalog::TaskDefinition;
use hostpanel::executor::operations::{OpContext, TaskOperation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Counts invocations; optionally fails every run
pub struct CountingOperation {
    invocations: AtomicUsize,
    fail: bool,
}

impl CountingOperation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            invocations: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskOperation for CountingOperation {
    async fn run(&self, _task: &TaskDefinition, ctx: &mut OpContext) -> anyhow::Result<()> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            ctx.error_line("operation failed");
            Err(anyhow::anyhow!("operation failed"))
        } else {
            ctx.log("operation ran");
            Ok(())
        }
    }
}

/// Blocks inside its run until released, so tests can hold a task in the
/// running state
pub struct GateOperation {
    started: Notify,
    release: Notify,
}

impl GateOperation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
        })
    }

    /// Wait until the operation is inside its run
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl TaskOperation for GateOperation {
    async fn run(&self, _task: &TaskDefinition, ctx: &mut OpContext) -> anyhow::Result<()> {
        self.started.notify_one();
        self.release.notified().await;
        ctx.log("gate released");
        Ok(())
    }
}

/// Fails on the first run, succeeds afterwards; exercises auto-fix retries
pub struct FailFirstOperation {
    attempts: AtomicUsize,
}

impl FailFirstOperation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskOperation for FailFirstOperation {
    async fn run(&self, _task: &TaskDefinition, ctx: &mut OpContext) -> anyhow::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 {
            ctx.error_line("transient failure");
            Err(anyhow::anyhow!("transient failure"))
        } else {
            ctx.log("second attempt ok");
            Ok(())
        }
    }
}

/// Panics mid-run; the executor must contain it
pub struct PanicOperation;

#[async_trait]
impl TaskOperation for PanicOperation {
    async fn run(&self, _task: &TaskDefinition, _ctx: &mut OpContext) -> anyhow::Result<()> {
        panic!("operation blew up");
    }
}

/// Sleeps on the tokio clock; pairs with paused-time tests for timeouts
pub struct SleepOperation {
    pub duration: Duration,
}

impl SleepOperation {
    pub fn minutes(minutes: u64) -> Arc<Self> {
        Arc::new(Self {
            duration: Duration::from_secs(minutes * 60),
        })
    }
}

#[async_trait]
impl TaskOperation for SleepOperation {
    async fn run(&self, _task: &TaskDefinition, ctx: &mut OpContext) -> anyhow::Result<()> {
        tokio::time::sleep(self.duration).await;
        ctx.log("woke up");
        Ok(())
    }
}

/// Appends the running task's id to a shared list, for ordering checks
pub struct RecordingOperation {
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingOperation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskOperation for RecordingOperation {
    async fn run(&self, task: &TaskDefinition, ctx: &mut OpContext) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(task.id.clone());
        ctx.log("recorded");
        Ok(())
    }
}
