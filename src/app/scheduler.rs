//! Non-overlapping pipeline runs: at startup, on a fixed interval, and on demand.

use crate::app::pipeline::{EtlPipeline, RunReport};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};

pub struct EtlScheduler {
    pipeline: EtlPipeline,
    /// Held for the whole duration of a run; a second caller skips instead of waiting.
    run_lock: Mutex<()>,
    last_report: RwLock<Option<RunReport>>,
    shutdown: Arc<Notify>,
}

impl EtlScheduler {
    pub fn new(pipeline: EtlPipeline) -> Self {
        Self {
            pipeline,
            run_lock: Mutex::new(()),
            last_report: RwLock::new(None),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Runs the pipeline unless a run is already in flight, in which case the
    /// returned report has outcome `Skipped` and nothing is recorded.
    pub async fn run_exclusive(&self) -> RunReport {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("previous ETL run still in flight, skipping");
            return RunReport::skipped();
        };
        let report = self.pipeline.run().await;
        *self.last_report.write().await = Some(report.clone());
        report
    }

    pub async fn last_report(&self) -> Option<RunReport> {
        self.last_report.read().await.clone()
    }

    /// Runs once immediately when `run_immediately` is set, then every `every` if given.
    /// Without an immediate run the first scheduled run happens one interval after start.
    /// Ticks that arrive while a run is still going are dropped rather than queued.
    pub fn start_background_task(
        self: Arc<Self>,
        every: Option<Duration>,
        run_immediately: bool,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let Some(every) = every else {
                if run_immediately {
                    self.run_exclusive().await;
                }
                return;
            };

            info!(interval_secs = every.as_secs(), run_immediately, "ETL schedule started");
            let mut timer = if run_immediately {
                interval(every)
            } else {
                interval_at(Instant::now() + every, every)
            };
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let shutdown = self.shutdown.clone();
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        self.run_exclusive().await;
                    }
                    _ = shutdown.notified() => {
                        info!("ETL schedule shutting down");
                        break;
                    }
                }
            }
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
