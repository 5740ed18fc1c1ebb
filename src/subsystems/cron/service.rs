//! Broadcast scheduler — sleeps until the next fire time, runs the daily
//! broadcast, repeats. One broadcast at a time; a broadcast in progress is
//! finished before shutdown is observed.
//!
//! Interval schedules sleep on tokio's monotonic clock. Daily schedules aim at
//! a wall-clock instant and sleep toward it in bounded slices, re-reading
//! `Utc::now()` after each one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{ScheduleSpec, sleep_slice};
use crate::error::AppError;
use crate::subsystems::comms::ChatTransport;
use crate::subsystems::lexicon::LexiconService;
use crate::subsystems::runtime::{Component, ComponentFuture};

pub struct BroadcastScheduler<T: ChatTransport> {
    spec: ScheduleSpec,
    run_on_start: bool,
    service: Arc<LexiconService>,
    transport: Arc<T>,
}

impl<T: ChatTransport> BroadcastScheduler<T> {
    pub fn new(spec: ScheduleSpec, service: Arc<LexiconService>, transport: Arc<T>) -> Self {
        Self { spec, run_on_start: false, service, transport }
    }

    pub fn run_on_start(mut self, yes: bool) -> Self {
        self.run_on_start = yes;
        self
    }

    async fn run_loop(self, shutdown: CancellationToken) -> Result<(), AppError> {
        info!(spec = ?self.spec, run_on_start = self.run_on_start, "broadcast scheduler running");

        if self.run_on_start {
            self.fire().await;
        }

        loop {
            let due = match self.spec {
                ScheduleSpec::Interval { .. } => {
                    let delay = self.spec.delay_from(Utc::now());
                    debug!(delay_secs = delay.as_secs(), "next broadcast scheduled");
                    sleep_or_cancel(delay, &shutdown).await
                }
                ScheduleSpec::Daily { .. } => {
                    let target = self.spec.next_fire(Utc::now());
                    debug!(%target, "next broadcast scheduled");
                    wait_until(target, &shutdown).await
                }
            };

            if !due {
                info!("broadcast scheduler shutting down");
                break;
            }
            self.fire().await;
        }
        Ok(())
    }

    /// Errors are logged; the schedule keeps running.
    async fn fire(&self) {
        debug!("scheduled broadcast firing");
        if let Err(e) = self.service.daily_broadcast(self.transport.as_ref()).await {
            error!(error = %e, "scheduled broadcast failed");
        }
    }
}

/// `false` if `shutdown` fired first.
async fn sleep_or_cancel(delay: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;

        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Sleep until the wall clock reaches `target`. `false` if `shutdown` fired first.
async fn wait_until(target: DateTime<Utc>, shutdown: &CancellationToken) -> bool {
    while let Some(slice) = sleep_slice(target, Utc::now()) {
        if !sleep_or_cancel(slice, shutdown).await {
            return false;
        }
    }
    true
}

impl<T: ChatTransport> Component for BroadcastScheduler<T> {
    fn id(&self) -> &str {
        "cron"
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(self.run_loop(shutdown))
    }
}
