//! Background sync worker.
//!
//! A single worker task owns the [`SyncService`] and runs queued jobs one at a
//! time. It can also sync every linked account on a fixed interval.

use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

use super::{SyncReport, SyncService};

const QUEUE_CAPACITY: usize = 32;

struct SyncJob {
    account_id: Uuid,
    reply: Option<oneshot::Sender<SyncReport>>,
}

/// Cheap handle for enqueueing sync jobs.
#[derive(Clone)]
pub struct SyncHandle {
    sender: mpsc::Sender<SyncJob>,
}

impl SyncHandle {
    /// Queue a pass for `account_id` without waiting for it.
    pub async fn enqueue(&self, account_id: Uuid) -> Result<()> {
        self.sender
            .send(SyncJob {
                account_id,
                reply: None,
            })
            .await
            .map_err(|_| anyhow!("Sync worker has stopped"))
    }

    /// Queue a pass for `account_id` and wait for its report.
    pub async fn sync_now(&self, account_id: Uuid) -> Result<SyncReport> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(SyncJob {
                account_id,
                reply: Some(reply),
            })
            .await
            .map_err(|_| anyhow!("Sync worker has stopped"))?;
        receiver.await.map_err(|_| anyhow!("Sync worker dropped the job"))
    }
}

pub struct SyncWorker {
    service: SyncService,
    receiver: mpsc::Receiver<SyncJob>,
    interval: Option<Duration>,
}

impl SyncWorker {
    /// Start the worker on the current runtime.
    ///
    /// With `interval` set, every linked account is synced each period. The worker
    /// stops once every [`SyncHandle`] has been dropped.
    pub fn spawn(service: SyncService, interval: Option<Duration>) -> (SyncHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let worker = SyncWorker {
            service,
            receiver,
            interval,
        };
        (SyncHandle { sender }, tokio::spawn(worker.run()))
    }

    async fn run(mut self) {
        match self.interval {
            Some(period) => info!("Starting sync worker (auto-sync every {:?})", period),
            None => info!("Starting sync worker (auto-sync disabled)"),
        }

        let mut ticker = self.interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            tokio::select! {
                job = self.receiver.recv() => {
                    let Some(job) = job else {
                        break;
                    };
                    self.run_job(job).await;
                }
                _ = next_tick(&mut ticker) => {
                    self.run_scheduled().await;
                }
            }
        }

        info!("Sync worker stopped");
    }

    async fn run_job(&self, job: SyncJob) {
        let report = self.service.sync_account(&job.account_id).await;
        if report.is_retryable() {
            warn!("Sync of account {} can be retried: {}", job.account_id, report.summary());
        }
        if let Some(reply) = job.reply {
            // The caller may have stopped waiting.
            let _ = reply.send(report);
        }
    }

    async fn run_scheduled(&self) {
        match self.service.sync_all().await {
            Ok(reports) => {
                let failed = reports.iter().filter(|r| !r.is_success()).count();
                info!("Auto-sync finished for {} accounts ({} with errors)", reports.len(), failed);
            }
            Err(e) => error!("❌ Auto-sync failed: {:#}", e),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
