//! Per-stage bounded worker pools, generalizing the DAG-phase executor
//! (`orchestrator.rs::run_dag`, which runs one parallel group of
//! stages to completion before the next) into a long-running loop per
//! stage: stages here are not a one-shot DAG executed once per job, they
//! are continuously-polled bounded pools across many files.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use ohp_store::{Stage, Store};

use crate::error::FatalError;
use crate::workers::StageWorker;

#[derive(Debug, Clone)]
pub struct StageConfig {
    pub concurrency: usize,
    pub lease_ttl: chrono::Duration,
}

pub struct SchedulerConfig {
    pub stages: HashMap<Stage, StageConfig>,
    pub poll_interval: Duration,
    pub reclaim_interval: Duration,
    /// How long a graceful drain waits for in-flight workers before the
    /// scheduler gives up and lets leases expire naturally.
    pub drain_deadline: Duration,
}

impl SchedulerConfig {
    /// Defaults from §4.F / §6: transcription=10, each translation=8, each
    /// evaluation=4; lease TTL 2 hours for transcription, 30 minutes for
    /// translation and evaluation.
    pub fn defaults() -> Self {
        let mut stages = HashMap::new();
        for stage in Stage::ALL {
            let (concurrency, lease_ttl) = match stage {
                Stage::Transcription => (10, chrono::Duration::hours(2)),
                Stage::TranslationEn | Stage::TranslationDe | Stage::TranslationHe => {
                    (8, chrono::Duration::minutes(30))
                }
                Stage::EvaluationEn | Stage::EvaluationDe | Stage::EvaluationHe => {
                    (4, chrono::Duration::minutes(30))
                }
            };
            stages.insert(stage, StageConfig { concurrency, lease_ttl });
        }
        Self {
            stages,
            poll_interval: Duration::from_millis(500),
            reclaim_interval: Duration::from_secs(60),
            drain_deadline: Duration::from_secs(30),
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn Store>,
    workers: HashMap<Stage, Arc<dyn StageWorker>>,
    config: SchedulerConfig,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, workers: HashMap<Stage, Arc<dyn StageWorker>>, config: SchedulerConfig) -> Self {
        Self { store, workers, config, cancel: CancellationToken::new() }
    }

    /// The token external callers (signal handlers) cancel to begin a
    /// graceful drain.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs every stage's claim loop plus the lease-reclamation sweep until
    /// cancelled or a fatal error occurs. Returns the first fatal error
    /// encountered, if any.
    pub async fn run(&self) -> Result<(), FatalError> {
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<FatalError>();
        let mut handles = Vec::new();

        for (&stage, worker) in &self.workers {
            let stage_config = self
                .config
                .stages
                .get(&stage)
                .cloned()
                .unwrap_or(StageConfig { concurrency: 1, lease_ttl: chrono::Duration::minutes(30) });
            let store = self.store.clone();
            let worker = worker.clone();
            let cancel = self.cancel.clone();
            let fatal_tx = fatal_tx.clone();
            let poll_interval = self.config.poll_interval;
            let owner_id = format!("worker-{}-{}", stage, uuid::Uuid::new_v4());

            handles.push(tokio::spawn(async move {
                stage_loop(stage, store, worker, owner_id, stage_config, poll_interval, cancel, fatal_tx).await;
            }));
        }

        {
            let store = self.store.clone();
            let cancel = self.cancel.clone();
            let reclaim_interval = self.config.reclaim_interval;
            let fatal_tx = fatal_tx.clone();
            handles.push(tokio::spawn(async move {
                reclaim_loop(store, reclaim_interval, cancel, fatal_tx).await;
            }));
        }

        drop(fatal_tx);

        let fatal = tokio::select! {
            fatal = fatal_rx.recv() => fatal,
            _ = self.cancel.cancelled() => None,
        };

        if fatal.is_some() {
            self.cancel.cancel();
        }

        // Graceful drain: give in-flight workers up to `drain_deadline` to
        // finish before returning; a second interrupt forcing an abort is
        // the caller's responsibility (ohp-orchestrator's signal handling).
        let _ = tokio::time::timeout(self.config.drain_deadline, futures::future::join_all(handles)).await;

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn stage_loop(
    stage: Stage,
    store: Arc<dyn Store>,
    worker: Arc<dyn StageWorker>,
    owner_id: String,
    config: StageConfig,
    poll_interval: Duration,
    cancel: CancellationToken,
    fatal_tx: mpsc::UnboundedSender<FatalError>,
) {
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut in_flight = Vec::new();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        match store.claim(stage, &owner_id, config.lease_ttl).await {
            Ok(Some(claimed)) => {
                let worker = worker.clone();
                let cancel_child = cancel.clone();
                let fatal_tx = fatal_tx.clone();
                in_flight.push(tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(fatal) = worker.run(claimed.file_id, &cancel_child).await {
                        tracing::error!(stage = %stage, file_id = %claimed.file_id, error = %fatal, "fatal error in stage worker");
                        let _ = fatal_tx.send(fatal);
                    }
                }));
            }
            Ok(None) => {
                drop(permit);
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => {
                let _ = fatal_tx.send(e.into());
                break;
            }
        }

        in_flight.retain(|h| !h.is_finished());
    }

    for h in in_flight {
        let _ = h.await;
    }
}

async fn reclaim_loop(
    store: Arc<dyn Store>,
    interval: Duration,
    cancel: CancellationToken,
    fatal_tx: mpsc::UnboundedSender<FatalError>,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {
                if let Err(e) = store.reclaim_expired_leases(Utc::now()).await {
                    let _ = fatal_tx.send(e.into());
                    break;
                }
            }
        }
    }
}
