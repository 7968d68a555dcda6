//! Concurrent benchmark execution
//!
//! One tokio task per job, each bounded by the profile's time limit. A
//! failing, timed out or panicking job never affects its siblings; operator
//! cancellation stops every job that is still running.

use crate::benchmark::{BenchmarkJob, BenchmarkOutput, BenchmarkRunner};
use crate::error::JobError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Terminal outcome of one job
#[derive(Debug)]
pub enum JobOutcome {
    Completed(BenchmarkOutput),
    Failed(JobError),
    Interrupted,
}

pub struct JobRunner {
    runner: Arc<dyn BenchmarkRunner>,
    time_bound: Duration,
}

impl JobRunner {
    pub fn new(runner: Arc<dyn BenchmarkRunner>, time_bound: Duration) -> Self {
        Self { runner, time_bound }
    }

    pub fn runner_name(&self) -> &str {
        self.runner.name()
    }

    /// Run every job concurrently and wait for all of them.
    ///
    /// Outcomes are returned in job order.
    pub async fn run_all(
        &self,
        jobs: Vec<BenchmarkJob>,
        cancel: &CancellationToken,
    ) -> Vec<JobOutcome> {
        let mut outcomes: Vec<Option<JobOutcome>> = jobs.iter().map(|_| None).collect();
        let mut set = JoinSet::new();
        let mut slots = HashMap::new();

        for (slot, job) in jobs.into_iter().enumerate() {
            let runner = Arc::clone(&self.runner);
            let cancel = cancel.clone();
            let bound = self.time_bound;
            let handle = set.spawn(async move { run_one(runner, job, bound, cancel).await });
            slots.insert(handle.id(), slot);
        }

        while let Some(joined) = set.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(e) => {
                    let id = e.id();
                    let outcome = if e.is_panic() {
                        JobOutcome::Failed(JobError::Panicked(panic_message(e.into_panic())))
                    } else {
                        JobOutcome::Interrupted
                    };
                    (id, outcome)
                }
            };
            if let Some(&slot) = slots.get(&id) {
                if let JobOutcome::Failed(e) = &outcome {
                    warn!(slot, error = %e, "benchmark failed");
                }
                outcomes[slot] = Some(outcome);
            }
        }

        outcomes
            .into_iter()
            .map(|o| o.unwrap_or(JobOutcome::Interrupted))
            .collect()
    }
}

async fn run_one(
    runner: Arc<dyn BenchmarkRunner>,
    job: BenchmarkJob,
    bound: Duration,
    cancel: CancellationToken,
) -> JobOutcome {
    info!(job = %job.label, threads = job.threads, directory = %job.directory.display(), "benchmark started");

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(job = %job.label, "benchmark interrupted");
            JobOutcome::Interrupted
        }
        result = tokio::time::timeout(bound, runner.run(&job)) => match result {
            Ok(Ok(output)) => {
                let bw = output.summary.as_ref().map(|s| s.total_bw_kib()).unwrap_or(0);
                info!(job = %job.label, bw_kib = bw, "benchmark completed");
                JobOutcome::Completed(output)
            }
            Ok(Err(e)) => JobOutcome::Failed(e),
            Err(_) => JobOutcome::Failed(JobError::Timeout { after: bound }),
        },
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
