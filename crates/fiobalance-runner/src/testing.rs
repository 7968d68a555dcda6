//! In-memory `BenchmarkRunner` for tests

use crate::benchmark::{BenchmarkJob, BenchmarkOutput, BenchmarkRunner};
use crate::error::{JobError, Result};
use async_trait::async_trait;
use fiobalance_core::ThroughputSummary;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a job labelled with a given name behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    Succeed,
    Fail(i32),
    /// Never finishes on its own
    Hang,
    Panic,
}

#[derive(Default)]
pub struct FakeBenchmark {
    behaviors: Mutex<HashMap<String, FakeBehavior>>,
    calls: Mutex<Vec<BenchmarkJob>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    delay: Duration,
}

impl FakeBenchmark {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long succeeding and failing jobs take
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, label: &str, behavior: FakeBehavior) {
        lock(&self.behaviors).insert(label.to_string(), behavior);
    }

    pub fn calls(&self) -> Vec<BenchmarkJob> {
        lock(&self.calls).clone()
    }

    /// Highest number of jobs observed running at the same time
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn sample_summary() -> ThroughputSummary {
        ThroughputSummary {
            read_iops: 100.0,
            read_bw_kib: 204800,
            read_lat_mean_ns: 1_500_000.0,
            write_iops: 100.0,
            write_bw_kib: 204800,
            write_lat_mean_ns: 2_500_000.0,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

struct RunningGuard<'a>(&'a AtomicUsize);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BenchmarkRunner for FakeBenchmark {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, job: &BenchmarkJob) -> Result<BenchmarkOutput> {
        lock(&self.calls).push(job.clone());
        let behavior = lock(&self.behaviors)
            .get(&job.label)
            .copied()
            .unwrap_or(FakeBehavior::Succeed);

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        let _guard = RunningGuard(&self.running);

        match behavior {
            FakeBehavior::Succeed => {
                tokio::time::sleep(self.delay).await;
                Ok(BenchmarkOutput {
                    exit_status: Some(0),
                    summary: Some(Self::sample_summary()),
                })
            }
            FakeBehavior::Fail(code) => {
                tokio::time::sleep(self.delay).await;
                Err(JobError::NonZeroExit {
                    code,
                    stderr: format!("fio: {}: io_u error", job.label),
                })
            }
            FakeBehavior::Hang => std::future::pending().await,
            FakeBehavior::Panic => panic!("fake benchmark panicked on {}", job.label),
        }
    }
}
