//! Per-host session: setup, concurrent benchmark phase, teardown
//!
//! Teardown runs on every path out of `execute`, including operator
//! interrupts, and only releases what this session mounted.

use crate::benchmark::BenchmarkJob;
use crate::job::{JobOutcome, JobRunner};
use crate::report::{RunReport, TeardownFailure};
use chrono::Utc;
use fiobalance_core::{AssignmentState, HostIdentity, JobResult, MountAssignment, MountState};
use fiobalance_mount::{MountManager, MountOutcome, ensure_directory};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct Session {
    mounts: MountManager,
    jobs: JobRunner,
}

impl Session {
    pub fn new(mounts: MountManager, jobs: JobRunner) -> Self {
        Self { mounts, jobs }
    }

    pub async fn execute(
        &self,
        host: &HostIdentity,
        assignments: Vec<MountAssignment>,
        cancel: &CancellationToken,
    ) -> RunReport {
        let started_at = Utc::now();
        let mut state = MountState::new();
        let mut results: Vec<JobResult> = assignments.into_iter().map(JobResult::new).collect();

        info!(
            host = %host,
            assignments = results.len(),
            mounter = self.mounts.mounter_name(),
            benchmark = self.jobs.runner_name(),
            "session started"
        );

        for result in results.iter_mut() {
            if cancel.is_cancelled() {
                result.fail(AssignmentState::Interrupted, "interrupted before setup");
                continue;
            }
            self.setup(result, &mut state).await;
        }

        self.benchmark(&mut results, cancel).await;

        let teardown_failures = self.teardown(&mut results, &mut state).await;

        let report = RunReport {
            host: host.clone(),
            started_at,
            finished_at: Utc::now(),
            results,
            teardown_failures,
        };
        info!(
            completed = report.completed(),
            total = report.results.len(),
            success = report.is_success(),
            "session finished"
        );
        report
    }

    /// Mount and provision one assignment
    async fn setup(&self, result: &mut JobResult, state: &mut MountState) {
        result.state = AssignmentState::Mounting;
        match self.mounts.ensure_mounted(&result.assignment, state).await {
            Ok(outcome) => {
                result.mounted_here = outcome == MountOutcome::Mounted;
                result.state = AssignmentState::Mounted;
            }
            Err(e) => {
                warn!(mount = %result.assignment.label(), error = %e, "mount failed");
                // a timed out mount may still have been recorded for teardown
                result.mounted_here = state.contains(&result.assignment.mount_path);
                result.fail(AssignmentState::MountFailed, e.to_string());
                return;
            }
        }

        match ensure_directory(&result.assignment.working_directory).await {
            Ok(()) => result.state = AssignmentState::DirectoryReady,
            Err(e) => {
                warn!(mount = %result.assignment.label(), error = %e, "provisioning failed");
                result.fail(AssignmentState::ProvisionFailed, e.to_string());
            }
        }
    }

    async fn benchmark(&self, results: &mut [JobResult], cancel: &CancellationToken) {
        let ready: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state == AssignmentState::DirectoryReady)
            .map(|(i, _)| i)
            .collect();
        if ready.is_empty() {
            return;
        }

        let jobs = ready
            .iter()
            .map(|&i| {
                results[i].state = AssignmentState::Running;
                BenchmarkJob::for_assignment(&results[i].assignment)
            })
            .collect();
        let outcomes = self.jobs.run_all(jobs, cancel).await;

        for (i, outcome) in ready.into_iter().zip(outcomes) {
            let result = &mut results[i];
            match outcome {
                JobOutcome::Completed(output) => {
                    result.state = AssignmentState::Completed;
                    result.exit_status = output.exit_status;
                    result.summary = output.summary;
                }
                JobOutcome::Failed(e) => {
                    result.exit_status = e.exit_status();
                    result.fail(AssignmentState::Failed, e.to_string());
                }
                JobOutcome::Interrupted => {
                    result.fail(AssignmentState::Interrupted, "interrupted by operator");
                }
            }
        }
    }

    async fn teardown(
        &self,
        results: &mut [JobResult],
        state: &mut MountState,
    ) -> Vec<TeardownFailure> {
        let (released, failures) = match self.mounts.unmount_all(state).await {
            Ok(released) => (released, Vec::new()),
            Err(e) => {
                warn!(error = %e, "teardown incomplete");
                let failures = TeardownFailure::from_error(&e);
                (e.released, failures)
            }
        };
        mark_released(results, &released);
        failures
    }
}

fn mark_released(results: &mut [JobResult], released: &[PathBuf]) {
    for result in results.iter_mut() {
        if result.mounted_here && released.contains(&result.assignment.mount_path) {
            result.released = true;
        }
    }
}
