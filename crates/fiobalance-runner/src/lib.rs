//! Benchmark execution for fio-balancer
//!
//! - [`FioRunner`]: `fio` process wrapper behind the [`BenchmarkRunner`] trait
//! - [`JobRunner`]: one task per job, per-job time limit, no sibling cancellation
//! - [`Session`]: mount, provision, benchmark and always tear down
//! - [`RunReport`]: per-assignment outcomes plus teardown failures

pub mod benchmark;
pub mod error;
pub mod fio;
pub mod job;
pub mod profile;
pub mod report;
pub mod session;
pub mod summary;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use benchmark::{BenchmarkJob, BenchmarkOutput, BenchmarkRunner};
pub use error::{JobError, Result};
pub use fio::FioRunner;
pub use job::{JobOutcome, JobRunner};
pub use profile::{FioProfile, GRACE_PERIOD};
pub use report::{RunReport, TeardownFailure};
pub use session::Session;
pub use summary::parse_summary;
