pub mod run;
pub mod single;
pub mod teardown;

use crate::output;
use crate::utils;
use anyhow::{Context, bail};
use clap::Args;
use fiobalance_config::Overrides;
use fiobalance_core::{FleetConfig, HostIdentity, MountAssignment, RawConfig};
use fiobalance_mount::{MountManager, NfsMounter};
use fiobalance_runner::{FioProfile, FioRunner, JobRunner, Session};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_MOUNT_BASE: &str = "/mnt";

/// Where the fleet configuration comes from
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// YAML configuration file (discovered when omitted)
    #[arg(short, long, conflicts_with_all = ["hosts", "ips"])]
    pub config: Option<PathBuf>,

    /// All fleet host names, in fleet order
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub hosts: Vec<String>,

    /// All storage server addresses, in mount order
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub ips: Vec<String>,

    /// Directory the mountN directories are created in [default: /mnt]
    #[arg(long)]
    pub mount_base: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self, default_threads: u32, overrides: Overrides) -> anyhow::Result<FleetConfig> {
        let overrides = Overrides {
            mount_base: self.mount_base.clone(),
            ..overrides
        };

        if self.hosts.is_empty() && self.ips.is_empty() {
            return fiobalance_config::load_or_discover(
                self.config.as_deref(),
                default_threads,
                &overrides,
            )
            .context("failed to load configuration");
        }
        if self.hosts.is_empty() || self.ips.is_empty() {
            bail!("--hosts and --ips must be given together");
        }

        let mut raw = RawConfig {
            hosts: self.hosts.clone(),
            ip_addresses: self.ips.clone(),
            mount_base: PathBuf::from(DEFAULT_MOUNT_BASE),
            ..Default::default()
        };
        overrides.apply(&mut raw);
        FleetConfig::from_raw(raw, default_threads).context("invalid command line configuration")
    }
}

/// Options shared by the commands that run benchmarks
#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    /// Options passed to mount -o (overrides the configuration)
    #[arg(long)]
    pub mount_options: Option<String>,

    /// fio binary
    #[arg(long, env = "FIO_BALANCER_FIO", default_value = "fio")]
    pub fio: PathBuf,

    /// Print the plan or report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the plan without mounting or running anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Print the plan, or run it and print the report
pub async fn plan_or_execute(
    host: &HostIdentity,
    assignments: Vec<MountAssignment>,
    mount_options: Option<String>,
    exec: &ExecArgs,
) -> anyhow::Result<()> {
    if exec.dry_run {
        return output::print_plan(host, &assignments, mount_options.as_deref(), exec.json);
    }

    let profile = FioProfile::default();
    let time_bound = profile.time_bound();
    let session = Session::new(
        MountManager::new(Arc::new(NfsMounter::new())).with_options(mount_options),
        JobRunner::new(
            Arc::new(FioRunner::new().with_binary(&exec.fio).with_profile(profile)),
            time_bound,
        ),
    );

    let cancel = utils::cancel_on_signal();
    let report = session.execute(host, assignments, &cancel).await;

    if exec.json {
        output::print_json(&report)?;
    } else {
        output::print_report(&report);
    }

    if !report.is_success() {
        std::process::exit(report.exit_code());
    }
    Ok(())
}
