use super::{DEFAULT_MOUNT_BASE, ExecArgs};
use crate::utils;
use anyhow::Context;
use clap::Args;
use fiobalance_config::Overrides;
use fiobalance_core::{
    FleetConfig, HostIdentity, IpSelection, RawConfig, SINGLE_HOST_DEFAULT_THREADS,
    check_mount_count, plan,
};
use std::path::PathBuf;

/// Mount points a single-host run is expected to drive
const EXPECTED_MOUNTS: usize = 8;

#[derive(Args, Debug)]
pub struct SingleArgs {
    /// This host's name (defaults to the system hostname)
    #[arg(long, env = "FIO_BALANCER_HOST")]
    pub host: Option<String>,

    /// Addresses to exercise from this host
    #[arg(long, required = true, value_delimiter = ',', num_args = 1..)]
    pub ips: Vec<String>,

    /// Thread budget for this host
    #[arg(short = 't', long, default_value_t = SINGLE_HOST_DEFAULT_THREADS)]
    pub total_threads: u32,

    /// Fleet configuration, for mount numbers that match fleet runs
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the mountN directories are created in [default: /mnt]
    #[arg(long)]
    pub mount_base: Option<PathBuf>,

    /// Fail unless exactly this many addresses are given
    #[arg(long, default_value_t = EXPECTED_MOUNTS)]
    pub expected_mounts: usize,

    /// Accept any number of addresses
    #[arg(long, conflicts_with = "expected_mounts")]
    pub any_mount_count: bool,

    #[command(flatten)]
    pub exec: ExecArgs,
}

pub async fn handle(args: SingleArgs) -> anyhow::Result<()> {
    let name = utils::resolve_hostname(args.host)?;
    let overrides = Overrides {
        mount_base: args.mount_base.clone(),
        total_threads: Some(args.total_threads),
        mount_options: args.exec.mount_options.clone(),
        ips_per_host: None,
    };

    let config = match &args.config {
        Some(path) => {
            fiobalance_config::load(path, SINGLE_HOST_DEFAULT_THREADS, &overrides)
                .context("failed to load configuration")?
        }
        None => {
            let mut raw = RawConfig {
                hosts: vec![name.clone()],
                ip_addresses: args.ips.clone(),
                mount_base: PathBuf::from(DEFAULT_MOUNT_BASE),
                ..Default::default()
            };
            overrides.apply(&mut raw);
            FleetConfig::from_raw(raw, SINGLE_HOST_DEFAULT_THREADS)
                .context("invalid command line configuration")?
        }
    };

    let host = HostIdentity::standalone(name);
    let assignments = plan(&config, &host, &IpSelection::Explicit(args.ips))?;
    if !args.any_mount_count {
        check_mount_count(&assignments, args.expected_mounts)?;
    }

    super::plan_or_execute(&host, assignments, config.mount_options.clone(), &args.exec).await
}
