use super::{ConfigArgs, ExecArgs};
use crate::utils;
use clap::Args;
use fiobalance_config::Overrides;
use fiobalance_core::{DEFAULT_TOTAL_THREADS, IpSelection, plan};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigArgs,

    /// This host's name (defaults to the system hostname)
    #[arg(long, env = "FIO_BALANCER_HOST")]
    pub host: Option<String>,

    /// Thread budget split over the mount points [default: 8192]
    #[arg(short = 't', long)]
    pub total_threads: Option<u32>,

    /// Give each host its own slice of N addresses instead of all of them
    #[arg(long)]
    pub ips_per_host: Option<usize>,

    #[command(flatten)]
    pub exec: ExecArgs,
}

pub async fn handle(args: RunArgs) -> anyhow::Result<()> {
    let overrides = Overrides {
        total_threads: args.total_threads,
        mount_options: args.exec.mount_options.clone(),
        ips_per_host: args.ips_per_host,
        ..Default::default()
    };
    let config = args.source.load(DEFAULT_TOTAL_THREADS, overrides)?;

    let name = utils::resolve_hostname(args.host)?;
    let host = utils::fleet_identity(&config, &name)?;

    let selection = match config.ips_per_host {
        Some(n) => IpSelection::PerHost(n),
        None => IpSelection::All,
    };
    let assignments = plan(&config, &host, &selection)?;

    super::plan_or_execute(&host, assignments, config.mount_options.clone(), &args.exec).await
}
