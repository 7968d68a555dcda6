use super::ConfigArgs;
use colored::Colorize;
use fiobalance_config::Overrides;
use fiobalance_core::{DEFAULT_TOTAL_THREADS, HostIdentity, IpSelection, MountState, plan};
use fiobalance_mount::{MountManager, NfsMounter};
use std::sync::Arc;

#[derive(clap::Args, Debug)]
pub struct TeardownArgs {
    #[command(flatten)]
    pub source: ConfigArgs,
}

pub async fn handle(args: TeardownArgs) -> anyhow::Result<()> {
    let config = args
        .source
        .load(DEFAULT_TOTAL_THREADS, Overrides::default())?;

    // every configured mount path, whichever slice this host ran
    let host = HostIdentity::standalone("teardown");
    let selection = config
        .ips_per_host
        .map_or(IpSelection::All, IpSelection::Sliced);
    let assignments = plan(&config, &host, &selection)?;

    let manager = MountManager::new(Arc::new(NfsMounter::new()));
    let mut state = MountState::new();

    println!("{}", "Looking for leftover mounts...".blue());
    for assignment in &assignments {
        match manager.adopt_existing(assignment, &mut state).await {
            Ok(true) => println!(
                "  • {} {}",
                assignment.mount_path.display().to_string().cyan(),
                assignment.export()
            ),
            Ok(false) => {}
            Err(e) => println!("  ⚠ {}: {}", assignment.mount_path.display(), e),
        }
    }

    if state.is_empty() {
        println!("{}", "✓ Nothing to unmount".green());
        return Ok(());
    }

    match manager.unmount_all(&mut state).await {
        Ok(released) => {
            println!(
                "{}",
                format!("✓ Unmounted {} share(s)", released.len()).green().bold()
            );
            Ok(())
        }
        Err(e) => {
            for path in &e.released {
                println!("  ✓ {}", path.display());
            }
            for (path, err) in &e.failures {
                eprintln!("  {} {}: {}", "✗".red(), path.display(), err);
            }
            eprintln!(
                "{}",
                format!("✗ {} mount(s) left in place", e.failures.len()).red().bold()
            );
            std::process::exit(1);
        }
    }
}
