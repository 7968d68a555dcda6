use anyhow::Context;
use fiobalance_core::{FleetConfig, HostIdentity};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// `--host`/`FIO_BALANCER_HOST`, or the system hostname
pub fn resolve_hostname(explicit: Option<String>) -> anyhow::Result<String> {
    if let Some(name) = explicit {
        return Ok(name);
    }
    let name = nix::unistd::gethostname().context("failed to read the system hostname")?;
    name.into_string()
        .map_err(|raw| anyhow::anyhow!("hostname is not valid UTF-8: {:?}", raw))
}

/// Identify this host in the fleet, accepting the short form of a
/// fully-qualified hostname
pub fn fleet_identity(config: &FleetConfig, name: &str) -> anyhow::Result<HostIdentity> {
    if config.host_index(name).is_none()
        && let Some((short, _)) = name.split_once('.')
        && config.host_index(short).is_some()
    {
        return Ok(HostIdentity::in_fleet(config, short)?);
    }
    Ok(HostIdentity::in_fleet(config, name)?)
}

/// Token cancelled on SIGINT, SIGTERM or SIGHUP
pub fn cancel_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        tracing::warn!("interrupt received; stopping benchmarks and unmounting");
        trigger.cancel();
    });
    token
}

/// Resolves on the first shutdown signal; SIGHUP covers a dropped
/// launcher session
async fn wait_for_shutdown() {
    let mut terminate = listen(SignalKind::terminate(), "SIGTERM");
    let mut hangup = listen(SignalKind::hangup(), "SIGHUP");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = recv(terminate.as_mut()) => {}
        _ = recv(hangup.as_mut()) => {}
    }
}

fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
    signal(kind)
        .map_err(|e| tracing::warn!(error = %e, "cannot listen for {}", name))
        .ok()
}

async fn recv(signal: Option<&mut Signal>) {
    match signal {
        Some(signal) => {
            signal.recv().await;
        }
        None => std::future::pending().await,
    }
}
