//! Allocation planner
//!
//! Maps `(FleetConfig, HostIdentity, IpSelection)` to the ordered list of
//! mount assignments this invocation is responsible for. Pure and
//! deterministic: the same inputs always yield the same plan on every host.

use crate::config::FleetConfig;
use crate::error::{PlanResult, PlanningError};
use crate::model::{EXPORT_PREFIX, HostIdentity, MountAssignment, is_valid_host_name};
use std::collections::HashSet;

/// Which of the configured addresses this invocation exercises
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSelection {
    /// Every configured address (fleet mode)
    All,
    /// A contiguous slice of `n` addresses chosen by the host's fleet index
    PerHost(usize),
    /// Every address, with shares numbered as `PerHost(n)` numbers them
    Sliced(usize),
    /// Exactly these addresses (single-host mode)
    Explicit(Vec<String>),
}

/// Split `total` threads over `count` mount points.
///
/// The first `total % count` mount points absorb the remainder, so the sum
/// always equals `total`.
pub fn distribute_threads(total: u32, count: usize) -> PlanResult<Vec<u32>> {
    if count == 0 {
        return Err(PlanningError::NoAddresses {
            host: String::new(),
        });
    }
    if (total as usize) < count {
        return Err(PlanningError::InsufficientThreads {
            total,
            mounts: count,
        });
    }

    let base = total / count as u32;
    let remainder = (total % count as u32) as usize;
    Ok((0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// Compute the assignments for one host
pub fn plan(
    config: &FleetConfig,
    host: &HostIdentity,
    selection: &IpSelection,
) -> PlanResult<Vec<MountAssignment>> {
    if !is_valid_host_name(&host.name) {
        return Err(PlanningError::InvalidHostName(host.name.clone()));
    }

    let selected = select(config, host, selection)?;
    if selected.is_empty() {
        return Err(PlanningError::NoAddresses {
            host: host.name.clone(),
        });
    }

    let threads = distribute_threads(config.total_threads, selected.len())?;

    let assignments: Vec<MountAssignment> = selected
        .into_iter()
        .zip(threads)
        .map(|(Selected { number, share, ip }, threads)| {
            let mount_path = config
                .mount_base
                .join(format!("{}{}", EXPORT_PREFIX, number));
            let working_directory = mount_path.join(&host.name);
            MountAssignment {
                number,
                share,
                ip,
                mount_path,
                working_directory,
                threads,
            }
        })
        .collect();

    tracing::debug!(
        host = %host,
        mounts = assignments.len(),
        total_threads = config.total_threads,
        "plan computed"
    );

    Ok(assignments)
}

/// Validate an expected mount count (single-host invocations conventionally use 8)
pub fn check_mount_count(assignments: &[MountAssignment], expected: usize) -> PlanResult<()> {
    if assignments.len() != expected {
        return Err(PlanningError::MountCountMismatch {
            expected,
            actual: assignments.len(),
        });
    }
    Ok(())
}

struct Selected {
    number: usize,
    share: usize,
    ip: String,
}

/// Resolve the selection to addresses in input order
fn select(
    config: &FleetConfig,
    host: &HostIdentity,
    selection: &IpSelection,
) -> PlanResult<Vec<Selected>> {
    match selection {
        IpSelection::All => Ok(config
            .ip_addresses
            .iter()
            .enumerate()
            .map(|(i, ip)| Selected {
                number: i + 1,
                share: i + 1,
                ip: ip.clone(),
            })
            .collect()),
        IpSelection::Sliced(per_host) => Ok(config
            .ip_addresses
            .iter()
            .enumerate()
            .map(|(i, ip)| Selected {
                number: i + 1,
                share: i % (*per_host).max(1) + 1,
                ip: ip.clone(),
            })
            .collect()),
        IpSelection::PerHost(per_host) => {
            let index = host
                .index
                .ok_or_else(|| PlanningError::MissingFleetIndex(host.name.clone()))?;
            let start = index.saturating_mul(*per_host);
            Ok(config
                .ip_addresses
                .iter()
                .enumerate()
                .skip(start)
                .take(*per_host)
                .enumerate()
                .map(|(slot, (i, ip))| Selected {
                    number: i + 1,
                    share: slot + 1,
                    ip: ip.clone(),
                })
                .collect())
        }
        IpSelection::Explicit(ips) => {
            let mut seen = HashSet::with_capacity(ips.len());
            ips.iter()
                .map(|ip| {
                    if !seen.insert(ip.as_str()) {
                        return Err(PlanningError::DuplicateAddress(ip.clone()));
                    }
                    let number = config
                        .mount_number(ip)
                        .ok_or_else(|| PlanningError::UnknownAddress(ip.clone()))?;
                    Ok(Selected {
                        number,
                        share: number,
                        ip: ip.clone(),
                    })
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_TOTAL_THREADS, RawConfig};
    use std::path::PathBuf;

    fn fleet(hosts: usize, ips: usize, total_threads: Option<i64>) -> FleetConfig {
        FleetConfig::from_raw(
            RawConfig {
                hosts: (1..=hosts).map(|i| format!("client{i:02}")).collect(),
                ip_addresses: (1..=ips).map(|i| format!("10.10.0.{i}")).collect(),
                mount_base: PathBuf::from("/mnt"),
                total_threads,
                ..Default::default()
            },
            DEFAULT_TOTAL_THREADS,
        )
        .unwrap()
    }

    #[test]
    fn test_distribution_conserves_total() {
        for count in 1..=16usize {
            for total in (count as u32)..=(count as u32 * 3 + 7) {
                let threads = distribute_threads(total, count).unwrap();
                assert_eq!(threads.len(), count);
                assert_eq!(threads.iter().sum::<u32>(), total, "{total} over {count}");
                let max = *threads.iter().max().unwrap();
                let min = *threads.iter().min().unwrap();
                assert!(max - min <= 1);
            }
        }
        let threads = distribute_threads(8192, 8).unwrap();
        assert_eq!(threads, vec![1024; 8]);
    }

    #[test]
    fn test_remainder_goes_to_first_mounts() {
        let config = fleet(1, 8, Some(79 * 8 + 3));
        let host = HostIdentity::in_fleet(&config, "client01").unwrap();
        let assignments = plan(&config, &host, &IpSelection::All).unwrap();

        let threads: Vec<u32> = assignments.iter().map(|a| a.threads).collect();
        assert_eq!(threads, vec![80, 80, 80, 79, 79, 79, 79, 79]);
        assert_eq!(threads.iter().sum::<u32>(), 79 * 8 + 3);
    }

    #[test]
    fn test_zero_addresses_is_a_planning_error() {
        assert!(matches!(
            distribute_threads(100, 0),
            Err(PlanningError::NoAddresses { .. })
        ));

        let config = fleet(1, 4, None);
        let host = HostIdentity::in_fleet(&config, "client01").unwrap();
        assert_eq!(
            plan(&config, &host, &IpSelection::Explicit(vec![])),
            Err(PlanningError::NoAddresses {
                host: "client01".into()
            })
        );
    }

    #[test]
    fn test_fewer_threads_than_mounts() {
        let config = fleet(1, 8, Some(5));
        let host = HostIdentity::in_fleet(&config, "client01").unwrap();
        assert_eq!(
            plan(&config, &host, &IpSelection::All),
            Err(PlanningError::InsufficientThreads {
                total: 5,
                mounts: 8
            })
        );
    }

    #[test]
    fn test_fleet_mode_every_host_gets_full_plan() {
        let config = fleet(3, 8, Some(632));
        for name in &config.hosts {
            let host = HostIdentity::in_fleet(&config, name).unwrap();
            let assignments = plan(&config, &host, &IpSelection::All).unwrap();
            assert_eq!(assignments.len(), 8);
            assert!(assignments.iter().all(|a| a.threads == 79));
            for (i, a) in assignments.iter().enumerate() {
                assert_eq!(a.number, i + 1);
                assert_eq!(a.mount_path, PathBuf::from(format!("/mnt/mount{}", i + 1)));
                assert_eq!(a.working_directory, a.mount_path.join(name));
            }
        }
    }

    #[test]
    fn test_single_host_1024_threads() {
        let config = fleet(1, 8, Some(1024));
        let host = HostIdentity::standalone("client01");
        let ips = config.ip_addresses.clone();
        let assignments = plan(&config, &host, &IpSelection::Explicit(ips)).unwrap();

        assert_eq!(assignments.len(), 8);
        assert!(assignments.iter().all(|a| a.threads == 128));
        let labels: Vec<String> = assignments.iter().map(|a| a.label()).collect();
        assert_eq!(
            labels,
            (1..=8).map(|i| format!("mount{i}")).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_mount_numbering_is_stable_for_subsets() {
        let config = fleet(2, 8, Some(100));
        let host = HostIdentity::standalone("client02");
        let subset = vec!["10.10.0.6".to_string(), "10.10.0.2".to_string()];
        let assignments = plan(&config, &host, &IpSelection::Explicit(subset)).unwrap();

        assert_eq!(assignments[0].number, 6);
        assert_eq!(assignments[0].mount_path, PathBuf::from("/mnt/mount6"));
        assert_eq!(assignments[0].threads, 50);
        assert_eq!(assignments[1].number, 2);
        assert_eq!(assignments[1].mount_path, PathBuf::from("/mnt/mount2"));
    }

    #[test]
    fn test_explicit_selection_validation() {
        let config = fleet(1, 4, None);
        let host = HostIdentity::standalone("client01");

        assert_eq!(
            plan(
                &config,
                &host,
                &IpSelection::Explicit(vec!["192.168.1.1".into()])
            ),
            Err(PlanningError::UnknownAddress("192.168.1.1".into()))
        );
        assert_eq!(
            plan(
                &config,
                &host,
                &IpSelection::Explicit(vec!["10.10.0.1".into(), "10.10.0.1".into()])
            ),
            Err(PlanningError::DuplicateAddress("10.10.0.1".into()))
        );
    }

    #[test]
    fn test_working_directories_differ_only_by_host() {
        let config = fleet(3, 8, Some(632));
        let a = plan(
            &config,
            &HostIdentity::in_fleet(&config, "client01").unwrap(),
            &IpSelection::All,
        )
        .unwrap();
        let b = plan(
            &config,
            &HostIdentity::in_fleet(&config, "client02").unwrap(),
            &IpSelection::All,
        )
        .unwrap();

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.mount_path, y.mount_path);
            assert_ne!(x.working_directory, y.working_directory);
            assert_eq!(x.working_directory.parent(), y.working_directory.parent());
            assert_eq!(x.working_directory.file_name().unwrap(), "client01");
            assert_eq!(y.working_directory.file_name().unwrap(), "client02");
        }
    }

    #[test]
    fn test_per_host_partitioning() {
        let config = fleet(3, 24, Some(632));
        let host = HostIdentity::in_fleet(&config, "client02").unwrap();
        let assignments = plan(&config, &host, &IpSelection::PerHost(8)).unwrap();

        assert_eq!(assignments.len(), 8);
        assert_eq!(assignments[0].ip, "10.10.0.9");
        assert_eq!(assignments[0].number, 9);
        assert_eq!(assignments[7].ip, "10.10.0.16");
        assert_eq!(assignments.iter().map(|a| a.threads).sum::<u32>(), 632);
    }

    #[test]
    fn test_per_host_slices_export_shares_from_one() {
        let config = fleet(2, 16, Some(632));
        let host = HostIdentity::in_fleet(&config, "client02").unwrap();
        let assignments = plan(&config, &host, &IpSelection::PerHost(8)).unwrap();

        assert_eq!(assignments[0].export(), "10.10.0.9:/mount1");
        assert_eq!(assignments[0].mount_path, PathBuf::from("/mnt/mount9"));
        assert_eq!(assignments[7].export(), "10.10.0.16:/mount8");
        assert_eq!(assignments[7].mount_path, PathBuf::from("/mnt/mount16"));

        let all = plan(&config, &host, &IpSelection::All).unwrap();
        assert_eq!(all[8].export(), "10.10.0.9:/mount9");

        let sliced = plan(&config, &HostIdentity::standalone("any"), &IpSelection::Sliced(8))
            .unwrap();
        let same: Vec<String> = sliced[8..].iter().map(|a| a.export()).collect();
        let ran: Vec<String> = assignments.iter().map(|a| a.export()).collect();
        assert_eq!(same, ran);

        let subset = IpSelection::Explicit(vec!["10.10.0.12".into()]);
        let explicit = plan(&config, &host, &subset).unwrap();
        assert_eq!(explicit[0].export(), "10.10.0.12:/mount12");
    }

    #[test]
    fn test_host_name_escaping_the_share_is_rejected() {
        let config = fleet(1, 8, None);
        for bad in ["../escape", "a/b", ".."] {
            let host = HostIdentity::standalone(bad);
            assert_eq!(
                plan(&config, &host, &IpSelection::All),
                Err(PlanningError::InvalidHostName(bad.into()))
            );
        }
    }

    #[test]
    fn test_per_host_partitioning_edge_cases() {
        let config = fleet(3, 10, Some(64));

        let last = HostIdentity::in_fleet(&config, "client02").unwrap();
        let assignments = plan(&config, &last, &IpSelection::PerHost(8)).unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].threads, 32);

        let beyond = HostIdentity::in_fleet(&config, "client03").unwrap();
        assert_eq!(
            plan(&config, &beyond, &IpSelection::PerHost(8)),
            Err(PlanningError::NoAddresses {
                host: "client03".into()
            })
        );

        let solo = HostIdentity::standalone("client01");
        assert_eq!(
            plan(&config, &solo, &IpSelection::PerHost(8)),
            Err(PlanningError::MissingFleetIndex("client01".into()))
        );
    }

    #[test]
    fn test_expected_mount_count() {
        let config = fleet(1, 8, None);
        let host = HostIdentity::standalone("client01");
        let assignments = plan(&config, &host, &IpSelection::All).unwrap();
        assert!(check_mount_count(&assignments, 8).is_ok());
        assert_eq!(
            check_mount_count(&assignments[..5], 8),
            Err(PlanningError::MountCountMismatch {
                expected: 8,
                actual: 5
            })
        );
    }
}
