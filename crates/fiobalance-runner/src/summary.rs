//! fio `--output-format=json` summary parsing

use fiobalance_core::ThroughputSummary;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FioReport {
    #[serde(default)]
    jobs: Vec<FioJob>,
}

#[derive(Debug, Deserialize)]
struct FioJob {
    #[serde(default)]
    read: FioDirection,
    #[serde(default)]
    write: FioDirection,
}

#[derive(Debug, Default, Deserialize)]
struct FioDirection {
    #[serde(default)]
    iops: f64,
    /// KiB/s
    #[serde(default)]
    bw: u64,
    #[serde(default)]
    lat_ns: FioLatency,
}

#[derive(Debug, Default, Deserialize)]
struct FioLatency {
    #[serde(default)]
    mean: f64,
}

/// Parse fio's JSON report.
///
/// fio may print notes before the document, so parsing starts at the first
/// `{`. Jobs are summed; mean latency is weighted by IOPS.
pub fn parse_summary(output: &str) -> Option<ThroughputSummary> {
    let start = output.find('{')?;
    let report: FioReport = match serde_json::from_str(&output[start..]) {
        Ok(report) => report,
        Err(e) => {
            tracing::debug!(error = %e, "could not parse fio JSON output");
            return None;
        }
    };
    if report.jobs.is_empty() {
        return None;
    }

    let (read_iops, read_bw_kib, read_lat_mean_ns) =
        aggregate(report.jobs.iter().map(|j| &j.read));
    let (write_iops, write_bw_kib, write_lat_mean_ns) =
        aggregate(report.jobs.iter().map(|j| &j.write));

    Some(ThroughputSummary {
        read_iops,
        read_bw_kib,
        read_lat_mean_ns,
        write_iops,
        write_bw_kib,
        write_lat_mean_ns,
    })
}

fn aggregate<'a>(directions: impl Iterator<Item = &'a FioDirection>) -> (f64, u64, f64) {
    let mut iops = 0.0;
    let mut bw = 0;
    let mut weighted_lat = 0.0;
    for d in directions {
        iops += d.iops;
        bw += d.bw;
        weighted_lat += d.lat_ns.mean * d.iops;
    }
    let lat = if iops > 0.0 { weighted_lat / iops } else { 0.0 };
    (iops, bw, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = r#"note: both iodepth >= 1 and synchronous I/O engine are selected
{
  "fio version" : "fio-3.35",
  "jobs" : [
    {
      "jobname" : "mount1",
      "groupid" : 0,
      "error" : 0,
      "read" : { "io_bytes" : 1073741824, "bw" : 409600, "iops" : 200.0, "lat_ns" : { "min" : 1, "max" : 9, "mean" : 1000.0 } },
      "write" : { "io_bytes" : 536870912, "bw" : 204800, "iops" : 100.0, "lat_ns" : { "mean" : 3000.0 } }
    },
    {
      "jobname" : "mount1",
      "read" : { "bw" : 102400, "iops" : 50.0, "lat_ns" : { "mean" : 2000.0 } },
      "write" : { "bw" : 0, "iops" : 0.0, "lat_ns" : { "mean" : 0.0 } }
    }
  ]
}
"#;

    #[test]
    fn test_parse_sums_jobs_and_weights_latency() {
        let summary = parse_summary(OUTPUT).unwrap();
        assert_eq!(summary.read_iops, 250.0);
        assert_eq!(summary.read_bw_kib, 512000);
        // (200 * 1000 + 50 * 2000) / 250
        assert_eq!(summary.read_lat_mean_ns, 1200.0);
        assert_eq!(summary.write_iops, 100.0);
        assert_eq!(summary.write_bw_kib, 204800);
        assert_eq!(summary.write_lat_mean_ns, 3000.0);
        assert_eq!(summary.total_bw_kib(), 716800);
    }

    #[test]
    fn test_missing_direction_defaults_to_zero() {
        let summary = parse_summary(r#"{"jobs":[{"read":{"bw":10,"iops":5.0}}]}"#).unwrap();
        assert_eq!(summary.read_bw_kib, 10);
        assert_eq!(summary.read_lat_mean_ns, 0.0);
        assert_eq!(summary.write_iops, 0.0);
    }

    #[test]
    fn test_unparseable_output() {
        assert_eq!(parse_summary(""), None);
        assert_eq!(parse_summary("fio: no jobs defined"), None);
        assert_eq!(parse_summary("{ truncated"), None);
        assert_eq!(parse_summary(r#"{"jobs":[]}"#), None);
    }
}
