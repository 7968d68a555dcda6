use colored::Colorize;
use fiobalance_core::{AssignmentState, HostIdentity, JobResult, MountAssignment};
use fiobalance_runner::RunReport;
use serde::Serialize;

#[derive(Serialize)]
struct PlanView<'a> {
    host: &'a HostIdentity,
    total_threads: u64,
    mount_options: Option<&'a str>,
    assignments: &'a [MountAssignment],
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_plan(
    host: &HostIdentity,
    assignments: &[MountAssignment],
    mount_options: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let total_threads: u64 = assignments.iter().map(|a| u64::from(a.threads)).sum();
    if json {
        return print_json(&PlanView {
            host,
            total_threads,
            mount_options,
            assignments,
        });
    }

    println!("{}", "Plan (dry run)".blue().bold());
    println!("Host: {}", host.to_string().cyan());
    if let Some(options) = mount_options {
        println!("Mount options: {}", options);
    }
    println!();
    println!(
        "{}",
        format!(
            "Mount points ({}, {} threads):",
            assignments.len(),
            total_threads
        )
        .bold()
    );
    for a in assignments {
        println!(
            "  • {} {} -> {}  {} threads  dir {}",
            a.label().cyan(),
            a.export(),
            a.mount_path.display(),
            a.threads,
            a.working_directory.display()
        );
    }
    Ok(())
}

pub fn print_report(report: &RunReport) {
    println!();
    println!("{}", format!("Results for {}", report.host).bold());
    for result in &report.results {
        print_result(result);
    }

    if !report.teardown_failures.is_empty() {
        println!();
        println!("{}", "Teardown:".yellow().bold());
        for failure in &report.teardown_failures {
            println!("  ⚠ {}: {}", failure.path.display(), failure.error);
        }
    }

    println!();
    let elapsed = report.elapsed().num_seconds();
    let line = format!(
        "{}/{} completed, {} threads, {} MiB/s aggregate, {}s",
        report.completed(),
        report.results.len(),
        report.total_threads(),
        report.total_bw_kib() / 1024,
        elapsed
    );
    if report.is_success() {
        println!("{} {}", "✓".green().bold(), line.green());
    } else {
        println!("{} {}", "✗".red().bold(), line.red());
    }
}

fn print_result(result: &JobResult) {
    let a = &result.assignment;
    let mark = match result.state {
        AssignmentState::Completed => "✓".green(),
        AssignmentState::Interrupted => "⚠".yellow(),
        _ => "✗".red(),
    };
    let mut line = format!(
        "  {} {} {} {} threads",
        mark,
        a.label().cyan(),
        result.state,
        a.threads
    );
    if let Some(summary) = &result.summary {
        line.push_str(&format!(
            "  read {} KiB/s  write {} KiB/s  {:.0} IOPS",
            summary.read_bw_kib,
            summary.write_bw_kib,
            summary.total_iops()
        ));
    }
    if result.mounted_here && !result.released {
        line.push_str(&format!("  {}", "(still mounted)".yellow()));
    }
    println!("{}", line);
    if let Some(error) = &result.error {
        println!("      {}", error.dimmed());
    }
}
