use crate::commands::CommandStatus;
use crate::core::{
    colors::get_state_badge,
    command_init::FleetContext,
    error::Result,
    output::{
        print_failure, print_info, print_json, print_section_header, print_success, print_warning,
    },
    pull::{BulkPullReport, PullOutcome, PullStrategy},
    state::RepositoryHandle,
};
use colored::*;

/// Pull one repository
pub fn execute_pull(
    context: &FleetContext,
    name: &str,
    strategy: Option<PullStrategy>,
) -> Result<CommandStatus> {
    let handle = context.monitor.handle(name)?;
    let outcome = context.monitor.pull(&handle, strategy);
    if let Err(e) = context.activity.record_pull(&outcome) {
        log::warn!("Could not write activity log: {e}");
    }

    if context.json {
        print_json(&outcome)?;
    } else {
        print_outcome(&outcome);
        println!();
    }
    Ok(CommandStatus::from_success(outcome.success))
}

/// Pull every repository under the base path
pub fn execute_pull_all(
    context: &FleetContext,
    strategy: Option<PullStrategy>,
) -> Result<CommandStatus> {
    let handles = context.monitor.locate_repositories()?;
    run_bulk(context, "pull_all", "all", handles, Vec::new(), strategy)
}

/// Pull the named repositories
pub fn execute_pull_selected(
    context: &FleetContext,
    names: &[String],
    strategy: Option<PullStrategy>,
) -> Result<CommandStatus> {
    let handles = context.monitor.handles(names)?;
    run_bulk(context, "pull_selected", "selected", handles, Vec::new(), strategy)
}

/// Pull every member of a group; members that are missing or do not name a
/// directory under the base path are reported as failures without running git
pub fn execute_pull_group(
    context: &FleetContext,
    group: &str,
    strategy: Option<PullStrategy>,
) -> Result<CommandStatus> {
    let group = context.groups.get(group)?;
    let mut handles = Vec::new();
    let mut rejected = Vec::new();
    for repo in &group.repos {
        match context.monitor.handle(repo) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                log::warn!("Not pulling {repo} from group {}: {e}", group.name);
                rejected.push(PullOutcome::failed(
                    &RepositoryHandle::new(repo.as_str(), context.monitor.base_path()),
                    &e,
                ));
            }
        }
    }
    run_bulk(context, "pull_group", &group.name, handles, rejected, strategy)
}

/// Pull `handles`; `rejected` outcomes are listed after the pulled ones
fn run_bulk(
    context: &FleetContext,
    operation: &str,
    scope: &str,
    handles: Vec<RepositoryHandle>,
    rejected: Vec<PullOutcome>,
    strategy: Option<PullStrategy>,
) -> Result<CommandStatus> {
    if handles.is_empty() && rejected.is_empty() {
        if context.json {
            print_json(&BulkPullReport::from_outcomes(Vec::new()))?;
        } else {
            print_info("No repositories to pull");
        }
        return Ok(CommandStatus::Success);
    }

    let mut report = context.monitor.pull_many(handles, strategy);
    if !rejected.is_empty() {
        let mut outcomes = report.results;
        outcomes.extend(rejected);
        report = BulkPullReport::from_outcomes(outcomes);
    }
    if let Err(e) = context.activity.record_bulk(operation, scope, &report) {
        log::warn!("Could not write activity log: {e}");
    }

    if context.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(CommandStatus::from_success(report.success))
}

fn print_outcome(outcome: &PullOutcome) {
    if outcome.success {
        print_success(&format!("{}: {}", outcome.name.bold(), outcome.message));
        if let Some(status) = &outcome.status {
            println!("  now {}", get_state_badge(status.state));
        }
    } else {
        let kind = outcome
            .error
            .map(|kind| format!(" [{kind}]"))
            .unwrap_or_default();
        print_failure(&format!(
            "{}: {}{}",
            outcome.name.bold(),
            outcome.message,
            kind.bright_black()
        ));
    }
}

fn print_report(report: &BulkPullReport) {
    print_section_header("Pull results");
    for outcome in &report.results {
        print_outcome(outcome);
    }
    println!();

    let summary = report.summary();
    if report.success {
        print_success(&summary);
    } else if report.succeeded > 0 {
        print_warning(&format!("{summary}, {} failed", report.failed));
    } else {
        print_failure(&format!("{summary}, {} failed", report.failed));
    }
    println!();
}
