use crate::commands::CommandStatus;
use crate::core::{
    colors::format_repo_line,
    command_init::FleetContext,
    error::Result,
    output::{print_info, print_json, print_section_header},
    scan::FleetSummary,
    state::RepoStatus,
    sync_state::SyncState,
};
use colored::*;

/// Arguments of `git-fleet scan`
#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    /// Ignore cached statuses
    pub refresh: bool,
    /// Scan only this zero-based page
    pub batch: Option<usize>,
    pub batch_size: Option<usize>,
    /// Show only repositories in these states
    pub states: Vec<SyncState>,
}

pub fn execute_scan(context: &FleetContext, args: &ScanArgs) -> Result<CommandStatus> {
    let monitor = &context.monitor;

    if let Some(batch) = args.batch {
        let mut page = monitor.scan_page(batch, args.batch_size, args.refresh)?;
        page.repos.retain(|status| matches_filter(status, &args.states));
        if context.json {
            print_json(&page)?;
        } else {
            print_table(
                &format!(
                    "Batch {} ({} of {} repositories loaded)",
                    page.batch, page.loaded, page.total
                ),
                &page.repos,
            );
            if page.has_more {
                print_info(&format!(
                    "More repositories available; run with --batch {}",
                    batch + 1
                ));
            }
        }
        return Ok(CommandStatus::Success);
    }

    let statuses = monitor.scan_all(args.refresh)?;
    let summary = FleetSummary::from_statuses(&statuses);
    let shown: Vec<RepoStatus> = statuses
        .into_iter()
        .filter(|status| matches_filter(status, &args.states))
        .collect();

    if context.json {
        print_json(&shown)?;
        return Ok(CommandStatus::Success);
    }

    if shown.is_empty() {
        print_info(&format!(
            "No repositories found in {}",
            monitor.base_path().display()
        ));
        return Ok(CommandStatus::Success);
    }
    print_table(
        &format!("Repositories in {}", monitor.base_path().display()),
        &shown,
    );
    println!("\n{}\n", format_summary(&summary));
    Ok(CommandStatus::Success)
}

fn matches_filter(status: &RepoStatus, states: &[SyncState]) -> bool {
    states.is_empty() || states.contains(&status.state)
}

pub(crate) fn print_table(header: &str, statuses: &[RepoStatus]) {
    print_section_header(header);
    let width = statuses.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for status in statuses {
        println!("  {}", format_repo_line(status, width));
    }
}

/// One-line tally, e.g. `12 repositories: 9 up_to_date, 2 behind, 1 diverged`
pub fn format_summary(summary: &FleetSummary) -> String {
    let counts: Vec<String> = summary
        .status_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(state, count)| format!("{count} {state}"))
        .collect();
    let mut line = format!(
        "{} repositories: {}",
        summary.total_repos.to_string().white().bold(),
        counts.join(", ")
    );
    if summary.repos_with_changes > 0 {
        line.push_str(&format!(
            " ({} with uncommitted changes)",
            summary.repos_with_changes
        ));
    }
    line
}
