use crate::commands::CommandStatus;
use crate::core::{
    colors::{format_counts, get_state_badge},
    command_init::FleetContext,
    error::Result,
    output::{print_json, print_section_header},
    state::{CommitInfo, RepoStatus},
};
use colored::*;
use serde::Serialize;

#[derive(Serialize)]
struct StatusReport<'a> {
    #[serde(flatten)]
    status: &'a RepoStatus,
    groups: &'a [String],
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<&'a [CommitInfo]>,
}

/// Show one repository in detail, optionally with its last `history` commits
pub fn execute_status(
    context: &FleetContext,
    name: &str,
    refresh: bool,
    history: Option<usize>,
) -> Result<CommandStatus> {
    let monitor = &context.monitor;
    let handle = monitor.handle(name)?;
    let status = monitor.get_status(&handle, !refresh);
    let groups = context.groups.groups_for_repo(name);
    let tags = context.groups.tags_for_repo(name);

    let commits = match history {
        Some(limit) if !status.is_error() => Some(monitor.commit_history(&handle, limit)?),
        _ => None,
    };

    if context.json {
        print_json(&StatusReport {
            status: &status,
            groups: &groups,
            tags: &tags,
            history: commits.as_deref(),
        })?;
    } else {
        print_status(&status, &groups, &tags);
        if let Some(commits) = &commits {
            print_history(commits);
        }
    }
    Ok(CommandStatus::from_success(!status.is_error()))
}

fn print_status(status: &RepoStatus, groups: &[String], tags: &[String]) {
    print_section_header(&status.name);

    let field = |label: &str, value: String| {
        println!("  {} {}", format!("{label:<10}").bright_black(), value);
    };

    field("state", get_state_badge(status.state).to_string());
    if let Some(error) = &status.error {
        field("error", error.red().to_string());
    }
    field(
        "branch",
        status
            .current_branch
            .clone()
            .unwrap_or_else(|| "-none-".to_string()),
    );
    let counts = format_counts(status.ahead, status.behind);
    if !counts.is_empty() {
        field("upstream", counts);
    }
    field(
        "remote",
        status.remote_url.clone().unwrap_or_else(|| "-none-".to_string()),
    );
    field(
        "changes",
        if status.is_dirty {
            "uncommitted changes".yellow().to_string()
        } else {
            "clean".to_string()
        },
    );
    if let Some(commit) = &status.last_commit {
        field("commit", format_commit(commit));
    }
    if !status.local_branches.is_empty() {
        field("local", status.local_branches.join(", "));
    }
    if !status.remote_branches.is_empty() {
        field("remote br", status.remote_branches.join(", "));
    }
    if !groups.is_empty() {
        field("groups", groups.join(", "));
    }
    if !tags.is_empty() {
        field("tags", tags.join(", "));
    }
    println!();
}

fn print_history(commits: &[CommitInfo]) {
    print_section_header("History");
    for commit in commits {
        println!("  {}", format_commit(commit));
    }
    println!();
}

fn format_commit(commit: &CommitInfo) -> String {
    format!(
        "{} {} {}",
        commit.hash.bright_black(),
        commit.message.white(),
        format!("({}, {})", commit.author, commit.date.format("%Y-%m-%d %H:%M")).bright_black()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_format_commit() {
        colored::control::set_override(false);
        let commit = CommitInfo {
            hash: "abc1234".to_string(),
            message: "Fix pagination".to_string(),
            author: "Dana".to_string(),
            date: DateTime::parse_from_rfc3339("2024-05-01T10:30:00+02:00").unwrap(),
        };
        assert_eq!(
            format_commit(&commit),
            "abc1234 Fix pagination (Dana, 2024-05-01 10:30)"
        );
    }
}
