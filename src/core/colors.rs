//! Color mapping for sync states and pull results.
//!
//! # Public API
//! - [`get_state_color_style`]: Color function for a sync state
//! - [`get_state_badge`]: Fixed-width colored state label
//! - [`format_counts`]: Ahead/behind counts as `+a/-b`
//! - [`format_repo_line`]: One line of the fleet table
//!
//! # Color Scheme
//! - **Up to date**: Green
//! - **Behind**: Yellow, something to pull
//! - **Ahead**: Cyan
//! - **Diverged**: Red bold, needs an explicit strategy
//! - **No remote / no tracking / unknown**: Muted
//! - **Error**: Red

use crate::core::{state::RepoStatus, sync_state::SyncState};
use colored::*;

const BADGE_WIDTH: usize = 11;

pub fn get_state_color_style(state: SyncState) -> Box<dyn Fn(&str) -> ColoredString> {
    match state {
        SyncState::UpToDate => Box::new(|text: &str| text.green()),
        SyncState::Behind => Box::new(|text: &str| text.yellow()),
        SyncState::Ahead => Box::new(|text: &str| text.cyan()),
        SyncState::Diverged => Box::new(|text: &str| text.red().bold()),
        SyncState::Error => Box::new(|text: &str| text.red()),
        SyncState::NoRemote | SyncState::NoTracking | SyncState::Unknown => {
            Box::new(|text: &str| text.bright_black())
        }
    }
}

/// State label padded to a fixed width so columns line up
pub fn get_state_badge(state: SyncState) -> ColoredString {
    let color_fn = get_state_color_style(state);
    color_fn(&format!("{:<width$}", state.as_str(), width = BADGE_WIDTH))
}

pub fn format_counts(ahead: usize, behind: usize) -> String {
    match (ahead, behind) {
        (0, 0) => String::new(),
        (a, 0) => format!("+{a}"),
        (0, b) => format!("-{b}"),
        (a, b) => format!("+{a}/-{b}"),
    }
}

/// `<state> <name> <branch> <counts> [*]`, with `*` marking uncommitted changes
pub fn format_repo_line(status: &RepoStatus, name_width: usize) -> String {
    let badge = get_state_badge(status.state);
    let name = format!("{:<width$}", status.name, width = name_width);
    let branch = status.current_branch.as_deref().unwrap_or("-");
    let counts = format_counts(status.ahead, status.behind);

    let mut line = format!("{badge} {} {}", name.white().bold(), branch.bright_black());
    if !counts.is_empty() {
        line.push_str(&format!(" {}", get_state_color_style(status.state)(&counts)));
    }
    if status.is_dirty {
        line.push_str(&format!(" {}", "*".yellow()));
    }
    if let Some(error) = &status.error {
        line.push_str(&format!(" {}", error.red()));
    }
    line
}
