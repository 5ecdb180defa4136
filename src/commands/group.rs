use crate::commands::CommandStatus;
use crate::core::{
    command_init::FleetContext,
    error::{GitFleetError, Result},
    groups::{Group, GroupUpdate},
    output::{print_info, print_json, print_section_header, print_success},
};
use colored::*;

/// `git-fleet group <action>`
#[derive(Debug, Clone)]
pub enum GroupAction {
    List,
    Create {
        name: String,
        repos: Vec<String>,
        color: Option<String>,
    },
    /// Rename, recolor or replace the members
    Update {
        group: String,
        changes: GroupUpdate,
    },
    Delete {
        group: String,
    },
    Add {
        group: String,
        repos: Vec<String>,
    },
    Remove {
        group: String,
        repos: Vec<String>,
    },
}

pub fn execute_group(context: &FleetContext, action: GroupAction) -> Result<CommandStatus> {
    let groups = &context.groups;
    match action {
        GroupAction::List => {
            let all = groups.list();
            if context.json {
                print_json(&all)?;
            } else if all.is_empty() {
                print_info("No groups defined");
            } else {
                print_section_header("Groups");
                for group in &all {
                    println!("  {}", format_group(group));
                }
                println!();
            }
        }
        GroupAction::Create { name, repos, color } => {
            // members must exist when the group is created
            context.monitor.handles(&repos)?;
            let group = groups.create(&name, repos, color)?;
            if context.json {
                print_json(&group)?;
            } else {
                print_success(&format!("Created group {} ({})", group.name.bold(), group.id));
                println!();
            }
        }
        GroupAction::Update { group, changes } => {
            if changes.is_empty() {
                return Err(GitFleetError::config_error(
                    "Nothing to update: pass --name, --color or --repos",
                ));
            }
            if let Some(repos) = &changes.repos {
                context.monitor.handles(repos)?;
            }
            let updated = groups.update(&group, changes)?;
            if context.json {
                print_json(&updated)?;
            } else {
                print_success(&format!("Updated {}", format_group(&updated)));
                println!();
            }
        }
        GroupAction::Delete { group } => {
            let removed = groups.delete(&group)?;
            if context.json {
                print_json(&removed)?;
            } else {
                print_success(&format!("Deleted group {}", removed.name.bold()));
                println!();
            }
        }
        GroupAction::Add { group, repos } => {
            context.monitor.handles(&repos)?;
            for repo in &repos {
                if !groups.add_repo(&group, repo)? {
                    log::info!("{repo} is already in {group}");
                }
            }
            report_group(context, &group)?;
        }
        GroupAction::Remove { group, repos } => {
            for repo in &repos {
                if !groups.remove_repo(&group, repo)? {
                    log::info!("{repo} is not in {group}");
                }
            }
            report_group(context, &group)?;
        }
    }
    Ok(CommandStatus::Success)
}

fn report_group(context: &FleetContext, group: &str) -> Result<()> {
    let group = context.groups.get(group)?;
    if context.json {
        print_json(&group)
    } else {
        print_success(&format_group(&group));
        println!();
        Ok(())
    }
}

fn format_group(group: &Group) -> String {
    let members = if group.repos.is_empty() {
        "(empty)".bright_black().to_string()
    } else {
        group.repos.join(", ")
    };
    format!(
        "{} {} {}",
        group.name.bold(),
        format!("[{}]", group.id).bright_black(),
        members
    )
}
