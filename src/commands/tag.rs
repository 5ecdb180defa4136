use crate::commands::CommandStatus;
use crate::core::{
    command_init::FleetContext,
    error::Result,
    output::{print_info, print_json, print_section_header, print_success},
};
use colored::*;
use serde::Serialize;

/// `git-fleet tag <action>`
#[derive(Debug, Clone)]
pub enum TagAction {
    /// Every tag in use, or the tags of one repository
    List { repo: Option<String> },
    Add { repo: String, tags: Vec<String> },
    Remove { repo: String, tags: Vec<String> },
}

#[derive(Serialize)]
struct RepoTags<'a> {
    repo: &'a str,
    tags: Vec<String>,
}

pub fn execute_tag(context: &FleetContext, action: TagAction) -> Result<CommandStatus> {
    let groups = &context.groups;
    match action {
        TagAction::List { repo: None } => {
            let tags = groups.all_tags();
            if context.json {
                print_json(&tags)?;
            } else if tags.is_empty() {
                print_info("No tags defined");
            } else {
                print_section_header("Tags");
                println!("  {}\n", tags.join(", "));
            }
        }
        TagAction::List { repo: Some(repo) } => report_tags(context, &repo)?,
        TagAction::Add { repo, tags } => {
            context.monitor.handle(&repo)?;
            for tag in &tags {
                if !groups.add_tag(&repo, tag)? {
                    log::info!("{repo} is already tagged {tag}");
                }
            }
            report_tags(context, &repo)?;
        }
        // the repository may be gone already; its tags can still be dropped
        TagAction::Remove { repo, tags } => {
            for tag in &tags {
                if !groups.remove_tag(&repo, tag)? {
                    log::info!("{repo} is not tagged {tag}");
                }
            }
            report_tags(context, &repo)?;
        }
    }
    Ok(CommandStatus::Success)
}

fn report_tags(context: &FleetContext, repo: &str) -> Result<()> {
    let tags = context.groups.tags_for_repo(repo);
    if context.json {
        return print_json(&RepoTags { repo, tags });
    }
    if tags.is_empty() {
        print_info(&format!("{repo} has no tags"));
    } else {
        print_success(&format!("{} {}", repo.bold(), tags.join(", ")));
        println!();
    }
    Ok(())
}
