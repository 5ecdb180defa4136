use crate::commands::CommandStatus;
use crate::core::{
    activity::{ActivityEntry, EntryStatus, LogQuery},
    command_init::FleetContext,
    error::Result,
    output::{print_info, print_json, print_section_header},
};
use colored::*;

pub fn execute_activity(context: &FleetContext, query: &LogQuery) -> Result<CommandStatus> {
    let entries = context.activity.get_logs(query);
    if context.json {
        print_json(&entries)?;
        return Ok(CommandStatus::Success);
    }

    if entries.is_empty() {
        print_info("No activity recorded");
        return Ok(CommandStatus::Success);
    }
    print_section_header("Recent activity");
    for entry in &entries {
        println!("  {}", format_entry(entry));
    }
    println!();
    Ok(CommandStatus::Success)
}

fn format_entry(entry: &ActivityEntry) -> String {
    let status = match entry.status {
        EntryStatus::Success => "✓".green(),
        EntryStatus::Error => "✕".red(),
        EntryStatus::Warning => "!".yellow(),
    };
    format!(
        "{} {} {} {} {}",
        entry
            .timestamp
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .bright_black(),
        status,
        entry.operation.bright_black(),
        entry.repo.bold(),
        entry.message.as_deref().unwrap_or("")
    )
}
