use crate::commands::CommandStatus;
use crate::core::{
    command_init::GlobalOptions,
    config::Settings,
    error::Result,
    output::{print_json, print_section_header, print_success},
};
use colored::*;
use serde::Serialize;
use std::path::Path;

/// `git-fleet config <action>`
#[derive(Debug, Clone)]
pub enum ConfigAction {
    Show,
    Set { key: String, value: String },
    Reset,
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    file: &'a Path,
    settings: &'a Settings,
}

/// Works on the settings file itself, so `--path` is not applied
pub fn execute_config(options: &GlobalOptions, action: ConfigAction) -> Result<CommandStatus> {
    let file = options.config_file()?;
    let (settings, message) = match action {
        ConfigAction::Show => (Settings::load_or_create(Some(&file))?, None),
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load_or_create(Some(&file))?;
            settings.set(&key, &value)?;
            settings.save_to(&file)?;
            log::info!("Set {key} in {}", file.display());
            (settings, Some(format!("Set {} to {}", key.bold(), value)))
        }
        ConfigAction::Reset => (
            Settings::reset(&file)?,
            Some("Settings reset to defaults".to_string()),
        ),
    };

    if options.json {
        print_json(&ConfigReport {
            file: &file,
            settings: &settings,
        })?;
    } else {
        if let Some(message) = message {
            print_success(&message);
        }
        print_settings(&file, &settings);
    }
    Ok(CommandStatus::Success)
}

fn print_settings(file: &Path, settings: &Settings) {
    print_section_header(&format!("Settings ({})", file.display()));
    let field = |label: &str, value: String| {
        println!("  {} {}", format!("{label:<26}").bright_black(), value);
    };
    field("git_path", settings.git_path.clone());
    field("cache_ttl_seconds", settings.cache_ttl_seconds.to_string());
    field("parallel_workers", settings.parallel_workers.to_string());
    field("batch_size", settings.batch_size.to_string());
    field("git_timeout_seconds", settings.git_timeout_seconds.to_string());
    field(
        "max_activity_log_entries",
        settings.max_activity_log_entries.to_string(),
    );
    field(
        "data_dir",
        settings
            .data_dir
            .as_ref()
            .map_or_else(|| "(platform default)".to_string(), |d| d.display().to_string()),
    );
    println!();
}
