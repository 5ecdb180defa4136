//! Terminal output helpers shared by the commands.
//!
//! Human-readable output goes through these functions so spacing and colors
//! match across commands. `--json` output skips them and uses [`print_json`].
//! Errors go to stderr, everything else to stdout.

use crate::core::error::Result;
use colored::*;
use serde::Serialize;

/// `✕ Error: <message>` on stderr, padded by blank lines
pub fn print_error(message: &str) {
    eprintln!("\n{} {}\n", "✕ Error:".red(), message.white());
}

/// `✓ <message>`
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green(), message.white());
}

/// `✕ <message>` for one item of a batch; unlike [`print_error`] the command keeps going
pub fn print_failure(message: &str) {
    println!("\n{} {}", "✕".red(), message.white());
}

/// `! <message>` for a batch that only partly succeeded
pub fn print_warning(message: &str) {
    println!("\n{} {}", "!".yellow().bold(), message.white());
}

pub fn print_info(message: &str) {
    println!("\n{}\n", message.white());
}

/// Header line ending in a colon, followed by a blank line
pub fn print_section_header(header: &str) {
    println!("\n{}:\n", header.white().bold());
}

/// Pretty-printed JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
