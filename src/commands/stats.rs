use crate::commands::{scan::format_summary, CommandStatus};
use crate::core::{
    activity::ActivityStats,
    cache::CacheStats,
    command_init::FleetContext,
    error::Result,
    output::{print_json, print_section_header},
    scan::FleetSummary,
};
use serde::Serialize;

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    fleet: FleetSummary,
    activity: ActivityStats,
    cache: CacheStats,
}

/// Fleet summary, activity totals and cache counters
pub fn execute_stats(context: &FleetContext, refresh: bool) -> Result<CommandStatus> {
    let report = StatsReport {
        fleet: context.monitor.summary(refresh)?,
        activity: context.activity.stats(),
        cache: context.monitor.cache_stats(),
    };

    if context.json {
        print_json(&report)?;
        return Ok(CommandStatus::Success);
    }

    print_section_header("Repositories");
    println!("  {}", format_summary(&report.fleet));

    print_section_header("Activity");
    let activity = &report.activity;
    println!(
        "  {} operations, {} succeeded, {} failed, {} partial ({}% success)",
        activity.total_operations,
        activity.successful,
        activity.failed,
        activity.warnings,
        activity.success_rate
    );
    if let Some(last) = activity.last_activity {
        println!("  last activity {}", last.format("%Y-%m-%d %H:%M:%S"));
    }

    print_section_header("Cache");
    let cache = &report.cache;
    println!(
        "  {} entries, {} hits, {} misses ({}% hit rate), ttl {}s",
        cache.entries, cache.hits, cache.misses, cache.hit_rate, cache.ttl_seconds
    );
    println!();
    Ok(CommandStatus::Success)
}
