use git_fleet::{ErrorKind, PullStrategy, RepoMonitor, SyncState};
use std::time::Duration;

mod common;
use common::{assertions::*, fixtures::*, repository::*};

fn monitor(fleet: &TestFleet) -> RepoMonitor {
    RepoMonitor::new(&fleet.base, Duration::from_secs(600), Duration::from_secs(30))
        .with_concurrency(4)
}

#[cfg(test)]
mod pull_tests {
    use super::*;

    #[test]
    fn test_behind_repo_fast_forwards_with_default_strategy() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        behind_repo(&fleet, "A")?;
        let monitor = monitor(&fleet);
        let handle = monitor.handle("A")?;

        assert_state(&monitor.get_status(&handle, true), SyncState::Behind, 0, 3);

        let outcome = monitor.pull(&handle, None);
        assert!(outcome.success, "pull failed: {}", outcome.message);
        assert_eq!(outcome.strategy, Some(PullStrategy::Merge));
        assert_eq!(outcome.updates, 3);

        let status = outcome.status.expect("successful pull carries a status");
        assert_state(&status, SyncState::UpToDate, 0, 0);

        // fast-forward: no merge commit, HEAD equals the upstream tip
        assert_eq!(head(&fleet.repo_path("A"))?, head(&fleet.seed_path("A"))?);
        Ok(())
    }

    #[test]
    fn test_pull_refreshes_cached_status() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        behind_repo(&fleet, "A")?;
        let monitor = monitor(&fleet);
        let handle = monitor.handle("A")?;

        assert_eq!(monitor.get_status(&handle, true).state, SyncState::Behind);
        assert!(monitor.pull(&handle, None).success);

        let cached = monitor.get_status(&handle, true);
        assert_state(&cached, SyncState::UpToDate, 0, 0);
        Ok(())
    }

    #[test]
    fn test_up_to_date_pull_is_trivial() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        up_to_date_repo(&fleet, "D")?;
        let monitor = monitor(&fleet);
        let before = head(&fleet.repo_path("D"))?;

        let outcome = monitor.pull(&monitor.handle("D")?, Some(PullStrategy::Rebase));
        assert!(outcome.success);
        assert_eq!(outcome.strategy, None);
        assert_eq!(outcome.updates, 0);
        assert_state(&outcome.status.expect("status"), SyncState::UpToDate, 0, 0);
        assert_eq!(head(&fleet.repo_path("D"))?, before);
        Ok(())
    }

    #[test]
    fn test_ahead_only_pull_does_nothing() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        ahead_repo(&fleet, "E")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("E")?, None);
        assert!(outcome.success);
        assert_eq!(outcome.strategy, None);
        assert_state(&outcome.status.expect("status"), SyncState::Ahead, 1, 0);
        Ok(())
    }

    #[test]
    fn test_diverged_without_strategy_is_refused() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        diverged_repo(&fleet, "B")?;
        let monitor = monitor(&fleet);
        let before = head(&fleet.repo_path("B"))?;

        let outcome = monitor.pull(&monitor.handle("B")?, None);
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::UnknownStrategyError));
        assert!(outcome.message.contains("strategy is required"));
        assert_eq!(head(&fleet.repo_path("B"))?, before);
        Ok(())
    }

    #[test]
    fn test_diverged_rebase_keeps_local_commits() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        diverged_repo(&fleet, "B")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("B")?, Some(PullStrategy::Rebase));
        assert!(outcome.success, "rebase failed: {}", outcome.message);
        assert_eq!(outcome.strategy, Some(PullStrategy::Rebase));
        assert_state(&outcome.status.expect("status"), SyncState::Ahead, 2, 0);
        Ok(())
    }

    #[test]
    fn test_diverged_merge_creates_merge_commit() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        diverged_repo(&fleet, "B")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("B")?, Some(PullStrategy::Merge));
        assert!(outcome.success, "merge failed: {}", outcome.message);
        // two local commits plus the merge commit
        assert_state(&outcome.status.expect("status"), SyncState::Ahead, 3, 0);
        Ok(())
    }

    #[test]
    fn test_diverged_reset_discards_local_commits() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        diverged_repo(&fleet, "B")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("B")?, Some(PullStrategy::Reset));
        assert!(outcome.success);
        assert_state(&outcome.status.expect("status"), SyncState::UpToDate, 0, 0);
        assert_eq!(head(&fleet.repo_path("B"))?, head(&fleet.seed_path("B"))?);
        Ok(())
    }

    #[test]
    fn test_merge_conflict_leaves_repository_mid_merge() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        let path = conflicting_repo(&fleet, "F")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("F")?, Some(PullStrategy::Merge));
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::ConflictError));
        assert_eq!(outcome.strategy, Some(PullStrategy::Merge));
        assert_eq!(outcome.branch.as_deref(), Some("main"));
        assert!(outcome.message.contains("shared.txt"));
        assert!(is_mid_merge(&path));
        Ok(())
    }

    #[test]
    fn test_rebase_conflict_leaves_repository_mid_rebase() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        let path = conflicting_repo(&fleet, "F")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("F")?, Some(PullStrategy::Rebase));
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::ConflictError));
        assert_eq!(outcome.strategy, Some(PullStrategy::Rebase));
        assert_eq!(outcome.branch.as_deref(), Some("main"));
        assert!(is_mid_rebase(&path));
        Ok(())
    }

    #[test]
    fn test_dirty_tree_blocks_rebase_but_not_reset() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        let path = behind_repo(&fleet, "A")?;
        create_file(&path, "README.md", "local edit\n")?;
        let monitor = monitor(&fleet);
        let handle = monitor.handle("A")?;

        let outcome = monitor.pull(&handle, Some(PullStrategy::Rebase));
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::DirtyWorkingTreeError));
        assert_eq!(outcome.strategy, Some(PullStrategy::Rebase));

        let outcome = monitor.pull(&handle, Some(PullStrategy::Reset));
        assert!(outcome.success);
        let status = outcome.status.expect("status");
        assert_state(&status, SyncState::UpToDate, 0, 0);
        assert!(!status.is_dirty);
        Ok(())
    }

    #[test]
    fn test_merge_refused_by_local_changes_is_dirty_tree() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        let path = fleet.tracked_repo("G")?;
        fleet.push_upstream_edit("G", "README.md", "upstream readme\n")?;
        create_file(&path, "README.md", "uncommitted readme\n")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("G")?, None);
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::DirtyWorkingTreeError));
        Ok(())
    }

    #[test]
    fn test_missing_remote_repository_is_not_found() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        let path = fleet.tracked_repo("H")?;
        git(&path, &["remote", "set-url", "origin", "/definitely/not/a/remote.git"])?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("H")?, None);
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::NotFoundError));
        Ok(())
    }

    #[test]
    fn test_no_remote_pull_is_not_found() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        no_remote_repo(&fleet, "C")?;
        let monitor = monitor(&fleet);

        let outcome = monitor.pull(&monitor.handle("C")?, None);
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(ErrorKind::NotFoundError));
        assert!(outcome.message.contains("No remote"));
        Ok(())
    }

    #[test]
    fn test_bulk_pull_reports_partial_failure() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        behind_repo(&fleet, "A")?;
        diverged_repo(&fleet, "B")?;
        up_to_date_repo(&fleet, "D")?;
        let monitor = monitor(&fleet);

        let report = monitor.pull_all(None)?;
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.success);

        let names: Vec<_> = report.results.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "D"]);
        assert_eq!(report.results[1].error, Some(ErrorKind::UnknownStrategyError));
        Ok(())
    }

    #[test]
    fn test_bulk_pull_with_explicit_strategy() -> anyhow::Result<()> {
        let fleet = TestFleet::new()?;
        behind_repo(&fleet, "A")?;
        diverged_repo(&fleet, "B")?;
        let monitor = monitor(&fleet);

        let handles = monitor.handles(&["A".to_string(), "B".to_string()])?;
        let report = monitor.pull_many(handles, Some(PullStrategy::Rebase));
        assert!(report.success, "{:?}", report.results);
        assert_eq!(report.succeeded, 2);
        Ok(())
    }
}
