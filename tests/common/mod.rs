//! Shared utilities for git-fleet integration tests
//!
//! Scenarios are built from real git repositories: a bare remote, a seed clone
//! that publishes upstream commits, and working copies in a scanned base directory.

pub mod assertions;
pub mod fixtures;
pub mod repository;
