//! GitHub release publishing.
//!
//! Lists existing releases, creates the new release and uploads build
//! artifacts through a common trait so runs can be dry-run or mocked.

/// Connection configuration for the forge.
pub mod config;

/// GitHub API client implementation.
pub mod github;

/// Dry-run aware wrapper around a forge implementation.
pub mod manager;

/// Request and response types exchanged with the forge.
pub mod request;

/// Common trait for forge platform abstraction.
pub mod traits;
