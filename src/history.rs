//! Commit history sources used to build changelog entries.
use git2::Sort;
use log::*;
use std::path::Path;

use crate::error::{ReleaseError, Result};

/// A single commit as seen by the changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Author time in seconds since the epoch.
    pub timestamp: i64,
    pub short_sha: String,
    pub subject: String,
    pub author: String,
    pub parent_count: usize,
}

impl HistoryEntry {
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}

/// Source of commits reachable from HEAD but not from a given tag.
#[cfg_attr(test, mockall::automock)]
pub trait HistorySource: Send + Sync {
    /// Commits in `folder`'s repository since `since_ref`, newest first.
    fn entries_since(
        &self,
        folder: &Path,
        since_ref: &str,
    ) -> Result<Vec<HistoryEntry>>;
}

/// Reads history from a local git checkout.
#[derive(Debug, Default, Clone)]
pub struct GitHistory;

impl GitHistory {
    pub fn new() -> Self {
        Self
    }

    fn find_since(
        repo: &git2::Repository,
        since_ref: &str,
    ) -> Result<git2::Oid> {
        let object = repo
            .revparse_single(&format!("refs/tags/{since_ref}"))
            .or_else(|_| repo.revparse_single(since_ref))
            .map_err(|err| {
                ReleaseError::fetch(format!(
                    "unable to find reference {since_ref}: {err}"
                ))
            })?;

        Ok(object.peel_to_commit()?.id())
    }
}

impl HistorySource for GitHistory {
    fn entries_since(
        &self,
        folder: &Path,
        since_ref: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let repo = git2::Repository::discover(folder).map_err(|err| {
            ReleaseError::fetch(format!(
                "failed to open repository at {}: {err}",
                folder.display()
            ))
        })?;

        let since = Self::find_since(&repo, since_ref)?;

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;
        revwalk.hide(since)?;

        let mut entries = vec![];

        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            let short_sha = commit
                .as_object()
                .short_id()?
                .as_str()
                .unwrap_or_default()
                .to_string();

            entries.push(HistoryEntry {
                timestamp: commit.author().when().seconds(),
                short_sha,
                subject: commit.summary().unwrap_or_default().to_string(),
                author: commit.author().name().unwrap_or_default().to_string(),
                parent_count: commit.parent_count(),
            });
        }

        debug!(
            "found {} commits in {} since {since_ref}",
            entries.len(),
            folder.display()
        );

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn commit_file(
        repo: &git2::Repository,
        name: &str,
        message: &str,
        time: i64,
    ) -> git2::Oid {
        std::fs::write(repo.workdir().unwrap().join(name), message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = git2::Signature::new(
            "Test Author",
            "test@example.com",
            &git2::Time::new(time, 0),
        )
        .unwrap();

        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs = parents.iter().collect::<Vec<_>>();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn reads_commits_since_tag() {
        let tmp = TempDir::new().unwrap();
        let repo = git2::Repository::init(tmp.path()).unwrap();

        let first =
            commit_file(&repo, "a.txt", "Initial commit", 1_600_000_000);
        let object = repo.find_object(first, None).unwrap();
        repo.tag_lightweight("v5.0.0", &object, false).unwrap();

        commit_file(&repo, "b.txt", "🐛 Fixed editor crash", 1_600_000_100);
        commit_file(&repo, "c.txt", "✨ Added newsletters", 1_600_000_200);

        let entries = GitHistory::new()
            .entries_since(tmp.path(), "v5.0.0")
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject, "✨ Added newsletters");
        assert_eq!(entries[0].timestamp, 1_600_000_200);
        assert_eq!(entries[1].subject, "🐛 Fixed editor crash");
        assert_eq!(entries[1].author, "Test Author");
        assert!(!entries[1].short_sha.is_empty());
        assert!(!entries[1].is_merge());
    }

    #[test]
    fn missing_tag_is_a_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let repo = git2::Repository::init(tmp.path()).unwrap();
        commit_file(&repo, "a.txt", "Initial commit", 1_600_000_000);

        let result = GitHistory::new().entries_since(tmp.path(), "v9.9.9");

        assert!(matches!(result, Err(ReleaseError::Fetch(_))));
    }

    #[test]
    fn missing_repository_is_a_fetch_error() {
        let tmp = TempDir::new().unwrap();

        let result = GitHistory::new().entries_since(tmp.path(), "v1.0.0");

        assert!(matches!(result, Err(ReleaseError::Fetch(_))));
    }
}
