//! Changelog assembly from one or more repositories' commit history.
//!
//! Lines are collected in memory with [`Changelog::write`], ordered with
//! [`Changelog::sort`], tidied with [`Changelog::clean`] and persisted with
//! [`Changelog::finalize`]. Consumers read the persisted file back through
//! [`read_final_changelog`], which deduplicates a second time.
use log::*;
use regex::Regex;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{ReleaseError, Result},
    history::{HistoryEntry, HistorySource},
};

/// Default emoji markers of user-facing commits, highest priority first.
pub const DEFAULT_EMOJI_ORDER: [&str; 6] =
    ["💡", "🐛", "🎨", "💄", "✨", "🔒"];

const TIMESTAMP_PREFIX: &str = r"^[0-9]{10} ";

const MERGE_BOILERPLATE: [&str; 3] = [
    "Merge branch ",
    "Merge pull request ",
    "Merge remote-tracking branch ",
];

/// A request to render one repository's history into the changelog.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Web URL of the repository used for commit links.
    pub repo_url: String,
    /// Tag of the previous release.
    pub last_version: String,
    /// Append to the buffer instead of replacing it.
    pub append: bool,
    /// Checkout to read history from. Defaults to the changelog folder.
    pub folder: Option<PathBuf>,
}

/// In-memory changelog buffer backed by a history source.
pub struct Changelog {
    changelog_path: PathBuf,
    folder: PathBuf,
    history: Arc<dyn HistorySource>,
    lines: Vec<String>,
}

impl Changelog {
    pub fn new(
        changelog_path: impl Into<PathBuf>,
        folder: impl Into<PathBuf>,
        history: Arc<dyn HistorySource>,
    ) -> Self {
        Self {
            changelog_path: changelog_path.into(),
            folder: folder.into(),
            history,
            lines: vec![],
        }
    }

    /// Render the commits since `last_version` into the buffer.
    pub fn write(&mut self, req: WriteRequest) -> Result<&mut Self> {
        let folder = req.folder.unwrap_or_else(|| self.folder.clone());

        info!(
            "collecting history for {} since {}",
            req.repo_url, req.last_version
        );

        let entries = self
            .history
            .entries_since(&folder, &req.last_version)
            .map_err(|err| match err {
                ReleaseError::Fetch(_) => err,
                other => ReleaseError::fetch(format!(
                    "history for {}: {other}",
                    folder.display()
                )),
            })?;

        let rendered = entries
            .iter()
            .filter(|entry| !entry.is_merge())
            .map(|entry| render_entry(&req.repo_url, entry))
            .collect::<Vec<String>>();

        debug!("rendered {} changelog lines", rendered.len());

        if req.append {
            self.lines.extend(rendered);
        } else {
            self.lines = rendered;
        }

        Ok(self)
    }

    /// Order lines newest first by their timestamp prefix.
    pub fn sort(&mut self) -> &mut Self {
        self.lines.sort_by(|a, b| b.cmp(a));
        self
    }

    /// Strip timestamps, drop noise and duplicates.
    pub fn clean(&mut self) -> Result<&mut Self> {
        let timestamp = Regex::new(TIMESTAMP_PREFIX)?;

        let cleaned = self
            .lines
            .iter()
            .map(|line| timestamp.replace(line, "").trim_end().to_string())
            .filter(|line| !line.is_empty() && !is_merge_boilerplate(line))
            .map(Some)
            .collect::<Vec<Option<String>>>();

        self.lines = dedup_entries(cleaned);
        Ok(self)
    }

    /// Write the buffer to the changelog file.
    pub fn finalize(&self) -> Result<PathBuf> {
        if let Some(parent) = self.changelog_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut content = self.lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        info!(
            "writing {} changelog lines to {}",
            self.lines.len(),
            self.changelog_path.display()
        );

        fs::write(&self.changelog_path, content)?;

        Ok(self.changelog_path.clone())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

fn render_entry(repo_url: &str, entry: &HistoryEntry) -> String {
    format!(
        "{} * [{sha}]({repo_url}/commit/{sha}) {} - {}",
        entry.timestamp,
        entry.subject,
        entry.author,
        sha = entry.short_sha,
    )
}

fn is_merge_boilerplate(line: &str) -> bool {
    let subject = entry_subject(line);
    MERGE_BOILERPLATE
        .iter()
        .any(|prefix| subject.starts_with(prefix))
}

/// The commit subject portion of a cleaned changelog line, i.e. the text
/// after a leading `* [sha](link) `.
pub fn entry_subject(line: &str) -> &str {
    let Some(rest) = line.strip_prefix("* [") else {
        return line;
    };

    rest.split_once("](")
        .and_then(|(_, link)| link.split_once(") "))
        .map(|(_, subject)| subject)
        .unwrap_or(line)
}

/// Drop missing and empty entries, keeping the first occurrence of each.
pub fn dedup_entries<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut seen = HashSet::new();
    let mut result: Vec<String> = vec![];

    for entry in entries.into_iter().flatten() {
        if entry.trim().is_empty() || !seen.insert(entry.clone()) {
            continue;
        }
        result.push(entry);
    }

    result
}

/// Read-back options for the persisted changelog.
#[derive(Debug, Clone)]
pub struct ReadBackOptions {
    /// Keep only entries whose subject starts with a marker in `emoji_order`.
    pub filter_emoji_commits: bool,
    pub emoji_order: Vec<String>,
}

impl Default for ReadBackOptions {
    fn default() -> Self {
        Self {
            filter_emoji_commits: true,
            emoji_order: DEFAULT_EMOJI_ORDER
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Keep user-facing entries, ordered by marker priority. Order within one
/// marker is kept.
pub fn filter_user_facing(
    lines: Vec<String>,
    emoji_order: &[String],
) -> Vec<String> {
    let mut ranked = lines
        .into_iter()
        .filter_map(|line| {
            let subject = entry_subject(&line);
            let rank = emoji_order
                .iter()
                .position(|emoji| subject.starts_with(emoji.as_str()))?;
            Some((rank, line))
        })
        .collect::<Vec<(usize, String)>>();

    ranked.sort_by_key(|(rank, _)| *rank);

    ranked.into_iter().map(|(_, line)| line).collect()
}

/// Load the finalized changelog for use in release notes and messages.
pub fn read_final_changelog(
    path: &Path,
    options: &ReadBackOptions,
) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;

    let mut lines = content
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect::<Vec<String>>();

    if options.filter_emoji_commits {
        lines = filter_user_facing(lines, &options.emoji_order);
    }

    Ok(dedup_entries(lines.into_iter().map(Some)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MockHistorySource;
    use tempfile::TempDir;

    const REPO: &str = "https://github.com/TryGhost/Ghost";

    fn entry(timestamp: i64, sha: &str, subject: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp,
            short_sha: sha.to_string(),
            subject: subject.to_string(),
            author: "Jane".to_string(),
            parent_count: 1,
        }
    }

    fn history_with(entries: Vec<HistoryEntry>) -> MockHistorySource {
        let mut history = MockHistorySource::new();
        history
            .expect_entries_since()
            .returning(move |_, _| Ok(entries.clone()));
        history
    }

    #[test]
    fn write_renders_entries_and_skips_merges() {
        let tmp = TempDir::new().unwrap();
        let mut merge =
            entry(1_700_000_300, "ccc3333", "Merge pull request #1");
        merge.parent_count = 2;

        let history = history_with(vec![
            merge,
            entry(1_700_000_200, "bbb2222", "🐛 Fixed login"),
        ]);

        let mut changelog = Changelog::new(
            tmp.path().join("changelog.md"),
            tmp.path(),
            Arc::new(history),
        );

        changelog
            .write(WriteRequest {
                repo_url: REPO.into(),
                last_version: "v5.0.0".into(),
                append: false,
                folder: None,
            })
            .unwrap();

        assert_eq!(
            changelog.lines(),
            &[format!(
                "1700000200 * [bbb2222]({REPO}/commit/bbb2222) \
                 🐛 Fixed login - Jane"
            )]
        );
    }

    #[test]
    fn append_targets_another_folder() {
        let tmp = TempDir::new().unwrap();
        let admin_dir = tmp.path().join("core/client");

        let mut history = MockHistorySource::new();
        history
            .expect_entries_since()
            .withf(|folder, since| {
                folder.ends_with("core/client") && since == "3.0.0"
            })
            .returning(|_, _| {
                Ok(vec![entry(1_500_000_002, "aaa0002", "🎨 Admin tweak")])
            });
        history
            .expect_entries_since()
            .withf(|folder, _| !folder.ends_with("core/client"))
            .returning(|_, _| {
                Ok(vec![entry(1_500_000_001, "aaa0001", "🐛 Core fix")])
            });

        let mut changelog = Changelog::new(
            tmp.path().join("changelog.md"),
            tmp.path(),
            Arc::new(history),
        );

        changelog
            .write(WriteRequest {
                repo_url: REPO.into(),
                last_version: "3.0.0".into(),
                append: false,
                folder: None,
            })
            .unwrap()
            .write(WriteRequest {
                repo_url: "https://github.com/TryGhost/Admin".into(),
                last_version: "3.0.0".into(),
                append: true,
                folder: Some(admin_dir),
            })
            .unwrap()
            .sort()
            .clean()
            .unwrap();

        assert_eq!(
            changelog.lines(),
            &[
                "* [aaa0002](https://github.com/TryGhost/Admin/commit/aaa0002) \
                 🎨 Admin tweak - Jane"
                    .to_string(),
                format!(
                    "* [aaa0001]({REPO}/commit/aaa0001) 🐛 Core fix - Jane"
                ),
            ]
        );
    }

    #[test]
    fn write_without_append_replaces_buffer() {
        let tmp = TempDir::new().unwrap();
        let history =
            history_with(vec![entry(1_700_000_000, "abc1234", "one")]);
        let mut changelog = Changelog::new(
            tmp.path().join("changelog.md"),
            tmp.path(),
            Arc::new(history),
        );
        let req = WriteRequest {
            repo_url: REPO.into(),
            last_version: "v5.0.0".into(),
            append: false,
            folder: None,
        };

        changelog.write(req.clone()).unwrap();
        changelog.write(req).unwrap();

        assert_eq!(changelog.lines().len(), 1);
    }

    #[test]
    fn history_failure_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let mut history = MockHistorySource::new();
        history.expect_entries_since().returning(|_, _| {
            Err(ReleaseError::invalid_config("not a repository"))
        });

        let mut changelog = Changelog::new(
            tmp.path().join("changelog.md"),
            tmp.path(),
            Arc::new(history),
        );

        let result = changelog.write(WriteRequest {
            repo_url: REPO.into(),
            last_version: "v5.0.0".into(),
            append: false,
            folder: None,
        });

        assert!(matches!(result, Err(ReleaseError::Fetch(_))));
        assert!(changelog.lines().is_empty());
    }

    #[test]
    fn sort_orders_newest_first() {
        let tmp = TempDir::new().unwrap();
        let history = history_with(vec![
            entry(1_700_000_001, "aaa", "old"),
            entry(1_700_000_003, "ccc", "new"),
            entry(1_700_000_002, "bbb", "mid"),
        ]);
        let mut changelog = Changelog::new(
            tmp.path().join("changelog.md"),
            tmp.path(),
            Arc::new(history),
        );

        changelog
            .write(WriteRequest {
                repo_url: REPO.into(),
                last_version: "v5.0.0".into(),
                append: false,
                folder: None,
            })
            .unwrap()
            .sort();

        let timestamps = changelog
            .lines()
            .iter()
            .map(|l| &l[..10])
            .collect::<Vec<_>>();
        assert_eq!(timestamps, vec!["1700000003", "1700000002", "1700000001"]);
    }

    #[test]
    fn clean_strips_noise_and_duplicates() {
        let tmp = TempDir::new().unwrap();
        let history = history_with(vec![
            entry(1_700_000_003, "ccc", "🐛 Fixed thing"),
            entry(1_700_000_002, "bbb", "Merge branch 'main' into feature"),
            entry(1_700_000_003, "ccc", "🐛 Fixed thing"),
            entry(1_700_000_001, "aaa", "✨ New thing"),
        ]);
        let mut changelog = Changelog::new(
            tmp.path().join("changelog.md"),
            tmp.path(),
            Arc::new(history),
        );

        changelog
            .write(WriteRequest {
                repo_url: REPO.into(),
                last_version: "v5.0.0".into(),
                append: false,
                folder: None,
            })
            .unwrap()
            .sort()
            .clean()
            .unwrap();

        assert_eq!(
            changelog.lines(),
            &[
                format!("* [ccc]({REPO}/commit/ccc) 🐛 Fixed thing - Jane"),
                format!("* [aaa]({REPO}/commit/aaa) ✨ New thing - Jane"),
            ]
        );
    }

    #[test]
    fn finalize_is_idempotent_for_identical_history() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("changelog.md");
        let entries = vec![
            entry(1_700_000_002, "bbb", "🐛 Fixed"),
            entry(1_700_000_001, "aaa", "✨ Added"),
        ];

        let run = || {
            let mut changelog = Changelog::new(
                &path,
                tmp.path(),
                Arc::new(history_with(entries.clone())),
            );
            changelog
                .write(WriteRequest {
                    repo_url: REPO.into(),
                    last_version: "v5.0.0".into(),
                    append: false,
                    folder: None,
                })
                .unwrap()
                .sort()
                .clean()
                .unwrap();
            changelog.finalize().unwrap();
            fs::read_to_string(&path).unwrap()
        };

        let first = run();
        let second = run();

        assert_eq!(first, second);
        assert!(first.ends_with('\n'));
        assert_eq!(first.lines().count(), 2);
    }

    #[test]
    fn dedup_keeps_first_occurrence_and_drops_missing() {
        let entries = vec![
            Some("a".to_string()),
            Some("b".to_string()),
            Some("a".to_string()),
            None,
            Some("b".to_string()),
        ];

        assert_eq!(dedup_entries(entries), vec!["a", "b"]);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order_across_many_entries() {
        let entries = (0..5_000)
            .map(|i| Some(format!("entry {}", i % 250)))
            .chain([Some(" ".to_string()), Some("entry 0".to_string())]);

        let deduped = dedup_entries(entries);

        assert_eq!(deduped.len(), 250);
        assert_eq!(deduped.first().map(String::as_str), Some("entry 0"));
        assert_eq!(deduped.last().map(String::as_str), Some("entry 249"));
    }

    #[test]
    fn read_back_dedups_without_emoji_filter() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("changelog.md");
        fs::write(&path, "a\nb\na\n\nb\n").unwrap();

        let options = ReadBackOptions {
            filter_emoji_commits: false,
            ..Default::default()
        };

        assert_eq!(
            read_final_changelog(&path, &options).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn read_back_keeps_user_facing_entries_by_priority() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("changelog.md");
        fs::write(
            &path,
            [
                "* [a1](u/commit/a1) ✨ Added portal - A",
                "* [b2](u/commit/b2) Updated dependencies - B",
                "* [c3](u/commit/c3) 🐛 Fixed editor - C",
                "* [d4](u/commit/d4) 🔒 Hardened auth - D",
                "* [c3](u/commit/c3) 🐛 Fixed editor - C",
                "* [e5](u/commit/e5) 🐛 Fixed members - E",
            ]
            .join("\n"),
        )
        .unwrap();

        let lines =
            read_final_changelog(&path, &ReadBackOptions::default()).unwrap();

        assert_eq!(
            lines,
            vec![
                "* [c3](u/commit/c3) 🐛 Fixed editor - C",
                "* [e5](u/commit/e5) 🐛 Fixed members - E",
                "* [a1](u/commit/a1) ✨ Added portal - A",
                "* [d4](u/commit/d4) 🔒 Hardened auth - D",
            ]
        );
    }

    #[test]
    fn entry_subject_skips_link_prefix() {
        assert_eq!(
            entry_subject("* [abc](https://x/commit/abc) 🐛 Fixed - Jane"),
            "🐛 Fixed - Jane"
        );
        assert_eq!(entry_subject("plain"), "plain");
    }
}
