//! The release run: resolve, assemble, publish, notify.
//!
//! Each step hands its results to the next through [`ReleaseContext`] and
//! [`ReleaseNotes`]. Everything up to and including the artifact upload
//! aborts the run on failure. Notifications are best effort.
use log::*;
use semver::Version;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    Result,
    changelog::{Changelog, ReadBackOptions, WriteRequest, read_final_changelog},
    config::{Config, DEFAULT_PAGE_SIZE, Layout},
    error::ReleaseError,
    forge::{
        config::RemoteConfig,
        manager::ForgeManager,
        request::{CreateReleaseRequest, ReleaseHandle, UploadArtifactRequest},
    },
    history::HistorySource,
    manifest::load_product_manifest,
    notify::{Notifier, ReleaseSummary},
    version::{self, parse_version, resolve_previous_version},
};

/// Release body used when no user-facing entries survive read-back.
pub const NO_CHANGES_BODY: &str =
    "This release contains minor fixes and improvements.";

/// Everything resolved before the changelog is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    /// Product directory (base path joined with the manifest sub path).
    pub product_path: PathBuf,
    pub version: Version,
    pub tag: String,
    pub previous_version: Version,
    pub previous_tag: String,
    pub layout: Layout,
}

/// Final changelog entries and the rendered release body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    pub changelog_path: PathBuf,
    pub entries: Vec<String>,
    pub body: String,
}

/// Publishing options that come from the command line.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub draft: bool,
    pub artifact: Option<PathBuf>,
    pub artifact_name: Option<String>,
}

pub struct Pipeline {
    base_path: PathBuf,
    config: Config,
    forge: ForgeManager,
    history: Arc<dyn HistorySource>,
}

impl Pipeline {
    pub fn new(
        base_path: impl Into<PathBuf>,
        config: Config,
        forge: ForgeManager,
        history: Arc<dyn HistorySource>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            config,
            forge,
            history,
        }
    }

    fn remote(&self) -> RemoteConfig {
        self.forge.remote_config()
    }

    /// Read the current version and resolve the previous release.
    pub async fn resolve(&self) -> Result<ReleaseContext> {
        let manifest = load_product_manifest(
            &self.base_path,
            &self.config.package_name,
            &self.config.core_path,
        )?;

        let current = parse_version(&manifest.version)?;

        let releases = self
            .forge
            .list_releases(self.config.release_pages, DEFAULT_PAGE_SIZE)
            .await?;

        let previous = resolve_previous_version(
            &manifest.version,
            &releases,
            &self.config.namespace_marker,
        )?;

        let context = ReleaseContext {
            product_path: self.base_path.join(&manifest.sub_path),
            tag: version::tagged(&current),
            previous_tag: version::tagged(&previous),
            layout: self.config.layout_for(&current),
            version: current,
            previous_version: previous,
        };

        info!(
            "releasing {} with previous version {}",
            context.tag, context.previous_tag
        );

        Ok(context)
    }

    /// Build and persist the changelog for `ctx`.
    pub fn assemble_changelog(&self, ctx: &ReleaseContext) -> Result<PathBuf> {
        let remote = self.remote();
        let mut changelog = Changelog::new(
            self.base_path.join(&self.config.changelog_file),
            &self.base_path,
            Arc::clone(&self.history),
        );

        changelog.write(WriteRequest {
            repo_url: remote.repo_url(),
            last_version: ctx.previous_tag.clone(),
            append: false,
            folder: None,
        })?;

        if let Layout::Dual {
            secondary_repo,
            secondary_folder,
        } = &ctx.layout
        {
            changelog.write(WriteRequest {
                repo_url: secondary_repo_url(&remote, secondary_repo),
                last_version: ctx.previous_tag.clone(),
                append: true,
                folder: Some(ctx.product_path.join(secondary_folder)),
            })?;
        }

        changelog.sort().clean()?;
        changelog.finalize()
    }

    /// Read the changelog back and render the release body.
    pub fn release_notes(
        &self,
        ctx: &ReleaseContext,
        changelog_path: &Path,
    ) -> Result<ReleaseNotes> {
        let options = ReadBackOptions {
            filter_emoji_commits: self.config.changelog.filter_emoji_commits,
            emoji_order: self.config.changelog.emoji_order.clone(),
        };

        let entries = read_final_changelog(changelog_path, &options)?;

        let mut body = if entries.is_empty() {
            NO_CHANGES_BODY.to_string()
        } else {
            entries.join("\n")
        };

        body.push_str("\n\n");
        body.push_str(&compare_text(&self.remote(), &self.config, ctx));

        if let Some(footer) = &self.config.footer {
            body.push_str("\n\n");
            body.push_str(&render_footer(footer, ctx)?);
        }

        Ok(ReleaseNotes {
            changelog_path: changelog_path.to_path_buf(),
            entries,
            body,
        })
    }

    /// Create the release and attach the artifact, if any.
    pub async fn publish(
        &self,
        ctx: &ReleaseContext,
        notes: &ReleaseNotes,
        options: &PublishOptions,
    ) -> Result<ReleaseHandle> {
        let handle = self
            .forge
            .create_release(CreateReleaseRequest {
                tag: ctx.tag.clone(),
                title: ctx.version.to_string(),
                body: notes.body.clone(),
                draft: options.draft || self.config.draft,
                prerelease: self.config.prerelease,
            })
            .await?;

        if let Some(artifact) = &options.artifact {
            let display_name = match &options.artifact_name {
                Some(name) => name.clone(),
                None => artifact
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .ok_or_else(|| {
                        ReleaseError::publish(format!(
                            "artifact has no file name: {}",
                            artifact.display()
                        ))
                    })?,
            };

            self.forge
                .upload_artifact(UploadArtifactRequest {
                    handle: handle.clone(),
                    local_path: self.base_path.join(artifact),
                    display_name,
                })
                .await?;
        }

        Ok(handle)
    }

    /// Run every notifier, logging failures instead of returning them.
    pub async fn notify(
        &self,
        notifiers: &[Box<dyn Notifier>],
        summary: &ReleaseSummary,
    ) {
        for notifier in notifiers {
            if let Err(err) = notifier.notify(summary).await {
                warn!("{} notification failed: {err}", notifier.name());
            }
        }
    }

    /// What notifiers are told about a published release.
    pub fn summary(
        &self,
        ctx: &ReleaseContext,
        notes: &ReleaseNotes,
    ) -> ReleaseSummary {
        ReleaseSummary {
            product_name: self.config.product_name.clone(),
            version: ctx.version.to_string(),
            tag: ctx.tag.clone(),
            release_url: format!(
                "{}/{}",
                self.remote().release_link_base_url(),
                ctx.tag
            ),
            changelog: notes.entries.clone(),
        }
    }

    /// Assemble the changelog and render notes without publishing.
    pub async fn prepare(&self) -> Result<(ReleaseContext, ReleaseNotes)> {
        let ctx = self.resolve().await?;
        let changelog_path = self.assemble_changelog(&ctx)?;
        let notes = self.release_notes(&ctx, &changelog_path)?;
        Ok((ctx, notes))
    }

    /// The full release run.
    pub async fn run(
        &self,
        options: &PublishOptions,
        notifiers: &[Box<dyn Notifier>],
    ) -> Result<ReleaseHandle> {
        let (ctx, notes) = self.prepare().await?;
        let handle = self.publish(&ctx, &notes, options).await?;

        if notifiers.is_empty() {
            return Ok(handle);
        }

        if self.remote().dry_run {
            warn!(
                "dry_run: would notify: {}",
                notifiers
                    .iter()
                    .map(|notifier| notifier.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Ok(handle);
        }

        let summary = self.summary(&ctx, &notes);
        self.notify(notifiers, &summary).await;

        Ok(handle)
    }
}

fn secondary_repo_url(remote: &RemoteConfig, repo: &str) -> String {
    format!("{}://{}/{}/{repo}", remote.scheme, remote.host, remote.owner)
}

fn compare_url(
    remote: &RemoteConfig,
    repo: &str,
    ctx: &ReleaseContext,
) -> String {
    format!(
        "{}://{}/{}/{}/compare/{}...{}",
        remote.scheme,
        remote.host,
        remote.owner.to_lowercase(),
        repo.to_lowercase(),
        ctx.previous_tag,
        ctx.tag
    )
}

/// The "view the changelog" section of the release body.
pub fn compare_text(
    remote: &RemoteConfig,
    config: &Config,
    ctx: &ReleaseContext,
) -> String {
    match &ctx.layout {
        Layout::Monorepo => format!(
            "---\n\nView the changelog for full details: {}",
            compare_url(remote, &remote.repo, ctx)
        ),
        Layout::Dual { secondary_repo, .. } => format!(
            "---\n\nView the changelog for full details:\n\n\
             * {} - {}\n* {} - {}",
            config.product_name,
            compare_url(remote, &remote.repo, ctx),
            secondary_repo,
            compare_url(remote, secondary_repo, ctx)
        ),
    }
}

fn render_footer(template: &str, ctx: &ReleaseContext) -> Result<String> {
    let mut context = tera::Context::new();
    context.insert("version", &ctx.version.to_string());
    context.insert("tag", &ctx.tag);
    context.insert("previous_tag", &ctx.previous_tag);

    Ok(tera::Tera::one_off(template, &context, false)?)
}

#[cfg(test)]
#[path = "./pipeline_tests.rs"]
mod tests;
