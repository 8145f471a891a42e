//! Subcommand entry points wiring the CLI to the pipeline.
use log::*;
use std::sync::Arc;

use crate::{
    Result,
    cli::{Args, ReleaseArgs},
    config::Config,
    forge::{github::Github, manager::ForgeManager},
    history::GitHistory,
    notify::{Notifier, sentry::SentryReleases, slack::SlackWebhook},
    pipeline::{Pipeline, PublishOptions},
};

fn setup_pipeline(args: &Args) -> Result<(Pipeline, Config)> {
    let base_path = args.base_path()?;
    let config = Config::load(&base_path)?;
    let remote = args.get_remote(&config)?;
    let forge = ForgeManager::new(Box::new(Github::new(remote)?));

    let pipeline = Pipeline::new(
        base_path,
        config.clone(),
        forge,
        Arc::new(GitHistory::new()),
    );

    Ok((pipeline, config))
}

/// Notifiers enabled by the release arguments. A notifier that cannot be
/// constructed is skipped with a warning.
pub fn build_notifiers(
    release_args: &ReleaseArgs,
    config: &Config,
) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = vec![];

    if let Some(url) = release_args.webhook_url() {
        match SlackWebhook::new(url, &config.notify.username) {
            Ok(webhook) => notifiers.push(Box::new(webhook)),
            Err(err) => warn!("skipping webhook notification: {err}"),
        }
    }

    if let Some(token) = release_args.sentry_auth_token() {
        match SentryReleases::new(config.sentry.clone(), token) {
            Ok(sentry) => notifiers.push(Box::new(sentry)),
            Err(err) => warn!("skipping sentry release: {err}"),
        }
    }

    notifiers
}

/// Execute release command: publish the release and notify.
pub async fn release(args: &Args, release_args: &ReleaseArgs) -> Result<()> {
    let (pipeline, config) = setup_pipeline(args)?;

    let notifiers = build_notifiers(release_args, &config);

    let options = PublishOptions {
        draft: release_args.draft,
        artifact: release_args.artifact.clone(),
        artifact_name: release_args.artifact_name.clone(),
    };

    let handle = pipeline.run(&options, &notifiers).await?;

    info!("release published: {}", handle.html_url);

    Ok(())
}

/// Execute changelog command: print release notes without publishing.
pub async fn changelog(args: &Args) -> Result<()> {
    let (pipeline, _) = setup_pipeline(args)?;

    let (ctx, notes) = pipeline.prepare().await?;

    info!(
        "changelog for {} written to {}",
        ctx.tag,
        notes.changelog_path.display()
    );

    println!("{}", notes.body);

    Ok(())
}
