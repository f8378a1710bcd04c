//! The `sync` command: mirror every eligible source repository.

use std::sync::Arc;

use forgesync::mirror::{PushMirrorConfig, PushMirrorer, Remirror};
use forgesync::platform::{ApiRateLimiter, Destination, PlatformKind, SourceForge};
use forgesync::sync::{FilterError, RepositoryFeature, RepositoryFilter, SyncError, connect_syncer};
use forgesync::task::{Orchestrator, RunSummary, list_source_repos};
use forgesync::{DEFAULT_DESCRIPTION_TEMPLATE, DescriptionTemplate, ForgejoClient};
use thiserror::Error;

use crate::config::{Config, MissingToken};
use crate::shutdown::is_shutdown_requested;

/// Options of `forgesync sync`. Unset options fall back to the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SyncArgs {
    /// Source Forgejo instance URL
    pub source: Option<String>,

    /// Destination: github, codeberg or forgejo=<url>, optionally github=<api url>
    pub target: Option<String>,

    /// Description template; placeholders: {description} {url} {website} {full_name} {clone_url}
    #[arg(short = 'd', long)]
    pub description_template: Option<String>,

    /// When to recreate existing mirrors: never, always, purge or "YYYY-MM-DD HH:MM:SS" with * wildcards
    #[arg(short = 'r', long)]
    pub remirror: Option<String>,

    /// Push mirror interval, e.g. 8h0m0s
    #[arg(short = 'i', long)]
    pub mirror_interval: Option<String>,

    /// Don't trigger a mirror sync right after creating a mirror
    #[arg(long)]
    pub skip_initial: bool,

    /// Push on every commit instead of only on the interval
    #[arg(long)]
    pub sync_on_push: bool,

    /// Only sync repositories whose name fully matches one of these patterns
    #[arg(long = "include", value_name = "RE")]
    pub include: Vec<String>,

    /// Never sync repositories whose name fully matches one of these patterns
    #[arg(long = "exclude", value_name = "RE")]
    pub exclude: Vec<String>,

    /// Repository feature to enable on the destination (repeatable)
    #[arg(short = 'f', long = "feature", value_name = "FEATURE")]
    pub features: Vec<String>,

    /// Dry run - show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub no_rate_limit: bool,
}

/// Configuration problems, all detected before any repository is touched.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Missing source instance: pass SOURCE or set `source` in the config file")]
    MissingSource,

    #[error("Missing target: pass TARGET or set `target` in the config file")]
    MissingTarget,

    #[error("Invalid source: {0}")]
    Source(#[source] forgesync::platform::DestinationError),

    #[error("Invalid target: {0}")]
    Target(#[source] forgesync::platform::DestinationError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Unknown repository feature: {0}")]
    Feature(String),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Token(#[from] MissingToken),
}

/// Everything a run needs, validated.
#[derive(Debug)]
pub struct SyncSettings {
    pub source: Destination,
    pub target: Destination,
    pub template: DescriptionTemplate,
    pub mirror: PushMirrorConfig,
    pub filter: RepositoryFilter,
    pub features: Vec<RepositoryFeature>,
    pub dry_run: bool,
    pub rate_limit: bool,
}

impl SyncSettings {
    /// Merge `args` over `config` and validate the result.
    pub fn resolve(args: &SyncArgs, config: &Config) -> Result<Self, SettingsError> {
        let source = args
            .source
            .as_deref()
            .or(config.source.as_deref())
            .ok_or(SettingsError::MissingSource)?;
        let source =
            Destination::new(PlatformKind::Forgejo, Some(source)).map_err(SettingsError::Source)?;

        let target = args
            .target
            .as_deref()
            .or(config.target.as_deref())
            .ok_or(SettingsError::MissingTarget)?;
        let target = Destination::parse(target).map_err(SettingsError::Target)?;

        let template = args
            .description_template
            .as_deref()
            .or(config.description_template.as_deref())
            .unwrap_or(DEFAULT_DESCRIPTION_TEMPLATE);
        let template = DescriptionTemplate::parse(template).map_err(SyncError::from)?;

        let remirror = match args.remirror.as_deref().or(config.remirror.as_deref()) {
            Some(rule) => Some(rule.parse::<Remirror>().map_err(SyncError::from)?),
            None => None,
        };

        let overrides = PushMirrorConfig {
            interval: args
                .mirror_interval
                .clone()
                .or_else(|| config.mirror_interval.clone()),
            remirror,
            immediate: if args.skip_initial {
                Some(false)
            } else {
                config.immediate
            },
            sync_on_push: if args.sync_on_push {
                Some(true)
            } else {
                config.sync_on_push
            },
        };
        let mirror = PushMirrorConfig::defaults().overlay(&overrides);

        let include = if args.include.is_empty() {
            &config.include
        } else {
            &args.include
        };
        let exclude = if args.exclude.is_empty() {
            &config.exclude
        } else {
            &args.exclude
        };
        let filter = RepositoryFilter::new(include.as_slice(), exclude.as_slice())?;

        let features = if args.features.is_empty() {
            &config.features
        } else {
            &args.features
        };
        let features = features
            .iter()
            .map(|name| {
                name.parse::<RepositoryFeature>()
                    .map_err(|_| SettingsError::Feature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source,
            target,
            template,
            mirror,
            filter,
            features,
            dry_run: args.dry_run,
            rate_limit: config.rate_limit && !args.no_rate_limit,
        })
    }
}

/// Handle `forgesync sync`.
pub async fn handle_sync(
    args: SyncArgs,
    config: &Config,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let settings = SyncSettings::resolve(&args, config)?;
    let tokens = config.tokens().map_err(SettingsError::from)?;

    if !settings.rate_limit {
        tracing::warn!("Rate limiting disabled - you may hit API throttling");
    }

    let rate_limiter = settings
        .rate_limit
        .then(|| ApiRateLimiter::for_platform(PlatformKind::Forgejo));
    let source: Arc<dyn SourceForge> = Arc::new(ForgejoClient::new(
        &settings.source.instance,
        &tokens.source,
        PlatformKind::Forgejo,
        rate_limiter,
    )?);

    let repos = list_source_repos(source.as_ref()).await?;

    let mirrorer = Arc::new(PushMirrorer::new(
        source.clone(),
        settings.mirror.clone(),
        tokens.mirror,
    ));
    let syncer = connect_syncer(
        &settings.target,
        &tokens.target,
        &settings.features,
        mirrorer.clone(),
        settings.rate_limit,
    )
    .await?;

    let orchestrator = Orchestrator::new(source, syncer, mirrorer, settings.filter, settings.template)
        .dry_run(settings.dry_run);

    let summary = orchestrator
        .run_while(repos, || !is_shutdown_requested())
        .await?;

    for (repo, error) in &summary.errors {
        tracing::warn!(repo = %repo, error = %error, "Not fully synced");
    }
    if summary.interrupted {
        tracing::warn!("Run interrupted, remaining repositories were not synced");
    }

    Ok(summary)
}
