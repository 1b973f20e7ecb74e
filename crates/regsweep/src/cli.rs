//! CLI argument parsing with clap

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use regsweep_core::config::{DEFAULT_CONCURRENCY, DEFAULT_REGISTRY_URL, DEFAULT_RETENTION_COUNT};
use regsweep_core::{CleanupConfig, RegistryCredentials};

/// regsweep - keep the newest images of every repository, delete the rest
#[derive(Parser, Debug)]
#[command(name = "regsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the retention policy to the registry
    Cleanup(CleanupArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Root of the registry v2 API
    #[arg(long, env = "REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    pub registry_url: String,

    /// Basic-auth username
    #[arg(long, env = "REGISTRY_USERNAME")]
    pub username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "REGISTRY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log deletions instead of issuing them
    #[arg(
        long,
        env = "DRY_RUN",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Comma-separated repositories to process (default: whole catalog)
    #[arg(long, env = "REPOSITORIES")]
    pub repositories: Option<String>,

    /// Reserved; accepted but not acted on
    #[arg(
        long,
        env = "DELETE_UNTAGGED",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub delete_untagged: bool,

    /// Number of newest digests kept per repository
    #[arg(
        long,
        env = "RETENTION_COUNT",
        default_value_t = DEFAULT_RETENTION_COUNT as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub retention_count: u64,

    /// Tags whose metadata is fetched in parallel
    #[arg(
        long,
        env = "CLEANUP_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub concurrency: u64,

    /// Print run statistics as JSON
    #[arg(long)]
    pub json: bool,
}

impl CleanupArgs {
    /// Validate the arguments into a run configuration
    pub fn to_config(&self) -> Result<CleanupConfig> {
        let mut config = CleanupConfig::default()
            .with_registry_url(&self.registry_url)
            .context("Invalid registry URL")?
            .with_retention_count(usize::try_from(self.retention_count)?)?
            .with_concurrency(usize::try_from(self.concurrency)?)?;

        if let Some(list) = &self.repositories {
            config = config.with_repository_list(list);
        }
        config.credentials =
            RegistryCredentials::from_parts(self.username.clone(), self.password.clone());
        config.dry_run = self.dry_run;
        config.delete_untagged = self.delete_untagged;

        Ok(config)
    }
}
