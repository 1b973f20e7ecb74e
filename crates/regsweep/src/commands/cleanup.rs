//! Cleanup command

use anyhow::{Context, Result};
use regsweep_cleanup::{Cleanup, RunStatistics};

use crate::cli::CleanupArgs;
use crate::output;

pub async fn run(args: CleanupArgs) -> Result<()> {
    let config = args.to_config()?;
    let cleanup = Cleanup::from_config(&config).context("Failed to create registry client")?;

    let stats = match cleanup.run().await {
        Ok(stats) => stats,
        Err(e) => {
            output::error(&e.to_string());
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }

    Ok(())
}

fn print_summary(stats: &RunStatistics) {
    if stats.dry_run {
        output::header("Cleanup summary (dry run)");
    } else {
        output::header("Cleanup summary");
    }
    output::kv("Repositories", &stats.repositories.to_string());
    output::kv("Deleted", &stats.deleted.to_string());
    output::kv("Kept", &stats.kept.to_string());
    if stats.skipped_tags > 0 {
        output::kv("Skipped tags", &stats.skipped_tags.to_string());
    }
    println!();

    if stats.failed > 0 {
        output::warning(&format!(
            "{} deletions were rejected by the registry",
            stats.failed
        ));
    } else if stats.dry_run {
        output::info("Dry run: nothing was deleted. Set DRY_RUN=false to apply.");
    } else {
        output::success("Cleanup complete");
    }
}
