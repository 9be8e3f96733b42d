use crate::config::Config;
use crate::store::DirectoryStore;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use formsync_autosave::{OfflineFallbackStore, Persistence, SaveMetadata};
use formsync_editor::{ChangeFingerprint, FormId};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// Form whose local copy to inspect
    pub form_id: String,

    /// Write the local copy back to the data directory, overwriting it
    #[arg(long)]
    pub apply: bool,
}

pub async fn recover(args: RecoverArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let form_id = FormId::new(args.form_id);
    let fallback = OfflineFallbackStore::in_dir(config.fallback_dir(cwd));

    let Some(entry) = fallback.load(&form_id) else {
        println!("{} No local copy for {}", "·".dimmed(), form_id.as_str().bright_white());
        return Ok(());
    };

    let store = DirectoryStore::new(config.data_dir(cwd));
    let saved = store.load(&form_id).await?;
    let matches_saved = saved
        .as_ref()
        .is_some_and(|s| ChangeFingerprint::of(&s.document) == ChangeFingerprint::of(&entry.document));

    println!("{}", serde_json::to_string_pretty(&entry)?);
    println!();
    println!(
        "  written {} ({})",
        entry.timestamp.to_rfc3339(),
        if entry.is_failover { "failover" } else { "mirror" }
    );
    if matches_saved {
        println!("  {} Matches the saved form", "✓".green());
    } else {
        println!("  {} Differs from the saved form", "⚠️".yellow());
    }

    if args.apply && !matches_saved {
        let mut metadata = SaveMetadata::new();
        metadata.insert("overwrite".to_string(), Value::Bool(true));
        let result = store.save(&entry.document, &metadata).await;
        if !result.is_success() {
            return Err(anyhow!(
                "Failed to restore {}: {}",
                form_id,
                result.error.unwrap_or_default()
            ));
        }
        fallback.remove(&form_id);
        println!("  {} Restored local copy to {}", "✓".green(), store.path_for(&form_id).display());
    }

    Ok(())
}
