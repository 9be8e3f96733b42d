use crate::config::Config;
use crate::store::DirectoryStore;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use formsync_autosave::{
    AutoSaveEngine, AutoSaveEvent, AutoSaveEventKind, AutoSaveStatus, KeepLocal,
    OfflineFallbackStore, PreferRemote,
};
use formsync_editor::{FormDocument, FormId, Mutation, UndoRedoManager};
use formsync_workspace::{SyncCoordinator, SyncStatus};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON edit script
    pub script: PathBuf,

    /// Form to edit (overrides the script)
    #[arg(long)]
    pub form_id: Option<String>,
}

/// Edit script format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default)]
    pub form_id: Option<String>,

    /// Title for a form that does not exist yet
    #[serde(default)]
    pub title: Option<String>,

    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Edit {
        document: FormDocument,
        #[serde(default)]
        description: Option<String>,
    },
    Mutate {
        mutation: Mutation,
    },
    BeginGesture {
        description: String,
    },
    EndGesture,
    Undo,
    Redo,
    Offline,
    Online,
    Wait {
        ms: u64,
    },
    Save,
    Resolve {
        strategy: ResolveStrategy,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    KeepLocal,
    PreferRemote,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read script {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid script {}", path.display()))
    }
}

pub async fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let script = Script::load(&args.script)?;

    let form_id = FormId::new(
        args.form_id
            .or(script.form_id.clone())
            .unwrap_or_else(|| "untitled".to_string()),
    );

    let store = Arc::new(DirectoryStore::new(config.data_dir(cwd)));
    let (document, existing) = match store.load(&form_id).await? {
        Some(stored) => (stored.document, true),
        None => {
            let title = script.title.clone().unwrap_or_else(|| form_id.to_string());
            (FormDocument::new(form_id.clone(), title), false)
        }
    };

    println!(
        "{} {} ({} steps)",
        "▶ Replaying".bright_blue().bold(),
        form_id.as_str().bright_white(),
        script.steps.len()
    );

    let engine = AutoSaveEngine::builder(form_id.clone())
        .config(config.autosave.clone())
        .fallback(OfflineFallbackStore::in_dir(config.fallback_dir(cwd)))
        .build(store);
    if existing {
        engine.mark_saved(&document);
    }

    let mut coordinator = SyncCoordinator::new(
        document,
        engine,
        UndoRedoManager::from_config(&config.history),
    );
    for kind in AutoSaveEventKind::ALL {
        coordinator.add_event_listener(kind, |event| {
            print_event(event);
            Ok(())
        });
    }

    if let Some(entry) = coordinator.recovery_candidate() {
        println!(
            "  {} Local copy from {} differs from the saved form; run `formsync recover {}`",
            "⚠️".yellow(),
            entry.timestamp.to_rfc3339(),
            form_id
        );
    }

    for (index, step) in script.steps.into_iter().enumerate() {
        if let Err(e) = run_step(&mut coordinator, step).await {
            println!("  {} step {}: {}", "✗".red(), index + 1, e);
        }
    }

    // Flush whatever is still queued
    let status = coordinator.status();
    if status.pending_changes && status.is_online && status.status != AutoSaveStatus::Conflict {
        if let Err(e) = coordinator.force_save().await {
            println!("  {} final save: {}", "✗".red(), e);
        }
    }

    print_status(&coordinator.status());
    coordinator.dispose();
    Ok(())
}

async fn run_step(coordinator: &mut SyncCoordinator, step: Step) -> Result<()> {
    match step {
        Step::Edit {
            mut document,
            description,
        } => {
            // Scripts may omit the id; the session's form wins
            document.id = coordinator.document().id.clone();
            let description = description.unwrap_or_else(|| "Edit".to_string());
            if !coordinator.apply_edit(document, description.clone())? {
                println!("  {} {} (no change)", "·".dimmed(), description);
            } else {
                println!("  {} {}", "✓".green(), description);
            }
        }
        Step::Mutate { mutation } => {
            let description = mutation.describe();
            if coordinator.apply_mutation(mutation)? {
                println!("  {} {}", "✓".green(), description);
            } else {
                println!("  {} {} (no change)", "·".dimmed(), description);
            }
        }
        Step::BeginGesture { description } => coordinator.begin_gesture(description),
        Step::EndGesture => {
            coordinator.end_gesture();
        }
        Step::Undo => {
            let outcome = coordinator.undo()?;
            println!("  {} undo {}", "↶".cyan(), outcome.description);
        }
        Step::Redo => {
            let outcome = coordinator.redo()?;
            println!("  {} redo {}", "↷".cyan(), outcome.description);
        }
        Step::Offline => coordinator.set_online(false),
        Step::Online => coordinator.set_online(true),
        Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
        Step::Save => {
            coordinator.force_save().await?;
        }
        Step::Resolve { strategy } => {
            let changed = match strategy {
                ResolveStrategy::KeepLocal => coordinator.resolve_conflict(&KeepLocal)?,
                ResolveStrategy::PreferRemote => coordinator.resolve_conflict(&PreferRemote)?,
            };
            println!(
                "  {} conflict resolved ({:?}{})",
                "✓".green(),
                strategy,
                if changed { ", document replaced" } else { "" }
            );
        }
    }
    Ok(())
}

fn print_event(event: &AutoSaveEvent) {
    let label = match event.kind {
        AutoSaveEventKind::SaveStarted => event.kind.as_str().bright_black(),
        AutoSaveEventKind::SaveCompleted | AutoSaveEventKind::OnlineRestored => {
            event.kind.as_str().green()
        }
        AutoSaveEventKind::SaveFailed | AutoSaveEventKind::ConflictDetected => {
            event.kind.as_str().red()
        }
        AutoSaveEventKind::OfflineDetected => event.kind.as_str().yellow(),
    };

    match &event.error {
        Some(error) => println!("    [{}] {}: {}", event.timestamp.format("%H:%M:%S%.3f"), label, error),
        None => println!("    [{}] {}", event.timestamp.format("%H:%M:%S%.3f"), label),
    }
}

fn print_status(status: &SyncStatus) {
    println!();
    let label = match status.status {
        AutoSaveStatus::Saved | AutoSaveStatus::Idle => status.status.to_string().green(),
        AutoSaveStatus::Saving => status.status.to_string().cyan(),
        AutoSaveStatus::Offline => status.status.to_string().yellow(),
        AutoSaveStatus::Error | AutoSaveStatus::Conflict => status.status.to_string().red(),
    };
    println!("{} {}", "Status:".bold(), label);
    println!("  pending changes: {}", status.pending_changes);
    println!(
        "  history: {} undo / {} redo",
        status.history.undo_available, status.history.redo_available
    );
    if let Some(error) = &status.last_error {
        println!("  last error: {}", error);
    }
    println!("  fingerprint: {}", &status.fingerprint[..12]);
}
