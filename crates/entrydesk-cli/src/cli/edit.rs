use super::pallet::print_pallet;
use super::EditArgs;
use anyhow::Result;
use entrydesk_client::{spawn_editor, AdminApi, EditorSettings, UiEvent};
use entrydesk_core::{Navigation, NoticeLevel, OpenTarget};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Mirrors the open entry into a local file and feeds file changes to the editor.
struct Mirror<'a> {
    file: &'a Path,
    keep_local: bool,
    /// Last body known to match the file; `None` until an entry is loaded.
    synced: Option<String>,
}

impl Mirror<'_> {
    async fn on_loaded(&mut self, body: &str) -> Result<()> {
        // Only the first load may keep the local file.
        if std::mem::take(&mut self.keep_local) && self.file.exists() {
            // Let the next poll push the local text as an edit.
            self.synced = Some(body.to_string());
            return Ok(());
        }
        tokio::fs::write(self.file, body).await?;
        self.synced = Some(body.to_string());
        Ok(())
    }

    /// The file's content when it differs from what the editor last saw.
    async fn poll(&mut self) -> Option<String> {
        let synced = self.synced.as_ref()?;
        match tokio::fs::read_to_string(self.file).await {
            Ok(text) if &text != synced => {
                self.synced = Some(text.clone());
                Some(text)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read {}: {}", self.file.display(), e);
                None
            }
        }
    }
}

pub async fn run<A: AdminApi>(args: EditArgs, api: Arc<A>, settings: EditorSettings) -> Result<()> {
    let (editor, mut ui) = spawn_editor(api, settings);
    editor.open(args.path.clone())?;

    let mut mirror = Mirror {
        file: &args.file,
        keep_local: args.keep_local,
        synced: None,
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(args.poll_ms.max(20)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = ui.recv() => {
                let Some(event) = event else { break };
                match event {
                    UiEvent::EntryLoaded(entry) => {
                        mirror.on_loaded(&entry.body).await?;
                        println!(
                            "Editing \"{}\" ({}) via {}",
                            entry.title,
                            entry.path,
                            args.file.display()
                        );
                    }
                    UiEvent::PalletUpdated(view) => {
                        if !view.is_empty() {
                            println!();
                            print_pallet(&view);
                        }
                    }
                    UiEvent::Notice(notice) => match notice.level {
                        NoticeLevel::Info => println!("✓ {}", notice.text),
                        NoticeLevel::Error => eprintln!("✗ {}", notice.text),
                        NoticeLevel::Alert => eprintln!("! {}", notice.text),
                    },
                    UiEvent::Navigate(Navigation::Edit { path, target }) => match target {
                        OpenTarget::CurrentView => {
                            mirror.synced = None;
                            println!("Opening {}", path);
                        }
                        OpenTarget::NewContext => {
                            println!("Run `entrydesk edit {} --file <file>` to open it alongside", path);
                        }
                    },
                    UiEvent::Navigate(Navigation::EntryList) => {
                        println!("Entry closed.");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if let Some(text) = mirror.poll().await {
                    editor.edit_body(text)?;
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, saving pending edits...");
                break;
            }
        }
    }

    editor.shutdown().await?;
    Ok(())
}
