use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entrydesk_client::*;
use entrydesk_core::{
    Card, ClickModifiers, CreatedEntry, Entry, EntryRow, LinkPalletData, LinkedPaths, Navigation,
    Notice, OpenTarget, PalletView, UploadedFile, Visibility,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, timeout};

/// Memory backend that counts calls and can slow down or fail them.
#[derive(Default)]
struct ProbeApi {
    inner: MemoryAdminApi,
    body_saves: AtomicUsize,
    pallet_fetches: AtomicUsize,
    fail_saves: AtomicBool,
    pallet_delays: Mutex<VecDeque<Duration>>,
}

impl ProbeApi {
    fn with_entries(entries: &[(&str, &str, &str)]) -> Arc<Self> {
        let api = Self::default();
        for (path, title, body) in entries {
            api.inner.insert(Entry::new(*path, *title, *body));
        }
        Arc::new(api)
    }

    fn failure(&self) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            Err(ClientError::Status {
                status: 503,
                message: "unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AdminApi for ProbeApi {
    async fn latest_entries(&self, cursor: Option<DateTime<Utc>>) -> Result<Vec<EntryRow>> {
        self.inner.latest_entries(cursor).await
    }

    async fn entry_titles(&self) -> Result<Vec<String>> {
        self.inner.entry_titles().await
    }

    async fn get_entry(&self, path: &str) -> Result<Entry> {
        self.inner.get_entry(path).await
    }

    async fn create_entry(&self, title: &str) -> Result<CreatedEntry> {
        self.inner.create_entry(title).await
    }

    async fn update_body(&self, path: &str, body: &str) -> Result<()> {
        self.body_saves.fetch_add(1, Ordering::SeqCst);
        self.failure()?;
        self.inner.update_body(path, body).await
    }

    async fn update_title(&self, path: &str, title: &str) -> Result<()> {
        self.failure()?;
        self.inner.update_title(path, title).await
    }

    async fn update_visibility(&self, path: &str, visibility: Visibility) -> Result<Visibility> {
        self.inner.update_visibility(path, visibility).await
    }

    async fn delete_entry(&self, path: &str) -> Result<()> {
        self.inner.delete_entry(path).await
    }

    async fn linked_entry_paths(&self, path: &str) -> Result<LinkedPaths> {
        self.inner.linked_entry_paths(path).await
    }

    async fn link_pallet(&self, path: &str) -> Result<LinkPalletData> {
        self.pallet_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.pallet_delays.lock().unwrap().pop_front();
        // Snapshot before sleeping, so a slow response carries old data.
        let data = self.inner.link_pallet(path).await;
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        data
    }

    async fn regenerate_entry_image(&self, path: &str) -> Result<()> {
        self.inner.regenerate_entry_image(path).await
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        self.inner.upload_file(file_name, bytes).await
    }
}

async fn wait_for<F>(ui: &mut UnboundedReceiver<UiEvent>, pred: F) -> UiEvent
where
    F: Fn(&UiEvent) -> bool,
{
    timeout(Duration::from_secs(60), async {
        loop {
            match ui.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("editor stopped"),
            }
        }
    })
    .await
    .expect("timed out waiting for UI event")
}

fn is_loaded(event: &UiEvent) -> bool {
    matches!(event, UiEvent::EntryLoaded(_))
}

fn non_empty_pallet(event: &UiEvent) -> bool {
    matches!(event, UiEvent::PalletUpdated(view) if !view.is_empty())
}

fn drain(ui: &mut UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = ui.try_recv() {
        events.push(event);
    }
    events
}

// ── Loading ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_open_shows_entry_and_pallet() {
    let api = ProbeApi::with_entries(&[
        ("rust", "Rust", "See [[Cargo]]."),
        ("cargo", "Cargo", "Build tool."),
    ]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("rust").unwrap();

    let UiEvent::EntryLoaded(entry) = wait_for(&mut ui, is_loaded).await else {
        unreachable!()
    };
    assert_eq!(entry.title, "Rust");

    let UiEvent::PalletUpdated(view) = wait_for(&mut ui, non_empty_pallet).await else {
        unreachable!()
    };
    assert_eq!(view.direct[0].path, "cargo");
    assert_eq!(api.pallet_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_entry_navigates_to_list() {
    let api = ProbeApi::with_entries(&[]);
    let (editor, mut ui) = spawn_editor(api, EditorSettings::default());
    editor.open("nope").unwrap();

    let event = wait_for(&mut ui, |e| matches!(e, UiEvent::Navigate(_))).await;
    assert_eq!(event, UiEvent::Navigate(Navigation::EntryList));
}

// ── Autosave ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_saves_once() {
    let api = ProbeApi::with_entries(&[("p", "P", "start")]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;

    for i in 0..5 {
        editor.edit_body(format!("draft {}", i)).unwrap();
        sleep(Duration::from_millis(200)).await;
    }
    assert_eq!(api.body_saves.load(Ordering::SeqCst), 0);

    let event = wait_for(&mut ui, |e| matches!(e, UiEvent::Notice(_))).await;
    assert_eq!(event, UiEvent::Notice(Notice::info("Updated")));
    assert_eq!(api.body_saves.load(Ordering::SeqCst), 1);
    assert_eq!(api.inner.entry("p").unwrap().body, "draft 4");
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_is_reported() {
    let api = ProbeApi::with_entries(&[("p", "P", "start")]);
    api.fail_saves.store(true, Ordering::SeqCst);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.edit_body("lost").unwrap();
    let event = wait_for(&mut ui, |e| matches!(e, UiEvent::Notice(_))).await;
    assert_eq!(
        event,
        UiEvent::Notice(Notice::error("Failed to update entry body"))
    );

    // No retry without a new edit.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.body_saves.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_title_conflict_is_reported() {
    let api = ProbeApi::with_entries(&[("a", "Alpha", "x"), ("b", "Beta", "y")]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("b").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.edit_title("alpha").unwrap();
    let event = wait_for(&mut ui, |e| matches!(e, UiEvent::Notice(_))).await;
    assert_eq!(
        event,
        UiEvent::Notice(Notice::error("Failed to update entry title"))
    );
    assert_eq!(api.inner.entry("b").unwrap().title, "Beta");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_saves_pending_edit() {
    let api = ProbeApi::with_entries(&[("p", "P", "start")]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.edit_body("typed just before quitting").unwrap();
    editor.shutdown().await.unwrap();

    assert_eq!(api.inner.entry("p").unwrap().body, "typed just before quitting");
    assert!(editor.open("p").is_err());
}

// ── Link pallet refresh ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_pallet_refetched_only_when_links_change() {
    let settings = EditorSettings {
        body_save_delay: Duration::from_secs(10),
        ..EditorSettings::default()
    };
    let api = ProbeApi::with_entries(&[("p", "P", "about [[A]]"), ("a", "A", "a")]);
    let (editor, mut ui) = spawn_editor(api.clone(), settings);
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;
    wait_for(&mut ui, non_empty_pallet).await;

    editor.edit_body("all about [[A]], reworded").unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(api.pallet_fetches.load(Ordering::SeqCst), 1);

    editor.edit_body("all about [[A]] and [[Brand New]]").unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(api.pallet_fetches.load(Ordering::SeqCst), 2);
    // The refresh does not wait for the pending save.
    assert_eq!(api.body_saves.load(Ordering::SeqCst), 0);

    editor.edit_body("all about [[A]]").unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(api.pallet_fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pallet_shows_saved_links() {
    let api = ProbeApi::with_entries(&[("p", "P", "plain")]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.edit_body("now with [[Fresh]]").unwrap();
    wait_for(&mut ui, |e| matches!(e, UiEvent::Notice(_))).await;

    // Reopening after the save shows the new link as creatable.
    editor.open("p").unwrap();
    let UiEvent::PalletUpdated(view) = wait_for(&mut ui, non_empty_pallet).await else {
        unreachable!()
    };
    assert_eq!(view.new_links[0].title, "Fresh");
}

#[tokio::test(start_paused = true)]
async fn test_stale_pallet_response_is_ignored() {
    let api = ProbeApi::with_entries(&[("p", "P", "[[Old]]")]);
    api.pallet_delays
        .lock()
        .unwrap()
        .push_back(Duration::from_secs(5));
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.edit_body("[[Old]] [[Newer]]").unwrap();
    let UiEvent::PalletUpdated(view) = wait_for(&mut ui, non_empty_pallet).await else {
        unreachable!()
    };
    // Fetched before the save landed, so only the saved link shows.
    assert_eq!(view.new_links.len(), 1);
    assert_eq!(view.new_links[0].title, "Old");

    // The save refetches; the slow first response lands later and is dropped.
    sleep(Duration::from_secs(10)).await;
    let pallets: Vec<PalletView> = drain(&mut ui)
        .into_iter()
        .filter_map(|e| match e {
            UiEvent::PalletUpdated(view) => Some(view),
            _ => None,
        })
        .collect();
    assert_eq!(pallets.len(), 1, "stale pallet rendered: {:?}", pallets);
    let titles: Vec<&str> = pallets[0].new_links.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Old", "Newer"]);
    assert_eq!(api.pallet_fetches.load(Ordering::SeqCst), 3);
}

// ── Navigation and creation ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_placeholder_card_creates_and_opens_entry() {
    let api = ProbeApi::with_entries(&[
        ("rust", "Rust", "[[Ownership]]"),
        ("borrowck", "Borrow checker", "[[Ownership]]"),
    ]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("rust").unwrap();
    let UiEvent::PalletUpdated(view) = wait_for(&mut ui, non_empty_pallet).await else {
        unreachable!()
    };

    let row = &view.two_hop[0];
    assert!(matches!(row.src, Card::Create(_)));
    editor.click(row.src.click(ClickModifiers::plain())).unwrap();

    let UiEvent::Navigate(Navigation::Edit { path, target }) =
        wait_for(&mut ui, |e| matches!(e, UiEvent::Navigate(_))).await
    else {
        unreachable!()
    };
    assert_eq!(target, OpenTarget::CurrentView);

    let UiEvent::EntryLoaded(entry) = wait_for(&mut ui, is_loaded).await else {
        unreachable!()
    };
    assert_eq!(entry.path, path);
    assert_eq!(entry.title, "Ownership");
}

#[tokio::test(start_paused = true)]
async fn test_switching_entries_saves_previous_edits() {
    let api = ProbeApi::with_entries(&[("a", "A", "first"), ("b", "B", "second")]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("a").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.edit_body("first, edited").unwrap();
    editor.open("b").unwrap();
    let UiEvent::EntryLoaded(entry) = wait_for(&mut ui, is_loaded).await else {
        unreachable!()
    };
    assert_eq!(entry.path, "b");

    sleep(Duration::from_secs(2)).await;
    assert_eq!(api.inner.entry("a").unwrap().body, "first, edited");
    assert_eq!(api.inner.entry("b").unwrap().body, "second");
}

#[tokio::test(start_paused = true)]
async fn test_delete_returns_to_list() {
    let api = ProbeApi::with_entries(&[("p", "P", "bye")]);
    let (editor, mut ui) = spawn_editor(api.clone(), EditorSettings::default());
    editor.open("p").unwrap();
    wait_for(&mut ui, is_loaded).await;

    editor.delete().unwrap();
    let event = wait_for(&mut ui, |e| matches!(e, UiEvent::Navigate(_))).await;
    assert_eq!(event, UiEvent::Navigate(Navigation::EntryList));
    assert!(api.inner.is_empty());
}
