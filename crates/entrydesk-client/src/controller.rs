//! Async driver for [`EditorSession`].
//!
//! [`spawn_editor`] starts an actor task that owns the session. User input
//! arrives through the [`EditorHandle`]; timer expiries and API results are
//! fed back into the same loop as [`SessionEvent`]s, so the session has a
//! single writer. API calls run in their own tasks and never block the loop:
//! a slow save does not hold up a pallet refresh.

use crate::{AdminApi, ClientError, Result};
use entrydesk_core::{
    CardAction, Debouncer, EditorSession, Effect, Entry, Navigation, Notice, PalletView,
    SaveField, SessionEvent, Visibility,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Debounce delays of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub body_save_delay: Duration,
    pub title_save_delay: Duration,
    pub link_scan_delay: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            body_save_delay: Duration::from_millis(800),
            title_save_delay: Duration::from_millis(500),
            link_scan_delay: Duration::from_millis(300),
        }
    }
}

/// What the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum UiEvent {
    EntryLoaded(Entry),
    PalletUpdated(PalletView),
    Notice(Notice),
    Navigate(Navigation),
}

enum Command {
    Event(SessionEvent),
    Shutdown(oneshot::Sender<()>),
}

/// Input side of a running editor.
///
/// Dropping every handle stops the editor after saving unsaved edits.
#[derive(Debug, Clone)]
pub struct EditorHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Command::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

impl EditorHandle {
    fn send(&self, event: SessionEvent) -> Result<()> {
        self.tx
            .send(Command::Event(event))
            .map_err(|_| ClientError::Closed)
    }

    pub fn open(&self, path: impl Into<String>) -> Result<()> {
        self.send(SessionEvent::Open { path: path.into() })
    }

    pub fn edit_title(&self, title: impl Into<String>) -> Result<()> {
        self.send(SessionEvent::TitleEdited(title.into()))
    }

    pub fn edit_body(&self, body: impl Into<String>) -> Result<()> {
        self.send(SessionEvent::BodyEdited(body.into()))
    }

    pub fn click(&self, action: CardAction) -> Result<()> {
        self.send(SessionEvent::CardClicked(action))
    }

    pub fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        self.send(SessionEvent::VisibilityRequested(visibility))
    }

    pub fn delete(&self) -> Result<()> {
        self.send(SessionEvent::DeleteRequested)
    }

    pub fn regenerate_image(&self) -> Result<()> {
        self.send(SessionEvent::RegenerateImageRequested)
    }

    /// Save unsaved edits, wait for in-flight requests, and stop the editor.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(ack_tx))
            .map_err(|_| ClientError::Closed)?;
        ack_rx.await.map_err(|_| ClientError::Closed)
    }
}

/// Start an editor on the current tokio runtime.
pub fn spawn_editor<A: AdminApi>(
    api: Arc<A>,
    settings: EditorSettings,
) -> (EditorHandle, mpsc::UnboundedReceiver<UiEvent>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let timer = |delay: Duration, event: SessionEvent| {
        let tx = event_tx.clone();
        Debouncer::spawn(delay, move || {
            let _ = tx.send(event.clone());
        })
    };
    let body_save = timer(settings.body_save_delay, SessionEvent::BodySaveDue);
    let title_save = timer(settings.title_save_delay, SessionEvent::TitleSaveDue);
    let link_scan = timer(settings.link_scan_delay, SessionEvent::LinkScanDue);

    let actor = EditorActor {
        session: EditorSession::new(),
        body_save,
        title_save,
        link_scan,
        api,
        ui: ui_tx,
        events: event_tx,
        tasks: JoinSet::new(),
    };
    tokio::spawn(actor.run(command_rx, event_rx));

    (EditorHandle { tx: command_tx }, ui_rx)
}

struct EditorActor<A: AdminApi> {
    session: EditorSession,
    body_save: Debouncer,
    title_save: Debouncer,
    link_scan: Debouncer,
    api: Arc<A>,
    ui: mpsc::UnboundedSender<UiEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    tasks: JoinSet<()>,
}

impl<A: AdminApi> EditorActor<A> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Event(event)) => self.dispatch(event),
                    Some(Command::Shutdown(ack)) => {
                        self.finish().await;
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.finish().await;
                        break;
                    }
                },
                Some(event) = events.recv() => self.dispatch(event),
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => {}
            }
        }
        debug!("Editor stopped");
    }

    async fn finish(&mut self) {
        self.dispatch(SessionEvent::Close);
        while self.tasks.join_next().await.is_some() {}
    }

    fn dispatch(&mut self, event: SessionEvent) {
        for effect in self.session.apply(event) {
            self.perform(effect);
        }
    }

    fn emit(&self, event: UiEvent) {
        let _ = self.ui.send(event);
    }

    /// Run `call` off the loop and feed its result back as an event.
    fn call<F>(&mut self, call: F)
    where
        F: std::future::Future<Output = SessionEvent> + Send + 'static,
    {
        let events = self.events.clone();
        self.tasks.spawn(async move {
            let _ = events.send(call.await);
        });
    }

    fn perform(&mut self, effect: Effect) {
        let api = Arc::clone(&self.api);
        match effect {
            Effect::LoadEntry { ticket, path } => self.call(async move {
                match api.get_entry(&path).await {
                    Ok(entry) => SessionEvent::EntryLoaded { ticket, entry },
                    Err(e) => SessionEvent::EntryLoadFailed {
                        ticket,
                        not_found: e.is_not_found(),
                        message: e.to_string(),
                    },
                }
            }),
            Effect::FetchPallet { ticket, path } => self.call(async move {
                match api.link_pallet(&path).await {
                    Ok(data) => SessionEvent::PalletLoaded { ticket, data },
                    Err(e) => SessionEvent::PalletFailed {
                        ticket,
                        message: e.to_string(),
                    },
                }
            }),
            Effect::ScheduleBodySave => self.body_save.trigger(),
            Effect::ScheduleTitleSave => self.title_save.trigger(),
            Effect::ScheduleLinkScan => self.link_scan.trigger(),
            Effect::CancelTimers => {
                self.body_save.cancel();
                self.title_save.cancel();
                self.link_scan.cancel();
            }
            Effect::SaveBody { path, body } => self.call(async move {
                let outcome = api.update_body(&path, &body).await.map_err(|e| e.to_string());
                SessionEvent::SaveFinished {
                    path,
                    field: SaveField::Body,
                    outcome,
                }
            }),
            Effect::SaveTitle { path, title } => self.call(async move {
                let outcome = api.update_title(&path, &title).await.map_err(|e| e.to_string());
                SessionEvent::SaveFinished {
                    path,
                    field: SaveField::Title,
                    outcome,
                }
            }),
            Effect::CreateEntry { title } => self.call(async move {
                let outcome = api.create_entry(&title).await.map_err(|e| e.to_string());
                SessionEvent::EntryCreated { title, outcome }
            }),
            Effect::UpdateVisibility { path, visibility } => self.call(async move {
                let outcome = api
                    .update_visibility(&path, visibility)
                    .await
                    .map_err(|e| e.to_string());
                SessionEvent::VisibilityUpdated { path, outcome }
            }),
            Effect::DeleteEntry { path } => self.call(async move {
                let outcome = api.delete_entry(&path).await.map_err(|e| e.to_string());
                SessionEvent::Deleted { path, outcome }
            }),
            Effect::RegenerateImage { path } => self.call(async move {
                let outcome = api
                    .regenerate_entry_image(&path)
                    .await
                    .map_err(|e| e.to_string());
                SessionEvent::ImageRegenerated { path, outcome }
            }),
            Effect::ShowEntry(entry) => {
                info!("Editing {} ({})", entry.path, entry.title);
                self.emit(UiEvent::EntryLoaded(entry));
            }
            Effect::ShowPallet(view) => self.emit(UiEvent::PalletUpdated(view)),
            Effect::Notify(notice) => self.emit(UiEvent::Notice(notice)),
            Effect::Navigate(navigation) => self.emit(UiEvent::Navigate(navigation)),
        }
    }
}
