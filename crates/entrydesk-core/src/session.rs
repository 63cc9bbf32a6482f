//! Editor session: the single owner of one entry's editing state.
//!
//! The session is a reducer. Every input (user edit, timer expiry, API
//! response) is a [`SessionEvent`]; [`EditorSession::apply`] updates state and
//! returns the [`Effect`]s the driver must carry out (timers, API calls,
//! rendering, navigation). Nothing here performs I/O, so the whole editing
//! contract is testable synchronously.

use crate::links::LinkSet;
use crate::pallet::{CardAction, OpenTarget, PalletView};
use crate::schedule::{RequestSequence, Ticket};
use crate::types::{CreatedEntry, Entry, LinkPalletData, Visibility};
use serde::Serialize;
use tracing::{debug, warn};

/// Which field a save concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveField {
    Title,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Short-lived inline confirmation.
    Info,
    /// Inline error message; dismissed by the next action.
    Error,
    /// Must be acknowledged by the user.
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum Navigation {
    Edit { path: String, target: OpenTarget },
    EntryList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Open { path: String },
    EntryLoaded { ticket: Ticket, entry: Entry },
    EntryLoadFailed { ticket: Ticket, not_found: bool, message: String },
    TitleEdited(String),
    BodyEdited(String),
    TitleSaveDue,
    BodySaveDue,
    LinkScanDue,
    SaveFinished { path: String, field: SaveField, outcome: Result<(), String> },
    PalletLoaded { ticket: Ticket, data: LinkPalletData },
    PalletFailed { ticket: Ticket, message: String },
    CardClicked(CardAction),
    EntryCreated { title: String, outcome: Result<CreatedEntry, String> },
    VisibilityRequested(Visibility),
    VisibilityUpdated { path: String, outcome: Result<Visibility, String> },
    DeleteRequested,
    Deleted { path: String, outcome: Result<(), String> },
    RegenerateImageRequested,
    ImageRegenerated { path: String, outcome: Result<(), String> },
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadEntry { ticket: Ticket, path: String },
    FetchPallet { ticket: Ticket, path: String },
    ScheduleTitleSave,
    ScheduleBodySave,
    ScheduleLinkScan,
    /// Disarm every pending save and link-scan timer.
    CancelTimers,
    SaveTitle { path: String, title: String },
    SaveBody { path: String, body: String },
    CreateEntry { title: String },
    UpdateVisibility { path: String, visibility: Visibility },
    DeleteEntry { path: String },
    RegenerateImage { path: String },
    ShowEntry(Entry),
    ShowPallet(PalletView),
    Notify(Notice),
    Navigate(Navigation),
}

#[derive(Debug, Default)]
pub struct EditorSession {
    path: Option<String>,
    entry: Option<Entry>,
    title: String,
    body: String,
    visibility: Visibility,
    links: LinkSet,
    pallet: LinkPalletData,
    entry_requests: RequestSequence,
    pallet_requests: RequestSequence,
    title_dirty: bool,
    body_dirty: bool,
    /// The last pallet fetch ran against a body that was not saved yet.
    pallet_awaits_save: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    pub fn pallet(&self) -> &LinkPalletData {
        &self.pallet
    }

    pub fn pallet_view(&self) -> PalletView {
        PalletView::from_data(&self.pallet)
    }

    pub fn is_dirty(&self) -> bool {
        self.title_dirty || self.body_dirty
    }

    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Open { path } => self.open(path),

            SessionEvent::EntryLoaded { ticket, entry } => {
                if !self.entry_requests.settle(ticket) {
                    debug!("Dropping stale entry response {} for {}", ticket, entry.path);
                    return Vec::new();
                }
                self.title = entry.title.clone();
                self.body = entry.body.clone();
                self.visibility = entry.visibility;
                self.links = LinkSet::from_body(&entry.body);
                self.entry = Some(entry.clone());
                vec![Effect::ShowEntry(entry)]
            }

            SessionEvent::EntryLoadFailed {
                ticket,
                not_found,
                message,
            } => {
                if !self.entry_requests.settle(ticket) {
                    return Vec::new();
                }
                warn!("Failed to load entry {:?}: {}", self.path, message);
                if not_found {
                    let mut effects = vec![Effect::Notify(Notice::error("Entry not found"))];
                    effects.extend(self.close());
                    effects.push(Effect::Navigate(Navigation::EntryList));
                    effects
                } else {
                    vec![Effect::Notify(Notice::error(format!(
                        "Failed to load entry: {}",
                        message
                    )))]
                }
            }

            SessionEvent::TitleEdited(title) => {
                if !self.is_loaded() {
                    return Vec::new();
                }
                self.title = title;
                self.title_dirty = true;
                vec![Effect::ScheduleTitleSave]
            }

            SessionEvent::BodyEdited(body) => {
                if !self.is_loaded() {
                    return Vec::new();
                }
                self.body = body;
                self.body_dirty = true;
                vec![Effect::ScheduleBodySave, Effect::ScheduleLinkScan]
            }

            SessionEvent::LinkScanDue => self.scan_links(),

            SessionEvent::TitleSaveDue => self.save(SaveField::Title),

            SessionEvent::BodySaveDue => self.save(SaveField::Body),

            SessionEvent::SaveFinished {
                path,
                field,
                outcome,
            } => {
                let current = self.path.as_deref() == Some(path.as_str());
                match outcome {
                    Ok(()) if !current => {
                        debug!("Save of {:?} for {} finished after navigation", field, path);
                        Vec::new()
                    }
                    Ok(()) => {
                        let mut effects = vec![Effect::Notify(Notice::info("Updated"))];
                        if field == SaveField::Body && self.pallet_awaits_save {
                            self.pallet_awaits_save = false;
                            let ticket = self.pallet_requests.issue();
                            effects.push(Effect::FetchPallet { ticket, path });
                        }
                        effects
                    }
                    // A flush for an entry already left still has to be reported.
                    Err(message) => {
                        warn!("Failed to update entry {:?} of {}: {}", field, path, message);
                        let what = match field {
                            SaveField::Title => "title",
                            SaveField::Body => "body",
                        };
                        let text = if current {
                            format!("Failed to update entry {}", what)
                        } else {
                            format!("Failed to update entry {} of {}", what, path)
                        };
                        vec![Effect::Notify(Notice::error(text))]
                    }
                }
            }

            SessionEvent::PalletLoaded { ticket, data } => {
                if !self.pallet_requests.settle(ticket) {
                    debug!("Dropping stale link pallet {}", ticket);
                    return Vec::new();
                }
                self.pallet = data;
                vec![Effect::ShowPallet(self.pallet_view())]
            }

            SessionEvent::PalletFailed { ticket, message } => {
                if self.pallet_requests.settle(ticket) {
                    warn!("Failed to get link pallet for {:?}: {}", self.path, message);
                }
                Vec::new()
            }

            SessionEvent::CardClicked(action) => match action {
                CardAction::OpenEntry { path, target } => self.navigate_to(path, target),
                CardAction::CreateEntry { title } => vec![Effect::CreateEntry { title }],
            },

            SessionEvent::EntryCreated { title, outcome } => match outcome {
                Ok(created) => {
                    debug!("Created entry {} for {:?}", created.path, title);
                    self.navigate_to(created.path, OpenTarget::CurrentView)
                }
                Err(message) => {
                    warn!("Error creating new entry {:?}: {}", title, message);
                    vec![Effect::Notify(Notice::alert("Failed to create new entry"))]
                }
            },

            SessionEvent::VisibilityRequested(visibility) => match &self.path {
                Some(path) if self.is_loaded() => vec![Effect::UpdateVisibility {
                    path: path.clone(),
                    visibility,
                }],
                _ => Vec::new(),
            },

            SessionEvent::VisibilityUpdated { path, outcome } => {
                if self.path.as_deref() != Some(path.as_str()) {
                    return Vec::new();
                }
                match outcome {
                    Ok(visibility) => {
                        self.visibility = visibility;
                        if let Some(entry) = &mut self.entry {
                            entry.visibility = visibility;
                        }
                        vec![Effect::Notify(Notice::info(format!(
                            "Visibility changed to {}",
                            visibility
                        )))]
                    }
                    Err(message) => vec![Effect::Notify(Notice::error(format!(
                        "Failed to update visibility: {}",
                        message
                    )))],
                }
            }

            SessionEvent::DeleteRequested => match &self.path {
                Some(path) if self.is_loaded() => vec![
                    Effect::CancelTimers,
                    Effect::DeleteEntry { path: path.clone() },
                ],
                _ => Vec::new(),
            },

            SessionEvent::Deleted { path, outcome } => match outcome {
                Ok(()) => {
                    let mut effects = vec![Effect::Notify(Notice::info("Entry deleted successfully"))];
                    if self.path.as_deref() == Some(path.as_str()) {
                        self.title_dirty = false;
                        self.body_dirty = false;
                        effects.extend(self.close());
                        effects.push(Effect::Navigate(Navigation::EntryList));
                    }
                    effects
                }
                Err(message) => {
                    warn!("Failed to delete entry {}: {}", path, message);
                    let mut effects = vec![Effect::Notify(Notice::error("Failed to delete entry"))];
                    // The entry survives, so re-arm what the delete request disarmed.
                    if self.path.as_deref() == Some(path.as_str()) {
                        if self.title_dirty {
                            effects.push(Effect::ScheduleTitleSave);
                        }
                        if self.body_dirty {
                            effects.push(Effect::ScheduleBodySave);
                            effects.push(Effect::ScheduleLinkScan);
                        }
                    }
                    effects
                }
            },

            SessionEvent::RegenerateImageRequested => match &self.path {
                Some(path) if self.is_loaded() => vec![Effect::RegenerateImage { path: path.clone() }],
                _ => vec![Effect::Notify(Notice::error("No entry path available"))],
            },

            SessionEvent::ImageRegenerated { path, outcome } => match outcome {
                Ok(()) => vec![Effect::Notify(Notice::info(
                    "Entry image regenerated successfully",
                ))],
                Err(message) => {
                    warn!("Failed to regenerate entry image for {}: {}", path, message);
                    vec![Effect::Notify(Notice::error("Failed to regenerate entry image"))]
                }
            },

            SessionEvent::Close => self.close(),
        }
    }

    fn open(&mut self, path: String) -> Vec<Effect> {
        let mut effects = self.close();

        self.path = Some(path.clone());
        let entry_ticket = self.entry_requests.issue();
        let pallet_ticket = self.pallet_requests.issue();

        effects.push(Effect::ShowPallet(PalletView::default()));
        effects.push(Effect::LoadEntry {
            ticket: entry_ticket,
            path: path.clone(),
        });
        effects.push(Effect::FetchPallet {
            ticket: pallet_ticket,
            path,
        });
        effects
    }

    /// Leave the current entry: unsaved edits are saved right away, timers are
    /// disarmed, and every in-flight response becomes stale.
    fn close(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(path) = self.path.clone().filter(|_| self.is_loaded()) {
            if self.title_dirty && !self.title.is_empty() {
                effects.push(Effect::SaveTitle {
                    path: path.clone(),
                    title: self.title.clone(),
                });
            }
            if self.body_dirty && !self.body.is_empty() {
                effects.push(Effect::SaveBody {
                    path,
                    body: self.body.clone(),
                });
            }
        }
        if self.path.is_some() {
            effects.push(Effect::CancelTimers);
        }

        self.entry_requests.invalidate();
        self.pallet_requests.invalidate();
        self.path = None;
        self.entry = None;
        self.title.clear();
        self.body.clear();
        self.visibility = Visibility::default();
        self.links = LinkSet::default();
        self.pallet = LinkPalletData::default();
        self.title_dirty = false;
        self.body_dirty = false;
        self.pallet_awaits_save = false;

        effects
    }

    fn navigate_to(&mut self, path: String, target: OpenTarget) -> Vec<Effect> {
        let mut effects = vec![Effect::Navigate(Navigation::Edit {
            path: path.clone(),
            target,
        })];
        if target == OpenTarget::CurrentView {
            effects.extend(self.open(path));
        }
        effects
    }

    fn scan_links(&mut self) -> Vec<Effect> {
        let Some(path) = self.path.clone().filter(|_| self.is_loaded()) else {
            return Vec::new();
        };
        let links = LinkSet::from_body(&self.body);
        if links == self.links {
            return Vec::new();
        }
        debug!("Link set of {} changed: {:?}", path, links.titles());
        self.links = links;
        // The server builds the pallet from the saved body.
        self.pallet_awaits_save = self.body_dirty;
        let ticket = self.pallet_requests.issue();
        vec![Effect::FetchPallet { ticket, path }]
    }

    fn save(&mut self, field: SaveField) -> Vec<Effect> {
        let Some(path) = self.path.clone().filter(|_| self.is_loaded()) else {
            return Vec::new();
        };
        match field {
            SaveField::Title => {
                if !self.title_dirty {
                    return Vec::new();
                }
                if self.title.is_empty() {
                    return vec![Effect::Notify(Notice::error("Title cannot be empty"))];
                }
                self.title_dirty = false;
                vec![Effect::SaveTitle {
                    path,
                    title: self.title.clone(),
                }]
            }
            SaveField::Body => {
                if !self.body_dirty {
                    return Vec::new();
                }
                if self.body.is_empty() {
                    return vec![Effect::Notify(Notice::error("Body cannot be empty"))];
                }
                self.body_dirty = false;
                vec![Effect::SaveBody {
                    path,
                    body: self.body.clone(),
                }]
            }
        }
    }
}
