//! In-process [`AdminApi`] backend.
//!
//! Keeps entries in memory and derives links from bodies on demand, so the
//! link pallet always reflects the latest saved text. Backs the editor and
//! CLI tests.

use crate::{AdminApi, ClientError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use entrydesk_core::{
    build_link_pallet, extract_links, placeholder_title, title_key, validate_path, CreatedEntry,
    Entry, EntryRow, LinkPalletData, LinkedPaths, OutgoingLink, UploadedFile, Visibility,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Rows per `latest_entries` page.
pub const PAGE_SIZE: usize = 100;

/// Titles a saved body links to, trimmed and deduplicated the way the server
/// stores them. `[[ Foo ]]` and `[[foo]]` both resolve against "Foo".
fn stored_links(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    extract_links(body)
        .iter()
        .map(|title| title.trim())
        .filter(|title| !title.is_empty() && seen.insert(title_key(title)))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: Entry,
    created_at: DateTime<Utc>,
    last_edited_at: DateTime<Utc>,
    links: Vec<String>,
}

impl StoredEntry {
    fn references(&self, title: &str) -> bool {
        let key = title_key(title);
        self.links.iter().any(|l| title_key(l) == key)
    }

    fn row(&self) -> EntryRow {
        EntryRow {
            created_at: Some(self.created_at),
            last_edited_at: Some(self.last_edited_at),
            updated_at: Some(self.last_edited_at),
            ..EntryRow::from(&self.entry)
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    entries: BTreeMap<String, StoredEntry>,
    uploads: BTreeMap<String, Vec<u8>>,
    clock: Option<DateTime<Utc>>,
}

impl Store {
    /// Wall-clock time, nudged forward so edit times are strictly increasing.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.clock {
            if now <= last {
                now = last + Duration::milliseconds(1);
            }
        }
        self.clock = Some(now);
        now
    }

    fn get(&self, path: &str) -> Result<&StoredEntry> {
        self.entries
            .get(path)
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }

    fn get_mut(&mut self, path: &str) -> Result<&mut StoredEntry> {
        self.entries
            .get_mut(path)
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }

    fn by_title(&self, title: &str) -> Option<&StoredEntry> {
        let key = title_key(title);
        self.entries.values().find(|s| title_key(&s.entry.title) == key)
    }

    fn title_taken(&self, title: &str, except: &str) -> bool {
        self.by_title(title).is_some_and(|s| s.entry.path != except)
    }
}

#[derive(Debug, Default)]
pub struct MemoryAdminApi {
    store: RwLock<Store>,
}

fn bad_request(message: &str) -> ClientError {
    ClientError::Status {
        status: 400,
        message: message.to_string(),
    }
}

impl MemoryAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a complete entry, replacing any entry at the same path.
    pub fn insert(&self, entry: Entry) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let now = store.tick();
        let links = stored_links(&entry.body);
        store.entries.insert(
            entry.path.clone(),
            StoredEntry {
                entry,
                created_at: now,
                last_edited_at: now,
                links,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, path: &str) -> Option<Entry> {
        self.read().entries.get(path).map(|s| s.entry.clone())
    }

    pub fn upload(&self, url: &str) -> Option<Vec<u8>> {
        self.read().uploads.get(url).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AdminApi for MemoryAdminApi {
    async fn latest_entries(&self, cursor: Option<DateTime<Utc>>) -> Result<Vec<EntryRow>> {
        let store = self.read();
        let mut stored: Vec<&StoredEntry> = store
            .entries
            .values()
            .filter(|s| cursor.map_or(true, |c| s.last_edited_at < c))
            .collect();
        stored.sort_by(|a, b| b.last_edited_at.cmp(&a.last_edited_at));
        Ok(stored.into_iter().take(PAGE_SIZE).map(StoredEntry::row).collect())
    }

    async fn entry_titles(&self) -> Result<Vec<String>> {
        Ok(self.read().entries.values().map(|s| s.entry.title.clone()).collect())
    }

    async fn get_entry(&self, path: &str) -> Result<Entry> {
        let path = validate_path(path)?;
        Ok(self.read().get(path)?.entry.clone())
    }

    async fn create_entry(&self, title: &str) -> Result<CreatedEntry> {
        let mut store = self.write();
        let now = store.tick();
        let title = if title.is_empty() {
            placeholder_title(&now)
        } else {
            title.to_string()
        };
        if store.by_title(&title).is_some() {
            return Err(ClientError::Conflict(format!("title {:?} already exists", title)));
        }

        let base = now.format("%Y/%m/%d/%H%M%S").to_string();
        let mut path = base.clone();
        let mut n = 1;
        while store.entries.contains_key(&path) {
            n += 1;
            path = format!("{}-{}", base, n);
        }

        debug!("Creating entry {} ({:?})", path, title);
        store.entries.insert(
            path.clone(),
            StoredEntry {
                entry: Entry::new(&path, &title, ""),
                created_at: now,
                last_edited_at: now,
                links: Vec::new(),
            },
        );
        Ok(CreatedEntry {
            path,
            title: Some(title),
        })
    }

    async fn update_body(&self, path: &str, body: &str) -> Result<()> {
        let path = validate_path(path)?;
        if body.is_empty() {
            return Err(bad_request("Body cannot be empty"));
        }
        let mut store = self.write();
        let now = store.tick();
        let stored = store.get_mut(path)?;
        stored.entry.body = body.to_string();
        stored.links = stored_links(body);
        stored.last_edited_at = now;
        Ok(())
    }

    async fn update_title(&self, path: &str, title: &str) -> Result<()> {
        let path = validate_path(path)?;
        if title.is_empty() {
            return Err(bad_request("Title cannot be empty"));
        }
        let mut store = self.write();
        if store.title_taken(title, path) {
            return Err(ClientError::Conflict(format!("title {:?} already exists", title)));
        }
        let now = store.tick();
        let stored = store.get_mut(path)?;
        stored.entry.title = title.to_string();
        stored.last_edited_at = now;
        Ok(())
    }

    async fn update_visibility(&self, path: &str, visibility: Visibility) -> Result<Visibility> {
        let path = validate_path(path)?;
        let mut store = self.write();
        store.get_mut(path)?.entry.visibility = visibility;
        Ok(visibility)
    }

    async fn delete_entry(&self, path: &str) -> Result<()> {
        let path = validate_path(path)?;
        self.write()
            .entries
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }

    async fn linked_entry_paths(&self, path: &str) -> Result<LinkedPaths> {
        let path = validate_path(path)?;
        let store = self.read();
        let stored = store.get(path)?;
        Ok(stored
            .links
            .iter()
            .map(|title| {
                let dst = store.by_title(title).map(|s| s.entry.path.clone());
                (title.clone(), dst)
            })
            .collect())
    }

    async fn link_pallet(&self, path: &str) -> Result<LinkPalletData> {
        let path = validate_path(path)?;
        let store = self.read();
        let target = store.get(path)?;

        let outgoing: Vec<OutgoingLink> = target
            .links
            .iter()
            .map(|title| {
                let entry = store.by_title(title).map(|s| s.entry.clone());
                OutgoingLink::new(title.clone(), entry)
            })
            .collect();

        let others: Vec<&StoredEntry> = store
            .entries
            .values()
            .filter(|s| s.entry.path != path)
            .collect();

        let backlinks: Vec<Entry> = others
            .iter()
            .filter(|s| s.references(&target.entry.title))
            .map(|s| s.entry.clone())
            .collect();

        let mut cociting: Vec<(String, Entry)> = Vec::new();
        for title in &target.links {
            for other in others.iter().filter(|s| s.references(title)) {
                cociting.push((title.clone(), other.entry.clone()));
            }
        }

        Ok(build_link_pallet(path, &outgoing, &backlinks, &cociting))
    }

    async fn regenerate_entry_image(&self, path: &str) -> Result<()> {
        let path = validate_path(path)?;
        let mut store = self.write();
        let stored = store.get_mut(path)?;
        stored.entry.image_url = Some(format!("/images/{}.png", urlencoding::encode(path)));
        Ok(())
    }

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        if file_name.is_empty() {
            return Err(bad_request("file name is required"));
        }
        let mut store = self.write();
        let now = store.tick();
        let url = format!(
            "/uploads/{}/{}",
            now.format("%Y%m%d%H%M%S%3f"),
            urlencoding::encode(file_name)
        );
        store.uploads.insert(url.clone(), bytes);
        Ok(UploadedFile { url })
    }
}
