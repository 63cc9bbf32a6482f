use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entrydesk_core::{CreatedEntry, Entry, EntryRow, LinkPalletData, LinkedPaths, UploadedFile, Visibility};

/// The blog's admin API.
///
/// [`HttpAdminClient`](crate::HttpAdminClient) talks to the real service;
/// [`MemoryAdminApi`](crate::MemoryAdminApi) keeps everything in process.
/// The editor controller only sees this trait.
#[async_trait]
pub trait AdminApi: Send + Sync + 'static {
    /// One page of entries, most recently edited first. `cursor` is the
    /// `last_edited_at` of the last row already shown.
    async fn latest_entries(&self, cursor: Option<DateTime<Utc>>) -> Result<Vec<EntryRow>>;

    /// Every entry title known to the service.
    async fn entry_titles(&self) -> Result<Vec<String>>;

    async fn get_entry(&self, path: &str) -> Result<Entry>;

    async fn create_entry(&self, title: &str) -> Result<CreatedEntry>;

    async fn update_body(&self, path: &str, body: &str) -> Result<()>;

    /// Fails with [`ClientError::Conflict`](crate::ClientError::Conflict) when
    /// another entry already has the title.
    async fn update_title(&self, path: &str, title: &str) -> Result<()>;

    async fn update_visibility(&self, path: &str, visibility: Visibility) -> Result<Visibility>;

    async fn delete_entry(&self, path: &str) -> Result<()>;

    /// Map of each linked title to the path of its entry, if it has one.
    async fn linked_entry_paths(&self, path: &str) -> Result<LinkedPaths>;

    async fn link_pallet(&self, path: &str) -> Result<LinkPalletData>;

    async fn regenerate_entry_image(&self, path: &str) -> Result<()>;

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile>;
}
