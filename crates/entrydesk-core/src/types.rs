use crate::error::{DeskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Who can read an entry on the public site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            _ => Err(DeskError::UnknownVisibility(s.to_string())),
        }
    }
}

/// A stored entry as returned inside link pallets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Storage path, e.g. `2024/01/01/120000` or `getting-started`.
    pub path: String,

    /// Human-readable title. Wiki links resolve against this.
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub visibility: Visibility,

    /// Markup format of the body. Always "mkdn" in practice.
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl Entry {
    pub fn new(path: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            body: body.into(),
            visibility: Visibility::Private,
            format: "mkdn".to_string(),
            image_url: None,
        }
    }
}

/// Row of the latest-entries listing. The service uses PascalCase keys here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct EntryRow {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_visibility")]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl EntryRow {
    /// Convert to an [`Entry`]; rows without a path are unusable.
    pub fn to_entry(&self) -> Option<Entry> {
        let path = self.path.clone().filter(|p| !p.is_empty())?;
        Some(Entry {
            path,
            title: self.title.clone().unwrap_or_default(),
            body: self.body.clone().unwrap_or_default(),
            visibility: self.visibility.unwrap_or_default(),
            format: self.format.clone().unwrap_or_default(),
            image_url: self.image_url.clone(),
        })
    }
}

impl From<&Entry> for EntryRow {
    fn from(entry: &Entry) -> Self {
        Self {
            path: Some(entry.path.clone()),
            title: Some(entry.title.clone()),
            body: Some(entry.body.clone()),
            visibility: Some(entry.visibility),
            format: Some(entry.format.clone()),
            image_url: entry.image_url.clone(),
            ..Default::default()
        }
    }
}

/// Source of a two-hop group.
///
/// When the referenced title has no entry yet, `path` and `title` are absent
/// (the service sends empty strings) and only `dst_title` is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TwoHopSource {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "lenient_visibility")]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// The title as written in the referencing wiki link.
    #[serde(default)]
    pub dst_title: String,
}

impl TwoHopSource {
    pub fn placeholder(dst_title: impl Into<String>) -> Self {
        Self {
            dst_title: dst_title.into(),
            ..Default::default()
        }
    }

    pub fn resolved(entry: &Entry, dst_title: impl Into<String>) -> Self {
        Self {
            path: Some(entry.path.clone()),
            title: Some(entry.title.clone()),
            body: entry.body.clone(),
            visibility: Some(entry.visibility),
            format: entry.format.clone(),
            image_url: entry.image_url.clone(),
            dst_title: dst_title.into(),
        }
    }

    /// The stored entry behind this source, if one exists.
    pub fn entry(&self) -> Option<Entry> {
        let path = self.path.clone()?;
        let title = self.title.clone()?;
        Some(Entry {
            path,
            title,
            body: self.body.clone(),
            visibility: self.visibility.unwrap_or_default(),
            format: self.format.clone(),
            image_url: self.image_url.clone(),
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.path.is_none() || self.title.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TwoHopGroup {
    pub src: TwoHopSource,
    #[serde(default)]
    pub links: Vec<Entry>,
}

/// Aggregated link view for one entry, as produced by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LinkPalletData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<Entry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub twohops: Vec<TwoHopGroup>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub new_links: Vec<String>,
}

impl LinkPalletData {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.twohops.is_empty() && self.new_links.is_empty()
    }
}

/// Response of entry creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedEntry {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of a file upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedFile {
    pub url: String,
}

/// Wiki-link title → resolved entry path (`None` when the title has no entry).
pub type LinkedPaths = BTreeMap<String, Option<String>>;

/// Reject paths that cannot be addressed as a single URL segment.
pub fn validate_path(path: &str) -> Result<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed.contains("..") {
        return Err(DeskError::InvalidPath(path.to_string()));
    }
    Ok(trimmed)
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

// Placeholder sources carry an empty visibility string.
fn lenient_visibility<'de, D>(deserializer: D) -> std::result::Result<Option<Visibility>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse().ok()))
}

// The service encodes empty slices as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_source_from_empty_strings() {
        let json = r#"{
            "src": {"path": "", "title": "", "body": "", "visibility": "", "format": "", "dstTitle": "Missing"},
            "links": [{"path": "a", "title": "A", "body": "x", "visibility": "public", "format": "mkdn", "imageUrl": null}]
        }"#;
        let group: TwoHopGroup = serde_json::from_str(json).unwrap();
        assert!(group.src.is_placeholder());
        assert_eq!(group.src.dst_title, "Missing");
        assert!(group.src.entry().is_none());
        assert_eq!(group.links[0].visibility, Visibility::Public);
    }

    #[test]
    fn test_pallet_null_arrays() {
        let data: LinkPalletData =
            serde_json::from_str(r#"{"links": null, "twohops": null, "newLinks": ["X"]}"#).unwrap();
        assert!(data.links.is_empty());
        assert!(data.twohops.is_empty());
        assert_eq!(data.new_links, vec!["X".to_string()]);
    }

    #[test]
    fn test_entry_row_pascal_case() {
        let row: EntryRow = serde_json::from_str(
            r#"{"Path": "p1", "Title": "T", "Body": "b", "Visibility": "public",
                "LastEditedAt": "2024-01-02T03:04:05Z", "ImageUrl": null}"#,
        )
        .unwrap();
        let entry = row.to_entry().unwrap();
        assert_eq!(entry.path, "p1");
        assert_eq!(entry.visibility, Visibility::Public);
        assert!(row.last_edited_at.is_some());
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("Public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert!("secret".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_validate_path() {
        assert_eq!(validate_path("/2024/01/01/").unwrap(), "2024/01/01");
        assert!(validate_path("").is_err());
        assert!(validate_path("a/../b").is_err());
    }
}
