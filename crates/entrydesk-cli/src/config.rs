use entrydesk_client::EditorSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Contents of `entrydesk.toml`. Missing sections and keys take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub server: ServerConfig,
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root of the admin API, e.g. `http://localhost:5173/api`.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173/api".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub body_save_ms: u64,
    pub title_save_ms: u64,
    pub link_scan_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            body_save_ms: 800,
            title_save_ms: 500,
            link_scan_ms: 300,
        }
    }
}

impl DeskConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Human-readable problems; empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let url = self.server.base_url.trim();
        if url.is_empty() {
            errors.push("server.base_url must not be empty".to_string());
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!(
                "server.base_url must start with http:// or https:// (got {:?})",
                url
            ));
        }
        if self.server.timeout_secs == 0 {
            errors.push("server.timeout_secs must be greater than 0".to_string());
        }

        for (key, value) in [
            ("editor.body_save_ms", self.editor.body_save_ms),
            ("editor.title_save_ms", self.editor.title_save_ms),
            ("editor.link_scan_ms", self.editor.link_scan_ms),
        ] {
            if value == 0 {
                errors.push(format!("{} must be greater than 0", key));
            } else if value > 60_000 {
                errors.push(format!("{} must be at most 60000 (got {})", key, value));
            }
        }

        errors
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            body_save_delay: Duration::from_millis(self.editor.body_save_ms),
            title_save_delay: Duration::from_millis(self.editor.title_save_ms),
            link_scan_delay: Duration::from_millis(self.editor.link_scan_ms),
        }
    }
}
