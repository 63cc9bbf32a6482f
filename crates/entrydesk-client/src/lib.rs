//! Client side of the entrydesk admin API.
//!
//! [`AdminApi`] is the service seam: [`HttpAdminClient`] talks to the real
//! REST endpoints, [`MemoryAdminApi`] keeps entries in process. On top of
//! either, [`spawn_editor`] runs the debounced editor: autosave, link
//! scanning, and link pallet refreshes.
//!
//! # Example
//! ```rust,no_run
//! use entrydesk_client::{spawn_editor, EditorSettings, HttpAdminClient, UiEvent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> entrydesk_client::Result<()> {
//!     let api = Arc::new(HttpAdminClient::new("http://localhost:5173/api")?);
//!     let (editor, mut ui) = spawn_editor(api, EditorSettings::default());
//!
//!     editor.open("2024/01/02/030405")?;
//!     editor.edit_body("Notes on [[Rust]] and [[Tokio]].")?;
//!
//!     while let Some(event) = ui.recv().await {
//!         if let UiEvent::PalletUpdated(view) = event {
//!             for card in view.cards() {
//!                 println!("{}", card.label());
//!             }
//!             break;
//!         }
//!     }
//!     editor.shutdown().await
//! }
//! ```

pub mod api;
pub mod controller;
pub mod error;
pub mod http;
pub mod memory;

pub use api::AdminApi;
pub use controller::{spawn_editor, EditorHandle, EditorSettings, UiEvent};
pub use error::{ClientError, Result};
pub use http::HttpAdminClient;
pub use memory::MemoryAdminApi;
