//! Wiki-link extraction
//!
//! Entries reference each other by title with `[[Title]]` markers in the
//! markdown body. This module turns a body into the ordered, case-insensitively
//! unique list of referenced titles, and wraps that list in [`LinkSet`] so the
//! editor can tell when the set of references actually changed.

mod extract;

pub use extract::{extract_links, title_key, LinkSet};
