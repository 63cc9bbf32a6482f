//! Latest-entries listing with cursor pagination and a keyword filter.

use crate::schedule::{RequestSequence, Ticket};
use crate::types::EntryRow;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::debug;

/// Title given to entries created with one click from the list.
pub fn placeholder_title<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// A page the driver should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: Ticket,
    /// `last_last_edited_at` cursor; `None` for the first page.
    pub cursor: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The response belonged to a superseded request.
    Stale,
    /// New rows were appended.
    Appended(usize),
    /// Nothing new arrived; pagination is over.
    Exhausted,
}

#[derive(Debug)]
pub struct EntryList {
    rows: Vec<EntryRow>,
    seen: HashSet<String>,
    requests: RequestSequence,
    has_more: bool,
    keyword: String,
}

impl Default for EntryList {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            seen: HashSet::new(),
            requests: RequestSequence::new(),
            has_more: true,
            keyword: String::new(),
        }
    }
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every row and request the first page.
    pub fn reload(&mut self) -> PageRequest {
        self.rows.clear();
        self.seen.clear();
        self.has_more = true;
        PageRequest {
            ticket: self.requests.issue(),
            cursor: None,
        }
    }

    /// Request the page after the last row, unless a page is already loading
    /// or the listing is exhausted.
    pub fn next_page(&mut self) -> Option<PageRequest> {
        if !self.has_more || self.requests.in_flight() {
            return None;
        }
        if self.rows.is_empty() {
            return Some(self.reload());
        }
        let cursor = self.rows.last().and_then(|row| row.last_edited_at);
        Some(PageRequest {
            ticket: self.requests.issue(),
            cursor,
        })
    }

    pub fn apply_page(&mut self, ticket: Ticket, page: Vec<EntryRow>) -> PageOutcome {
        if !self.requests.settle(ticket) {
            debug!("Dropping stale entry page {}", ticket);
            return PageOutcome::Stale;
        }

        let before = self.rows.len();
        for row in page {
            let Some(path) = row.path.clone().filter(|p| !p.is_empty()) else {
                continue;
            };
            if self.seen.insert(path) {
                self.rows.push(row);
            }
        }

        let added = self.rows.len() - before;
        if added == 0 {
            self.has_more = false;
            PageOutcome::Exhausted
        } else {
            PageOutcome::Appended(added)
        }
    }

    /// A failed page ends pagination; the rows loaded so far stay.
    pub fn fail_page(&mut self, ticket: Ticket) -> bool {
        if !self.requests.settle(ticket) {
            return false;
        }
        self.has_more = false;
        true
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.keyword = keyword.into();
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn rows(&self) -> &[EntryRow] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.requests.in_flight()
    }

    /// Rows matching the keyword, in listing order.
    pub fn visible(&self) -> Vec<&EntryRow> {
        let needle = self.keyword.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows
            .iter()
            .filter(|row| {
                let hit = |field: &Option<String>| {
                    field
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                };
                hit(&row.title) || hit(&row.body)
            })
            .collect()
    }
}
