use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one issued request. Tickets from one sequence increase strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generation counter for one kind of request.
///
/// Every request takes a fresh ticket; a response is applied only when its
/// ticket is still the latest one issued. Older responses are stale and must
/// be dropped, whatever order they arrive in.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
    outstanding: bool,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the ticket for a new request, superseding all earlier ones.
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        self.outstanding = true;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.outstanding && ticket.0 == self.latest
    }

    /// Accept a response: returns true (and marks the request settled) only
    /// for the latest ticket.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.is_current(ticket) {
            self.outstanding = false;
            true
        } else {
            false
        }
    }

    /// Make every outstanding ticket stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.outstanding = false;
    }

    /// Whether the latest issued request has not been settled yet.
    pub fn in_flight(&self) -> bool {
        self.outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_settles() {
        let mut seq = RequestSequence::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(first < second);
        assert!(!seq.settle(first));
        assert!(seq.in_flight());
        assert!(seq.settle(second));
        assert!(!seq.in_flight());
        assert!(!seq.settle(second), "a ticket settles once");
    }

    #[test]
    fn test_invalidate_drops_outstanding() {
        let mut seq = RequestSequence::new();
        let ticket = seq.issue();
        seq.invalidate();
        assert!(!seq.is_current(ticket));
        assert!(!seq.settle(ticket));
        let next = seq.issue();
        assert!(seq.settle(next));
    }
}
