//! Link pallet: the aggregated "related links" view of one entry.
//!
//! Three tiers are rendered, each optional:
//! - direct links: entries this entry references (and entries referencing it)
//! - two-hop links: per referenced title, other entries that also reference it
//! - new links: referenced titles with no entry yet, offered for creation
//!
//! [`view`] turns service data into cards and click actions; [`builder`]
//! computes the data from an entry graph the way the service does.

pub mod builder;
pub mod view;

pub use builder::{build_link_pallet, OutgoingLink};
pub use view::{
    Card, CardAction, ClickModifiers, CreateCard, EntryCard, OpenTarget, PalletView, TwoHopRow,
};
