pub mod error;
pub mod types;
pub mod links;
pub mod pallet;
pub mod schedule;
pub mod session;
pub mod entry_list;

pub use error::{DeskError, Result};
pub use types::*;
pub use links::{extract_links, title_key, LinkSet};
pub use pallet::{
    build_link_pallet, Card, CardAction, ClickModifiers, CreateCard, EntryCard, OpenTarget,
    OutgoingLink, PalletView, TwoHopRow,
};
pub use schedule::{Debouncer, RequestSequence, Ticket};
pub use session::{
    EditorSession, Effect, Navigation, Notice, NoticeLevel, SaveField, SessionEvent,
};
pub use entry_list::{placeholder_title, EntryList, PageOutcome, PageRequest};
