use crate::types::{Entry, LinkPalletData, TwoHopGroup, Visibility};
use serde::Serialize;

/// Where an opened entry should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenTarget {
    /// Replace the current edit view.
    CurrentView,
    /// Open in a new browsing context (tab/window), leaving this one alone.
    NewContext,
}

/// Modifier state of a click on a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub middle_button: bool,
}

impl ClickModifiers {
    pub fn plain() -> Self {
        Self::default()
    }

    /// The platform "open in new tab" chords: ctrl/cmd-click or middle click.
    pub fn opens_new_context(&self) -> bool {
        self.ctrl || self.meta || self.middle_button
    }
}

/// What a click on a card asks the editor to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CardAction {
    OpenEntry { path: String, target: OpenTarget },
    CreateEntry { title: String },
}

/// Card for an entry that exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryCard {
    pub path: String,
    pub title: String,
    pub image_url: Option<String>,
    pub private: bool,
    /// Two-hop sources are drawn highlighted.
    pub highlighted: bool,
}

impl EntryCard {
    fn from_entry(entry: &Entry, highlighted: bool) -> Self {
        Self {
            path: entry.path.clone(),
            title: entry.title.clone(),
            image_url: entry.image_url.clone(),
            private: entry.visibility == Visibility::Private,
            highlighted,
        }
    }
}

/// "Create new entry" affordance labelled with a title that has no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateCard {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Card {
    Entry(EntryCard),
    Create(CreateCard),
}

impl Card {
    pub fn click(&self, modifiers: ClickModifiers) -> CardAction {
        match self {
            Card::Entry(card) => CardAction::OpenEntry {
                path: card.path.clone(),
                target: if modifiers.opens_new_context() {
                    OpenTarget::NewContext
                } else {
                    OpenTarget::CurrentView
                },
            },
            Card::Create(card) => CardAction::CreateEntry {
                title: card.title.clone(),
            },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Card::Entry(card) => &card.title,
            Card::Create(card) => &card.title,
        }
    }
}

/// One two-hop group: the source card followed by the entries sharing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoHopRow {
    /// Stable key: the source path, or the placeholder title.
    pub key: String,
    pub src: Card,
    pub links: Vec<EntryCard>,
}

impl TwoHopRow {
    fn from_group(group: &TwoHopGroup) -> Self {
        let (key, src) = match group.src.entry() {
            Some(entry) => (
                entry.path.clone(),
                Card::Entry(EntryCard::from_entry(&entry, true)),
            ),
            None => (
                group.src.dst_title.clone(),
                Card::Create(CreateCard {
                    title: group.src.dst_title.clone(),
                }),
            ),
        };
        Self {
            key,
            src,
            links: group
                .links
                .iter()
                .map(|e| EntryCard::from_entry(e, false))
                .collect(),
        }
    }
}

/// Render model of a link pallet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PalletView {
    pub direct: Vec<EntryCard>,
    pub two_hop: Vec<TwoHopRow>,
    pub new_links: Vec<CreateCard>,
}

impl PalletView {
    pub fn from_data(data: &LinkPalletData) -> Self {
        Self {
            direct: data
                .links
                .iter()
                .map(|e| EntryCard::from_entry(e, false))
                .collect(),
            two_hop: data.twohops.iter().map(TwoHopRow::from_group).collect(),
            new_links: data
                .new_links
                .iter()
                .map(|title| CreateCard {
                    title: title.clone(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.two_hop.is_empty() && self.new_links.is_empty()
    }

    /// Every card in display order, tier by tier.
    pub fn cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self.direct.iter().cloned().map(Card::Entry).collect();
        for row in &self.two_hop {
            cards.push(row.src.clone());
            cards.extend(row.links.iter().cloned().map(Card::Entry));
        }
        cards.extend(self.new_links.iter().cloned().map(Card::Create));
        cards
    }
}
