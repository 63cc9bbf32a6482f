use crate::links::title_key;
use crate::types::{Entry, LinkPalletData, TwoHopGroup, TwoHopSource};
use std::collections::{HashMap, HashSet};

/// One `[[title]]` reference of the current entry, resolved if possible.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingLink {
    /// Title as written in the link.
    pub dst_title: String,
    /// The entry with that title (case-insensitive), if any.
    pub entry: Option<Entry>,
}

impl OutgoingLink {
    pub fn new(dst_title: impl Into<String>, entry: Option<Entry>) -> Self {
        Self {
            dst_title: dst_title.into(),
            entry,
        }
    }
}

/// Compute the link pallet of the entry at `target_path`.
///
/// - `outgoing`: the entry's references, in body order.
/// - `backlinks`: entries whose bodies reference the entry's own title.
/// - `cociting`: `(dst_title, entry)` pairs of *other* entries referencing
///   `dst_title`; these form the two-hop groups.
///
/// A reference with co-citing entries becomes a two-hop group (its source is
/// a placeholder when unresolved). Otherwise a resolved reference is a direct
/// link and an unresolved one a new link. Back-links not shown anywhere yet
/// are appended to the direct links. Output is deterministic: first-seen order,
/// no duplicate paths, no case-duplicate new-link titles, and the current
/// entry never appears.
pub fn build_link_pallet(
    target_path: &str,
    outgoing: &[OutgoingLink],
    backlinks: &[Entry],
    cociting: &[(String, Entry)],
) -> LinkPalletData {
    let mut groups: HashMap<String, Vec<Entry>> = HashMap::new();
    for (dst_title, entry) in cociting {
        if entry.path == target_path {
            continue;
        }
        let group = groups.entry(title_key(dst_title)).or_default();
        if !group.iter().any(|e| e.path == entry.path) {
            group.push(entry.clone());
        }
    }

    let mut seen_paths: HashSet<String> = HashSet::new();
    seen_paths.insert(target_path.to_string());

    let mut links: Vec<Entry> = Vec::new();
    let mut twohops: Vec<TwoHopGroup> = Vec::new();
    let mut new_links: Vec<String> = Vec::new();
    let mut seen_groups: HashSet<String> = HashSet::new();
    let mut seen_new: HashSet<String> = HashSet::new();

    for link in outgoing {
        if let Some(entry) = &link.entry {
            if entry.path == target_path {
                continue;
            }
        }

        let key = title_key(&link.dst_title);
        match groups.get(&key) {
            Some(members) if !members.is_empty() => {
                if !seen_groups.insert(key) {
                    continue;
                }
                let src = match &link.entry {
                    Some(entry) => {
                        seen_paths.insert(entry.path.clone());
                        TwoHopSource::resolved(entry, &link.dst_title)
                    }
                    None => TwoHopSource::placeholder(&link.dst_title),
                };
                for member in members {
                    seen_paths.insert(member.path.clone());
                }
                twohops.push(TwoHopGroup {
                    src,
                    links: members.clone(),
                });
            }
            _ => match &link.entry {
                Some(entry) => {
                    if !links.iter().any(|e| e.path == entry.path) {
                        seen_paths.insert(entry.path.clone());
                        links.push(entry.clone());
                    }
                }
                None => {
                    if seen_new.insert(key) {
                        new_links.push(link.dst_title.clone());
                    }
                }
            },
        }
    }

    for entry in backlinks {
        if seen_paths.insert(entry.path.clone()) {
            links.push(entry.clone());
        }
    }

    LinkPalletData {
        links,
        twohops,
        new_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, title: &str) -> Entry {
        Entry::new(path, title, format!("body of {}", title))
    }

    #[test]
    fn test_direct_and_new_links() {
        let data = build_link_pallet(
            "me",
            &[
                OutgoingLink::new("Exists", Some(entry("p1", "Exists"))),
                OutgoingLink::new("Missing", None),
                OutgoingLink::new("missing", None),
            ],
            &[],
            &[],
        );
        assert_eq!(data.links.len(), 1);
        assert_eq!(data.links[0].path, "p1");
        assert_eq!(data.new_links, vec!["Missing".to_string()]);
        assert!(data.twohops.is_empty());
    }

    #[test]
    fn test_two_hop_group_for_resolved_and_placeholder() {
        let data = build_link_pallet(
            "me",
            &[
                OutgoingLink::new("Topic", Some(entry("topic", "Topic"))),
                OutgoingLink::new("Ghost", None),
            ],
            &[],
            &[
                ("topic".to_string(), entry("a", "A")),
                ("Ghost".to_string(), entry("b", "B")),
                ("Ghost".to_string(), entry("me", "Me")),
            ],
        );
        assert!(data.links.is_empty());
        assert!(data.new_links.is_empty());
        assert_eq!(data.twohops.len(), 2);

        let topic = &data.twohops[0];
        assert_eq!(topic.src.path.as_deref(), Some("topic"));
        assert_eq!(topic.links[0].path, "a");

        let ghost = &data.twohops[1];
        assert!(ghost.src.is_placeholder());
        assert_eq!(ghost.src.dst_title, "Ghost");
        assert_eq!(ghost.links.len(), 1, "current entry is excluded");
    }

    #[test]
    fn test_backlinks_appended_once() {
        let data = build_link_pallet(
            "me",
            &[OutgoingLink::new("Exists", Some(entry("p1", "Exists")))],
            &[entry("p1", "Exists"), entry("p2", "Referrer"), entry("me", "Me")],
            &[],
        );
        let paths: Vec<_> = data.links.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["p1", "p2"]);
    }

    #[test]
    fn test_self_link_ignored() {
        let data = build_link_pallet(
            "me",
            &[OutgoingLink::new("Me", Some(entry("me", "Me")))],
            &[],
            &[],
        );
        assert!(data.is_empty());
    }
}
