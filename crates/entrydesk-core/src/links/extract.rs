use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `[[` + one or more characters that are not brackets or line breaks + `]]`.
///
/// The regex crate runs in time linear in the input, so adversarial bodies
/// (thousands of unmatched `[[`) stay cheap enough to scan on every keystroke.
static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]\r\n]+)\]\]").expect("wiki link pattern is valid"));

/// Deduplication key for a title. Titles are compared case-insensitively.
pub fn title_key(title: &str) -> String {
    title.to_lowercase()
}

/// Extract referenced titles from a markdown body.
///
/// Titles come out in first-occurrence order. A title that differs from an
/// earlier one only by case is dropped, keeping the earlier casing.
/// Unterminated `[[` fragments produce nothing.
pub fn extract_links(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut titles = Vec::new();

    for caps in WIKI_LINK.captures_iter(body) {
        let title = &caps[1];
        if seen.insert(title_key(title)) {
            titles.push(title.to_string());
        }
    }

    titles
}

/// The titles one body references, in first-occurrence order.
///
/// Equality is by value: two sets are equal when they list the same titles in
/// the same order with the same casing. The editor refetches its link pallet
/// only when this value changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkSet {
    titles: Vec<String>,
}

impl LinkSet {
    pub fn from_body(body: &str) -> Self {
        Self {
            titles: extract_links(body),
        }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, title: &str) -> bool {
        let key = title_key(title);
        self.titles.iter().any(|t| title_key(t) == key)
    }

    /// Render the set back into wiki-link markup, one reference per title.
    pub fn to_markup(&self) -> String {
        self.titles
            .iter()
            .map(|t| format!("[[{}]]", t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn into_titles(self) -> Vec<String> {
        self.titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_body() {
        assert!(extract_links("").is_empty());
    }

    #[test]
    fn test_unique_links_in_order() {
        let body = "This is a link to [[Page1]] and another link to [[Page2]]. \
                    Also, a repeated link to [[Page1]].";
        assert_eq!(extract_links(body), vec!["Page1", "Page2"]);
    }

    #[test]
    fn test_no_links() {
        assert!(extract_links("This is a text without any links.").is_empty());
    }

    #[test]
    fn test_case_insensitive_first_casing_wins() {
        assert_eq!(extract_links("Link to [[Page1]] and [[page1]]."), vec!["Page1"]);
        assert_eq!(extract_links("[[A]] text [[B]] more [[a]]"), vec!["A", "B"]);
    }

    #[test]
    fn test_unicode_case_folding() {
        assert_eq!(extract_links("[[Überblick]] [[überblick]]"), vec!["Überblick"]);
        assert_eq!(extract_links("[[日本語]] [[日本語]]"), vec!["日本語"]);
    }

    #[test]
    fn test_unterminated_and_empty_markers() {
        assert!(extract_links("[[never closed").is_empty());
        assert!(extract_links("[[]]").is_empty());
        assert_eq!(extract_links("[[open [[Closed]]"), vec!["Closed"]);
        assert_eq!(extract_links("[[[Nested]]]"), vec!["Nested"]);
    }

    #[test]
    fn test_link_must_close_on_same_line() {
        assert!(extract_links("[[Split\nTitle]]").is_empty());
        assert_eq!(extract_links("[[One]]\n[[Two]]"), vec!["One", "Two"]);
    }

    #[test]
    fn test_adjacent_links() {
        assert_eq!(extract_links("[[A]][[B]]"), vec!["A", "B"]);
    }

    #[test]
    fn test_adversarial_brackets_are_linear() {
        let body = "[[".repeat(200_000);
        assert!(extract_links(&body).is_empty());
        let body = format!("{}[[Tail]]", "[".repeat(100_000));
        assert_eq!(extract_links(&body), vec!["Tail"]);
    }

    #[test]
    fn test_link_set_equality_is_by_value() {
        let a = LinkSet::from_body("intro [[X]] and [[Y]]");
        let b = LinkSet::from_body("rewritten prose, still [[X]] then [[Y]] [[x]]");
        assert_eq!(a, b);
        assert_ne!(a, LinkSet::from_body("[[X]]"));
        assert!(a.contains("y"));
        assert_eq!(a.to_markup(), "[[X]] [[Y]]");
    }

    proptest! {
        #[test]
        fn prop_extraction_is_stable_under_reextraction(body in "[a-zA-Z \\[\\]\n]{0,200}") {
            let first = LinkSet::from_body(&body);
            let again = LinkSet::from_body(&first.to_markup());
            prop_assert_eq!(first, again);
        }

        #[test]
        fn prop_titles_unique_ignoring_case(body in "(\\[\\[[a-cA-C]{1,2}\\]\\] ?){0,20}") {
            let titles = extract_links(&body);
            let keys: HashSet<_> = titles.iter().map(|t| title_key(t)).collect();
            prop_assert_eq!(keys.len(), titles.len());
        }
    }
}
