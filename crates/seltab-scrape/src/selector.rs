//! Selector enumeration.
//!
//! Every element in a cleaned document contributes one path-qualified
//! selector: its own single-node selector appended to its parent's path
//! with the child combinator. The single-node selector prefers the most
//! specific stable discriminator the element offers.

use rustc_hash::FxHashSet;
use scraper::{ElementRef, Html};

const CHILD_SEPARATOR: &str = ">";

/// Attribute values carrying this token are CMS boilerplate that churns
/// between fetches; they are excluded from selector construction.
const NOISE_TOKEN: &str = "content";

/// Enumerates every distinct selector path in the document, in first-seen
/// order.
#[must_use]
pub fn enumerate_selectors(document: &Html) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut selectors = Vec::new();
    for node in document.tree.nodes() {
        if let Some(element) = ElementRef::wrap(node) {
            let path = selector_path(element);
            if !path.is_empty() && seen.insert(path.clone()) {
                selectors.push(path);
            }
        }
    }
    selectors
}

/// Builds the path-qualified selector for one element.
///
/// The parent path is computed recursively; a child whose own selector
/// equals the whole parent path contributes no duplicate segment.
fn selector_path(element: ElementRef) -> String {
    let current = single_selector(element);
    let parent = element
        .parent()
        .and_then(ElementRef::wrap)
        .map(selector_path)
        .unwrap_or_default();

    if !parent.is_empty() && !current.is_empty() && parent != current {
        format!("{parent}{CHILD_SEPARATOR}{current}")
    } else if !parent.is_empty() && current.is_empty() {
        parent
    } else {
        current
    }
}

/// The single-node selector: `id`, then class, then the discriminating
/// attributes, then a bare `[href]` marker, falling back to the tag name.
fn single_selector(element: ElementRef) -> String {
    let name = element.value().name();

    if let Some(id) = stable_attr(element, "id") {
        return format!("{name}#{id}");
    }
    if let Some(class) = stable_attr(element, "class") {
        let classes: Vec<_> = class.split_whitespace().collect();
        return format!("{name}.{}", classes.join("."));
    }
    if let Some(value) = stable_attr(element, "name") {
        return format!("{name}[name='{value}']");
    }
    for attr in ["type", "placeholder", "value", "src"] {
        if let Some(value) = element.attr(attr) {
            return format!("{name}[{attr}='{value}']");
        }
    }
    if element.attr("href").is_some() {
        return format!("{name}[href]");
    }
    name.to_string()
}

/// Returns the attribute when it is present, non-empty, and free of the
/// noise token.
fn stable_attr<'a>(element: ElementRef<'a>, attr: &str) -> Option<&'a str> {
    let value = element.attr(attr)?;
    if value.trim().is_empty() {
        return None;
    }
    let joined: Vec<_> = value.split_whitespace().collect();
    if joined.join(".").contains(NOISE_TOKEN) {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors_of(html: &str) -> Vec<String> {
        enumerate_selectors(&Html::parse_document(html))
    }

    #[test]
    fn id_wins_over_class_and_attributes() {
        let selectors = selectors_of("<p id=\"lead\" class=\"intro\">x</p>");
        assert!(selectors.iter().any(|s| s.ends_with("p#lead")), "{selectors:?}");
    }

    #[test]
    fn class_selector_joins_multiple_classes() {
        let selectors = selectors_of("<span class=\"a b\">x</span>");
        assert!(selectors.iter().any(|s| s.ends_with("span.a.b")), "{selectors:?}");
    }

    #[test]
    fn name_attribute_wins_over_type() {
        let selectors = selectors_of("<input type=\"text\" name=\"q\">");
        assert!(
            selectors.iter().any(|s| s.ends_with("input[name='q']")),
            "{selectors:?}"
        );
    }

    #[test]
    fn href_presence_is_a_bare_marker() {
        let selectors = selectors_of("<a href=\"/somewhere\">x</a>");
        assert!(selectors.iter().any(|s| s.ends_with("a[href]")), "{selectors:?}");
    }

    #[test]
    fn noisy_attribute_values_fall_through() {
        let selectors = selectors_of("<div id=\"content-main\">x</div>");
        assert!(
            selectors.iter().any(|s| s.ends_with("body>div")),
            "{selectors:?}"
        );
        assert!(!selectors.iter().any(|s| s.contains("content-main")));
    }

    #[test]
    fn paths_are_parent_qualified_and_deduplicated() {
        let selectors = selectors_of("<ul><li>a</li><li>b</li></ul>");
        let li_paths: Vec<_> = selectors.iter().filter(|s| s.ends_with("li")).collect();
        assert_eq!(li_paths.len(), 1, "{selectors:?}");
        assert_eq!(li_paths[0], "html>body>ul>li");
    }

    #[test]
    fn table_paths_include_parser_inserted_tbody() {
        let selectors = selectors_of("<table><tr><td>x</td></tr></table>");
        assert!(
            selectors
                .iter()
                .any(|s| s == "html>body>table>tbody>tr>td"),
            "{selectors:?}"
        );
    }
}
