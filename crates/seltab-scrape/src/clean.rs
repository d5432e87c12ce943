//! Ignore-list cleaning.
//!
//! Ignored subtrees are detached before any selector enumeration so they
//! never contribute selectors or match counts.

use scraper::Html;

/// Elements stripped when a declaration supplies no ignore-list of its own.
pub const DEFAULT_IGNORE_ELEMENTS: &[&str] = &["script", "style", "link", "img", "footer", "header"];

/// Parses `html` and removes every element whose tag name is in `ignore`.
///
/// An empty `ignore` list falls back to [`DEFAULT_IGNORE_ELEMENTS`].
/// Tag names compare case-insensitively.
#[must_use]
pub fn clean_document<S: AsRef<str>>(html: &str, ignore: &[S]) -> Html {
    let ignored: Vec<&str> = if ignore.is_empty() {
        DEFAULT_IGNORE_ELEMENTS.to_vec()
    } else {
        ignore.iter().map(AsRef::as_ref).collect()
    };

    let mut document = Html::parse_document(html);
    let doomed: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| {
            node.value().as_element().is_some_and(|element| {
                ignored
                    .iter()
                    .any(|name| element.name().eq_ignore_ascii_case(name))
            })
        })
        .map(|node| node.id())
        .collect();
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn count(document: &Html, selector: &str) -> usize {
        let selector = Selector::parse(selector).expect("selector");
        document.select(&selector).count()
    }

    #[test]
    fn removes_ignored_elements_and_their_subtrees() {
        let html = "<div><script>var x;</script><footer><a href=\"#\">x</a></footer>\
                    <table><tr><td>1</td></tr></table></div>";
        let document = clean_document(html, &["script", "footer"]);
        assert_eq!(count(&document, "script"), 0);
        assert_eq!(count(&document, "footer"), 0);
        assert_eq!(count(&document, "footer a"), 0);
        assert_eq!(count(&document, "td"), 1);
    }

    #[test]
    fn empty_ignore_list_uses_defaults() {
        let html = "<div><style>p{}</style><img src=\"x.png\"><p>kept</p></div>";
        let document = clean_document::<&str>(html, &[]);
        assert_eq!(count(&document, "style"), 0);
        assert_eq!(count(&document, "img"), 0);
        assert_eq!(count(&document, "p"), 1);
    }

    #[test]
    fn tag_names_match_case_insensitively() {
        let html = "<div><SCRIPT>var x;</SCRIPT><p>kept</p></div>";
        let document = clean_document(html, &["script"]);
        assert_eq!(count(&document, "script"), 0);
        assert_eq!(count(&document, "p"), 1);
    }
}
