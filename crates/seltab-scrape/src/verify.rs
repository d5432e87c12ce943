//! Selector verification against a cached page.

use scraper::{Html, Selector};

/// The outcome of checking one selector against one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The selector matched this many elements.
    Match(usize),
    /// The selector is valid but matched nothing: the page moved on or the
    /// selector points at the wrong place.
    NoMatch,
    /// The selector itself failed to parse: an authoring error, not a
    /// stale target.
    LookupFailed(String),
}

impl Verification {
    /// Returns true when at least one element matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match(_))
    }
}

/// Checks `selector` against `html`.
#[must_use]
pub fn verify_selector(html: &str, selector: &str) -> Verification {
    let parsed = match Selector::parse(selector) {
        Ok(parsed) => parsed,
        Err(error) => return Verification::LookupFailed(error.to_string()),
    };
    let document = Html::parse_document(html);
    match document.select(&parsed).count() {
        0 => Verification::NoMatch,
        count => Verification::Match(count),
    }
}

/// The serialized HTML of the first element `selector` matches in `html`,
/// for display next to a verification result.
#[must_use]
pub fn first_match_html(html: &str, selector: &str) -> Option<String> {
    let parsed = Selector::parse(selector).ok()?;
    let document = Html::parse_document(html);
    document.select(&parsed).next().map(|element| element.html())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<table><tr><td>x</td></tr></table>";

    #[test]
    fn matching_selector_reports_count() {
        assert_eq!(verify_selector(PAGE, "table tr td"), Verification::Match(1));
    }

    #[test]
    fn stale_selector_is_no_match() {
        assert_eq!(verify_selector(PAGE, "table tr th"), Verification::NoMatch);
    }

    #[test]
    fn malformed_selector_is_a_lookup_failure() {
        assert!(matches!(
            verify_selector(PAGE, "td[["),
            Verification::LookupFailed(_)
        ));
    }

    #[test]
    fn first_match_html_returns_the_element() {
        assert_eq!(
            first_match_html(PAGE, "table tr td").as_deref(),
            Some("<td>x</td>")
        );
        assert!(first_match_html(PAGE, "table tr th").is_none());
        assert!(first_match_html(PAGE, "td[[").is_none());
    }
}
