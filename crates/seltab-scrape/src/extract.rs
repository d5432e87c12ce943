//! The extraction cycle: cache check, fetch, clean, enumerate, persist.

use scraper::{ElementRef, Selector};
use tracing::{debug, trace};

use crate::clean::clean_document;
use crate::error::ExtractError;
use crate::fetch::Fetcher;
use crate::selector::enumerate_selectors;
use crate::store::{SelectorRecord, SelectorStore};

/// One selector discovered during extraction, with its live match count
/// and context snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSelector {
    /// The path-qualified selector.
    pub value: String,
    /// How many elements it matches in the cleaned document.
    pub occurrences: i64,
    /// Inner HTML of the first match's parent.
    pub context: String,
}

/// The product of cleaning and enumerating one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// The cleaned document, serialized.
    pub cleaned_html: String,
    /// Every discovered selector.
    pub selectors: Vec<DiscoveredSelector>,
}

/// Cleans `html` and enumerates its selectors with match counts.
///
/// Purely CPU-bound; the caller persists the result. `url` is only used
/// for error context.
///
/// # Errors
///
/// [`ExtractError::NoSelectors`] when the cleaned document contains no
/// selectable elements.
pub fn extract_page<S: AsRef<str>>(
    html: &str,
    url: &str,
    ignore: &[S],
) -> Result<ExtractedPage, ExtractError> {
    let document = clean_document(html, ignore);
    let cleaned_html = document.html();

    let mut selectors = Vec::new();
    for path in enumerate_selectors(&document) {
        let Ok(parsed) = Selector::parse(&path) else {
            trace!(selector = %path, "discovered selector does not parse, skipping");
            continue;
        };
        let mut matches = document.select(&parsed);
        let Some(first) = matches.next() else {
            continue;
        };
        let occurrences = 1 + matches.count();
        let context = first
            .parent()
            .and_then(ElementRef::wrap)
            .map_or_else(|| first.html(), |parent| parent.inner_html());
        selectors.push(DiscoveredSelector {
            value: path,
            occurrences: occurrences as i64,
            context: context.trim().to_string(),
        });
    }

    if selectors.is_empty() {
        return Err(ExtractError::NoSelectors {
            url: url.to_string(),
        });
    }
    Ok(ExtractedPage {
        cleaned_html,
        selectors,
    })
}

/// Returns the selectors for `url` meeting `min_occurrences`.
///
/// A warm cache answers without fetching; a cold cache fetches exactly
/// once, persists everything discovered (regardless of threshold, so a
/// later caller with a lower threshold also avoids the network), and
/// returns the selectors that meet the threshold.
///
/// # Errors
///
/// Fetch and store failures propagate; nothing is persisted on a failed
/// fetch. An empty cleaned document is [`ExtractError::NoSelectors`].
pub async fn get_selectors(
    store: &SelectorStore,
    fetcher: &dyn Fetcher,
    url: &str,
    ignore: &[String],
    min_occurrences: i64,
) -> Result<Vec<SelectorRecord>, ExtractError> {
    let cached = store
        .selectors_by_min_occurrence(url, min_occurrences)
        .await?;
    if !cached.is_empty() {
        return Ok(cached);
    }

    debug!(url, "selector cache miss, fetching");
    let body = fetcher.fetch(url).await?;
    let page = extract_page(&body, url, ignore)?;
    store
        .persist_extraction(url, &page.cleaned_html, &page.selectors)
        .await?;

    Ok(page
        .selectors
        .into_iter()
        .filter(|selector| selector.occurrences >= min_occurrences)
        .map(|selector| SelectorRecord {
            url: url.to_string(),
            value: selector.value,
            occurrences: selector.occurrences,
            context: selector.context,
        })
        .collect())
}

/// Returns the cleaned page for `url`, fetching and persisting it only
/// when the cache has never seen the URL.
///
/// # Errors
///
/// Same failure modes as [`get_selectors`].
pub async fn ensure_page(
    store: &SelectorStore,
    fetcher: &dyn Fetcher,
    url: &str,
    ignore: &[String],
) -> Result<String, ExtractError> {
    if let Some(html) = store.html_for_url(url).await? {
        return Ok(html);
    }
    debug!(url, "page cache miss, fetching");
    let body = fetcher.fetch(url).await?;
    let page = extract_page(&body, url, ignore)?;
    store
        .persist_extraction(url, &page.cleaned_html, &page.selectors)
        .await?;
    Ok(page.cleaned_html)
}
