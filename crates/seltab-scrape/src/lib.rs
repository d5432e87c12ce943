//! `seltab-scrape` - Page fetching, CSS selector discovery, and the
//! selector cache.
//!
//! Given a target URL and an ignore-list, this crate produces the full set
//! of CSS selectors reachable in the page, each annotated with its match
//! count and a human-readable context snippet, while guaranteeing at most
//! one network fetch per URL:
//!
//! 1. A warm cache answers from SQLite without touching the network.
//! 2. A cold cache fetches once, strips ignored elements, enumerates every
//!    selector path in the cleaned document, and persists the page plus all
//!    discovered selectors in a single transaction.
//!
//! The verifier half ([`verify_selector`]) cross-checks a typed selector
//! against a cached page, distinguishing "matched nothing" from "the
//! selector itself does not parse".

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod clean;
mod error;
mod extract;
mod fetch;
mod selector;
mod store;
mod verify;

pub use clean::{clean_document, DEFAULT_IGNORE_ELEMENTS};
pub use error::{ExtractError, FetchError, StoreError};
pub use extract::{ensure_page, extract_page, get_selectors, DiscoveredSelector, ExtractedPage};
pub use fetch::{Fetcher, HttpFetcher};
pub use selector::enumerate_selectors;
pub use store::{SelectorRecord, SelectorStore};
pub use verify::{first_match_html, verify_selector, Verification};
