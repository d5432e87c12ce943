//! The selector-role tag vocabulary.
//!
//! These are the recognized annotation keys. Three of them
//! (`dSel`, `hSel`, `qSel`) name selectors the diagnostics verifier
//! cross-checks against the fetched page.

/// One recognized annotation key with its completion copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorRole {
    /// The tag key as typed in source.
    pub key: &'static str,
    /// Short label shown next to the completion item.
    pub detail: &'static str,
    /// Longer documentation shown in the completion popup.
    pub documentation: &'static str,
    /// Whether the verifier checks this key's value against the page.
    pub verified: bool,
}

/// Every recognized annotation key.
pub const SELECTOR_ROLES: &[SelectorRole] = &[
    SelectorRole {
        key: "dSel",
        detail: "data selector",
        documentation: "Selects the data column for the field.",
        verified: true,
    },
    SelectorRole {
        key: "hSel",
        detail: "header selector",
        documentation: "Selects the header row and column for the field. \
                        The header selection is removed from the data selection.",
        verified: true,
    },
    SelectorRole {
        key: "qSel",
        detail: "query selector",
        documentation: "Selects the data column for the field. \
                        The query selection is removed from the header selection.",
        verified: true,
    },
    SelectorRole {
        key: "must",
        detail: "must-be-present text",
        documentation: "Raw text that must be present in the page content.",
        verified: false,
    },
    SelectorRole {
        key: "ctl",
        detail: "control selector",
        documentation: "Controls how the document is parsed to produce the \
                        field's value.",
        verified: false,
    },
];

/// Returns the keys whose values the verifier checks against the page.
#[must_use]
pub fn selector_role_keys() -> impl Iterator<Item = &'static str> {
    SELECTOR_ROLES
        .iter()
        .filter(|role| role.verified)
        .map(|role| role.key)
}

/// Returns true when `key` is a verified selector-role key.
#[must_use]
pub fn is_selector_role(key: &str) -> bool {
    selector_role_keys().any(|role| role == key)
}
