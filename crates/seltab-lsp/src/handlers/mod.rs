//! Request and notification handlers.
//! - sync: document open/change/close/save
//! - completion: zone-driven completion items
//! - hover: cached-page selector hover
//! - code_action: quickfixes for failing selector tags
//! - diagnostics: selector verification against the cached page
//! - util: range conversion and snippet helpers

mod code_action;
mod completion;
mod diagnostics;
mod hover;
mod sync;
mod util;

pub use code_action::code_action;
pub use completion::completion;
pub use diagnostics::{compute_diagnostics, DIAGNOSTIC_SOURCE};
pub use hover::hover;
pub use sync::{did_change, did_close, did_open, did_save};
