//! Warning services.
//!
//! - [`WarnContentService`] persists the shared text of a warning event.
//! - [`WarnFanoutService`] resolves recipients and writes one row per user.
//! - [`WarnQueryService`] reads a user's warning history.
//!
//! None of them hold state between calls; collaborators are injected at
//! construction time.

pub mod content;
pub mod fanout;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use content::WarnContentService;
pub use fanout::{FanoutOutcome, WarnFanoutService};
pub use query::WarnQueryService;
