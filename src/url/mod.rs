//! URL handling module
//!
//! This module turns anchor `href` values into absolute URLs the crawler can follow.

mod resolve;

pub use resolve::resolve_link;
