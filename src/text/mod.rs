//! Text normalization for extracted page content
//!
//! Two pure passes are applied to the raw text collected from a page:
//! - [`extract_strings`] collapses line structure into a single line
//! - [`clean_content`] drops blacklisted words and characters and lowercases the rest

mod normalize;

pub use normalize::{
    clean_content, extract_strings, normalize, BLACKLISTED_CHARS, BLACKLISTED_WORDS,
};
