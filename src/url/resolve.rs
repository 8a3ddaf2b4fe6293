use url::{ParseError, Url};

/// Resolves an anchor `href` found on `page_url` into an absolute URL
///
/// # Resolution Rules
///
/// Applied in order:
///
/// 1. Fragment-only hrefs (`#section`) are rejected
/// 2. The page URL must parse as an absolute URL and the href must be a valid URL reference
/// 3. Protocol-relative hrefs (`//host/path`) take the page's scheme
/// 4. Relative references (`/path`, `page.html`) are rejected
/// 5. Absolute hrefs are returned unchanged
///
/// Relative references are deliberately not joined against the page URL.
///
/// # Arguments
///
/// * `href` - The raw attribute value
/// * `page_url` - The URL of the page the href was found on
///
/// # Returns
///
/// * `Some(String)` - An absolute URL to crawl
/// * `None` - The href was rejected
///
/// # Examples
///
/// ```
/// use asura_crow::url::resolve_link;
///
/// let page = "https://example.com/index.html";
/// assert_eq!(resolve_link("#top", page), None);
/// assert_eq!(resolve_link("/about", page), None);
/// assert_eq!(
///     resolve_link("//cdn.example.com/a", page).as_deref(),
///     Some("https://cdn.example.com/a")
/// );
/// assert_eq!(
///     resolve_link("https://other.org/x?y=1", page).as_deref(),
///     Some("https://other.org/x?y=1")
/// );
/// ```
pub fn resolve_link(href: &str, page_url: &str) -> Option<String> {
    if href.starts_with('#') {
        return None;
    }

    let page = Url::parse(page_url).ok()?;

    if href.starts_with("//") {
        let absolute = format!("{}:{}", page.scheme(), href);
        return Url::parse(&absolute).ok().map(|_| absolute);
    }

    match Url::parse(href) {
        Ok(_) => Some(href.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => {
            tracing::trace!("Skipping relative link {} on {}", href, page_url);
            None
        }
        Err(_) => None,
    }
}
