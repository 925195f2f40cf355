use crate::UrlError;
use url::Url;

/// Produces the canonical form of a URL, used as the deduplication key
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Lowercase the scheme and the host
/// 3. Remove the fragment (everything after #)
///
/// Path, query and parameters are preserved as written, so
/// `/Page?b=2&a=1` and `/page?a=1&b=2` stay distinct.
///
/// # Arguments
///
/// * `url_str` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(String)` - Canonical URL string
/// * `Err(UrlError)` - The URL could not be parsed
///
/// # Examples
///
/// ```
/// use link_sentry::url::canonicalize;
///
/// let a = canonicalize("HTTPS://Example.COM/About#team").unwrap();
/// let b = canonicalize("https://example.com/About").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize(url_str: &str) -> Result<String, UrlError> {
    // The parser already lowercases scheme and host for http(s)
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(UrlError::InvalidScheme(format!(
            "Not a hierarchical URL: {}",
            url_str
        )));
    }

    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            url.set_host(Some(&lowered))
                .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;
        }
    }

    url.set_fragment(None);

    Ok(url.into())
}
