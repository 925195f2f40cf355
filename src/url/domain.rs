use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use link_sentry::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the authority (host plus any explicit non-default port)
///
/// Two URLs belong to the same site when their authorities are equal. A
/// default port is dropped by the parser, so `https://a.com:443/` and
/// `https://a.com/` compare equal while `http://a.com:8080/` does not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use link_sentry::url::extract_authority;
///
/// let url = Url::parse("http://Example.com:8080/").unwrap();
/// assert_eq!(extract_authority(&url), Some("example.com:8080".to_string()));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let domain = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", domain, port),
        None => domain,
    })
}

/// Returns true when `url` and `start_url` share the same authority
///
/// Unparseable URLs never match.
pub fn is_same_domain(url: &str, start_url: &str) -> bool {
    match (Url::parse(url), Url::parse(start_url)) {
        (Ok(url), Ok(start)) => {
            let authority = extract_authority(&url);
            authority.is_some() && authority == extract_authority(&start)
        }
        _ => false,
    }
}
