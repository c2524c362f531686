use crate::url::{parse_target, ParsedTarget};
use url::Url;

/// Extracts the authority (`host[:port]`) from an absolute URL
///
/// The host is lowercased and default ports are dropped, so
/// `https://MD.example.com:443/x` and `https://md.example.com/y` share an
/// origin. Returns `None` for relative or unparseable URLs.
///
/// # Examples
///
/// ```
/// use medusa::url::origin_of;
///
/// assert_eq!(origin_of("https://md.example.com/pad"), Some("md.example.com".to_string()));
/// assert_eq!(origin_of("http://localhost:3000/pad"), Some("localhost:3000".to_string()));
/// assert_eq!(origin_of("/pad"), None);
/// ```
pub fn origin_of(url: &str) -> Option<String> {
    match parse_target(url.trim()).ok()? {
        ParsedTarget::Absolute(parsed) => authority(&parsed),
        ParsedTarget::Relative(_) => None,
    }
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true if `url` points at the same server as `root`
///
/// Relative links are always internal. Protocol-relative links (`//host/x`)
/// are resolved against `root` first, so they only count when their host
/// matches.
pub fn is_same_origin(url: &str, root: &str) -> bool {
    let Ok(root_url) = Url::parse(root.trim()) else {
        return false;
    };
    let Some(root_authority) = authority(&root_url) else {
        return false;
    };

    let url = url.trim();
    match parse_target(url) {
        Ok(ParsedTarget::Absolute(parsed)) => {
            authority(&parsed).as_deref() == Some(root_authority.as_str())
        }
        Ok(ParsedTarget::Relative(_)) => match root_url.join(url) {
            Ok(resolved) => authority(&resolved).as_deref() == Some(root_authority.as_str()),
            Err(_) => false,
        },
        Err(_) => false,
    }
}
