/// Strips the query string and fragment from a URL
///
/// Scheme, authority and path are kept byte for byte. Neither `?` nor `#` may
/// appear unescaped before the query in a valid URL, so cutting at the first
/// of them is enough and works for relative targets as well.
///
/// # Examples
///
/// ```
/// use medusa::url::clean_url;
///
/// assert_eq!(clean_url("https://md.example.com/pad?both#top"), "https://md.example.com/pad");
/// assert_eq!(clean_url("/pad#section"), "/pad");
/// ```
pub fn clean_url(raw: &str) -> String {
    let raw = raw.trim();
    match raw.find(&['?', '#'][..]) {
        Some(index) => raw[..index].to_string(),
        None => raw.to_string(),
    }
}
