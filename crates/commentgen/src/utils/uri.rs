/// Normalizes a service endpoint by trimming whitespace and every trailing slash.
///
/// Endpoints in the options blob are hand-typed, so `" https://host/path// "`
/// and `"https://host/path"` must address the same resource.
///
/// # Examples
/// ```
/// use commentgen::utils::uri::normalize_endpoint;
/// assert_eq!(normalize_endpoint(" https://api.example.com/v1/ "), "https://api.example.com/v1");
/// ```
pub fn normalize_endpoint<S>(url: S) -> String
where
    S: AsRef<str>,
{
    url.as_ref().trim().trim_end_matches('/').to_string()
}

/// Returns true when `url` looks like an absolute http(s) URL.
pub fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}
