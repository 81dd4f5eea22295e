use url::Url;

const FALLBACK_ATTR: &str = "data-original";

/// Prefix `https://` unless the website already names an http(s) scheme.
pub fn with_scheme(website: &str) -> String {
    let website = website.trim();
    let lower = website.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{}", website)
    }
}

/// Absolute URL with a network scheme and a host.
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https" | "ftp")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Turn an `<img src>` value into a usable absolute URL.
///
/// Protocol-relative sources get `https:` prepended. Anything else that does
/// not validate falls back to the element's `data-original` attribute, which
/// is consulted at most once. When nothing usable turns up a warning is logged
/// and the last candidate is returned as-is: callers must tolerate invalid
/// URLs downstream.
pub fn normalize_image_url(src: &str, data_original: Option<&str>) -> String {
    if is_valid_url(src) {
        return src.to_string();
    }
    if src.starts_with("//") {
        return format!("https:{}", src);
    }
    match data_original {
        Some(fallback) => {
            tracing::debug!(src, fallback, "src unusable, trying {}", FALLBACK_ATTR);
            normalize_image_url(fallback, None)
        }
        None => {
            tracing::warn!(src, "could not get a valid url for image");
            src.to_string()
        }
    }
}
