//! Website normalizer
//!
//! Trims the value, drops placeholders, prepends `https://` when no scheme is
//! given and keeps the result only if it parses as an absolute http(s) URL
//! with a dotted host. The cleaned text is stored as written (no trailing
//! slash added).

use super::{clean, Normalized, Provenance};
use url::Url;

/// Values that mean "no website"
const WEBSITE_PLACEHOLDERS: &[&str] = &["n/a", "na", "tbd", "none", "null", "-", "unknown"];

/// Normalize a website field
pub fn normalize_website(raw: Option<&str>) -> Normalized<String> {
    let text = match clean(raw) {
        Some(text) => text,
        None => return Normalized::missing(None),
    };

    let lower = text.to_lowercase();
    if WEBSITE_PLACEHOLDERS.contains(&lower.as_str()) {
        return Normalized::missing(Some(format!("placeholder website '{}'", text)));
    }

    let (candidate, provenance) = if text.contains("://") {
        (text.to_string(), Provenance::Given)
    } else {
        (format!("https://{}", text), Provenance::Inferred)
    };

    if is_absolute_web_url(&candidate) {
        Normalized {
            value: Some(candidate),
            note: None,
            provenance,
        }
    } else {
        Normalized::missing(Some(format!("invalid website '{}'", text)))
    }
}

fn is_absolute_web_url(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.username().is_empty()
                && url.password().is_none()
                && url.host_str().map_or(false, |host| host.contains('.'))
        }
        Err(_) => false,
    }
}

/// Scheme and host of a normalized website (`https://example.org`)
pub fn website_origin(website: &str) -> Option<String> {
    let url = Url::parse(website).ok()?;
    let origin = url.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}
