//! Image URL resolution.
//!
//! Product, category and avatar images arrive as bare file names
//! (`brake-pad.jpg`), server paths (`/uploads/brake-pad.jpg`) or absolute
//! URLs. Everything is turned into something a browser can load.

use url::Url;

/// Shown when a record has no image.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

const UPLOADS_PREFIX: &str = "/uploads/";

/// Resolve an image reference against the API origin.
///
/// | input                         | result                               |
/// |-------------------------------|--------------------------------------|
/// | `None`, empty, whitespace     | [`PLACEHOLDER_IMAGE`]                |
/// | `http://...`, `https://...`   | unchanged                            |
/// | `/uploads/a.jpg`, `/x/a.jpg`  | `{origin}/uploads/a.jpg`, `{origin}/x/a.jpg` |
/// | `a.jpg`                       | `{origin}/uploads/a.jpg`             |
#[must_use]
pub fn resolve_image_url(base: &Url, raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return PLACEHOLDER_IMAGE.to_string();
    };

    if is_absolute(raw) {
        return raw.to_string();
    }

    let origin = base.origin().ascii_serialization();
    if raw.starts_with('/') {
        format!("{origin}{raw}")
    } else {
        format!("{origin}{UPLOADS_PREFIX}{raw}")
    }
}

fn is_absolute(raw: &str) -> bool {
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.motoparts.test/api/").unwrap()
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        assert_eq!(resolve_image_url(&base(), None), PLACEHOLDER_IMAGE);
        assert_eq!(resolve_image_url(&base(), Some("")), PLACEHOLDER_IMAGE);
        assert_eq!(resolve_image_url(&base(), Some("   ")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        let cdn = "https://cdn.example.com/p/1.jpg";
        assert_eq!(resolve_image_url(&base(), Some(cdn)), cdn);
        assert_eq!(
            resolve_image_url(&base(), Some("HTTP://old.example.com/a.png")),
            "HTTP://old.example.com/a.png"
        );
    }

    #[test]
    fn test_paths_resolve_against_origin() {
        assert_eq!(
            resolve_image_url(&base(), Some("/uploads/pads.jpg")),
            "https://api.motoparts.test/uploads/pads.jpg"
        );
        assert_eq!(
            resolve_image_url(&base(), Some("/static/logo.svg")),
            "https://api.motoparts.test/static/logo.svg"
        );
    }

    #[test]
    fn test_bare_names_go_under_uploads() {
        assert_eq!(
            resolve_image_url(&base(), Some("pads.jpg")),
            "https://api.motoparts.test/uploads/pads.jpg"
        );

        let local = Url::parse("http://localhost:5000/").unwrap();
        assert_eq!(
            resolve_image_url(&local, Some("a.png")),
            "http://localhost:5000/uploads/a.png"
        );
    }
}
