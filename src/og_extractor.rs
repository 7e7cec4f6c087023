//! Social preview image extraction from HTML content.
//!
//! Markup inspection only: the document is parsed, never executed.

use scraper::{Html, Selector};
use url::Url;

/// Preview image candidates found in a page's `<meta>` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTags {
    /// `og:image`
    pub og_image: Option<String>,
    /// `twitter:image`, declared with either `name` or `property`
    pub twitter_image: Option<String>,
    /// `og:image:url`, the structured-property form of `og:image`
    pub og_image_url: Option<String>,
}

impl PreviewTags {
    /// Check if no candidate was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.og_image.is_none() && self.twitter_image.is_none() && self.og_image_url.is_none()
    }

    /// Candidates in priority order, regardless of document order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        [&self.og_image, &self.twitter_image, &self.og_image_url]
            .into_iter()
            .filter_map(Option::as_deref)
    }

    /// First candidate in priority order.
    #[must_use]
    pub fn best(&self) -> Option<&str> {
        self.candidates().next()
    }
}

/// Extract preview image candidates from HTML content.
///
/// The first non-empty occurrence of each tag wins.
#[must_use]
pub fn extract_preview_tags(html: &str) -> PreviewTags {
    let document = Html::parse_document(html);
    let Ok(meta_selector) = Selector::parse("meta[content]") else {
        return PreviewTags::default();
    };

    let mut tags = PreviewTags::default();

    for element in document.select(&meta_selector) {
        let value = element.value();
        let key = value
            .attr("property")
            .or_else(|| value.attr("name"))
            .map(|k| k.trim().to_lowercase());
        let Some(key) = key else { continue };

        let content = value.attr("content").map(str::trim).unwrap_or_default();
        if content.is_empty() {
            continue;
        }

        let slot = match key.as_str() {
            "og:image" => &mut tags.og_image,
            "twitter:image" | "twitter:image:src" => &mut tags.twitter_image,
            "og:image:url" => &mut tags.og_image_url,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(content.to_string());
        }
    }

    tags
}

/// Resolve a possibly relative image reference against the page URL.
///
/// Only http(s) results are returned; `data:` and other schemes are ignored.
#[must_use]
pub fn absolutize(base: &Url, image: &str) -> Option<String> {
    let joined = base.join(image).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Best usable preview image of a page as an absolute URL.
///
/// A candidate that does not resolve to http(s) is skipped in favour of the
/// next one.
#[must_use]
pub fn extract_preview_image(html: &str, base: &Url) -> Option<String> {
    extract_preview_tags(html)
        .candidates()
        .find_map(|image| absolutize(base, image))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/receitas/bolsa").unwrap()
    }

    #[test]
    fn test_extract_all_tags() {
        let html = r#"
            <html>
                <head>
                    <meta property="og:image" content="https://cdn.example.com/og.jpg">
                    <meta name="twitter:image" content="https://cdn.example.com/tw.jpg">
                    <meta property="og:image:url" content="https://cdn.example.com/url.jpg">
                </head>
            </html>
        "#;

        let tags = extract_preview_tags(html);
        assert_eq!(tags.og_image.as_deref(), Some("https://cdn.example.com/og.jpg"));
        assert_eq!(tags.twitter_image.as_deref(), Some("https://cdn.example.com/tw.jpg"));
        assert_eq!(tags.og_image_url.as_deref(), Some("https://cdn.example.com/url.jpg"));
        assert_eq!(tags.best(), Some("https://cdn.example.com/og.jpg"));
    }

    #[test]
    fn test_priority_ignores_document_order() {
        let html = r#"
            <head>
                <meta property="og:image:url" content="/url.jpg">
                <meta name="twitter:image" content="/tw.jpg">
            </head>
        "#;

        assert_eq!(extract_preview_tags(html).best(), Some("/tw.jpg"));
        assert_eq!(
            extract_preview_image(html, &base()).as_deref(),
            Some("https://example.com/tw.jpg")
        );
    }

    #[test]
    fn test_twitter_image_as_property() {
        let html = r#"<meta property="twitter:image" content="https://x.example/t.png">"#;
        assert_eq!(
            extract_preview_tags(html).twitter_image.as_deref(),
            Some("https://x.example/t.png")
        );
    }

    #[test]
    fn test_no_preview_tags() {
        let html = r#"
            <html>
                <head>
                    <title>Regular Title</title>
                    <meta name="description" content="Regular meta description">
                    <link rel="image_src" href="/ignored.png">
                </head>
            </html>
        "#;

        let tags = extract_preview_tags(html);
        assert!(tags.is_empty());
        assert_eq!(extract_preview_image(html, &base()), None);
    }

    #[test]
    fn test_empty_content_skipped() {
        let html = r#"
            <meta property="og:image" content="  ">
            <meta property="og:image" content="/second.png">
        "#;

        assert_eq!(
            extract_preview_tags(html).og_image.as_deref(),
            Some("/second.png")
        );
    }

    #[test]
    fn test_absolutize_relative_paths() {
        assert_eq!(
            absolutize(&base(), "/img/capa.png").as_deref(),
            Some("https://example.com/img/capa.png")
        );
        assert_eq!(
            absolutize(&base(), "capa.png").as_deref(),
            Some("https://example.com/receitas/capa.png")
        );
        assert_eq!(
            absolutize(&base(), "//cdn.example.net/a.png").as_deref(),
            Some("https://cdn.example.net/a.png")
        );
    }

    #[test]
    fn test_unusable_primary_tag_falls_back() {
        let html = r#"
            <meta property="og:image" content="data:image/png;base64,AAAA">
            <meta name="twitter:image" content="/tw.png">
        "#;
        assert_eq!(
            extract_preview_image(html, &base()).as_deref(),
            Some("https://example.com/tw.png")
        );

        let html = r#"
            <meta property="og:image" content="javascript:alert(1)">
            <meta name="twitter:image" content="data:,x">
            <meta property="og:image:url" content="https://cdn.example.com/url.jpg">
        "#;
        assert_eq!(
            extract_preview_image(html, &base()).as_deref(),
            Some("https://cdn.example.com/url.jpg")
        );

        let html = r#"<meta property="og:image" content="data:,x">"#;
        assert_eq!(extract_preview_image(html, &base()), None);
    }

    #[test]
    fn test_absolutize_rejects_non_http() {
        assert_eq!(absolutize(&base(), "data:image/png;base64,AAAA"), None);
        assert_eq!(absolutize(&base(), "javascript:alert(1)"), None);
    }
}
