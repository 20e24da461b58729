//! Tag Injector
//!
//! Idempotent, regex-driven insertion of the analytics container, widget
//! loader, tracking script, footer legal links and CTA marker into a site's
//! entry document. Markup that does not match a pattern is left unchanged.

use lander_core::models::TagFlags;
use regex::Captures;

use super::patterns::*;
use super::scan::scan_tags;

/// Result of running the injector over a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injected {
    pub html: String,
    /// Flags to record for the site. Analytics and tracking are always set
    /// because both are inserted when missing.
    pub flags: TagFlags,
}

/// Insert every missing snippet and, when `cta_url` is given, point the
/// marked CTA anchors at it
pub fn inject_tags(html: &str, cta_url: Option<&str>) -> Injected {
    let found = scan_tags(html);
    let mut html = html.to_string();

    if !found.analytics_tag {
        html = insert_after_first(&html, &HEAD_OPEN, ANALYTICS_HEAD_SNIPPET);
        html = insert_after_first(&html, &BODY_OPEN, ANALYTICS_BODY_SNIPPET);
    }

    let mut cta_marker = found.cta_marker;
    if !cta_marker {
        let (marked, count) = mark_line_cta_anchors(&html);
        if count > 0 {
            tracing::debug!(count, "Added CTA marker to LINE anchors");
            html = marked;
            cta_marker = true;
        }
    }

    if !WIDGET_LOADER.is_match(&html) {
        html = insert_before_body_close(&html, WIDGET_LOADER_SNIPPET);
    }

    if !found.tracking_script {
        html = insert_before_body_close(&html, TRACKING_SNIPPET);
    }

    if !FOOTER_LINKS.is_match(&html) {
        html = FOOTER_OPEN
            .replacen(&html, 1, |caps: &Captures| {
                format!("{}\n{}\n", &caps[1], FOOTER_LINKS_SNIPPET)
            })
            .into_owned();
    }

    if let Some(url) = cta_url {
        html = rewrite_cta_href(&html, url);
    }

    Injected {
        html,
        flags: TagFlags {
            analytics_tag: true,
            tracking_script: true,
            cta_marker,
        },
    }
}

fn insert_after_first(html: &str, pattern: &regex::Regex, snippet: &str) -> String {
    pattern
        .replacen(html, 1, |caps: &Captures| format!("{}\n{}", &caps[0], snippet))
        .into_owned()
}

fn insert_before_body_close(html: &str, snippet: &str) -> String {
    BODY_CLOSE
        .replacen(html, 1, |caps: &Captures| format!("{}\n{}", snippet, &caps[0]))
        .into_owned()
}

/// Add the CTA marker to LINE-looking anchors that carry no `data-cats` yet
fn mark_line_cta_anchors(html: &str) -> (String, usize) {
    let mut count = 0;
    let marked = ANCHOR_OPEN.replace_all(html, |caps: &Captures| {
        let tag = &caps[0];
        let attributes = &caps[1];
        if ANY_DATA_CATS.is_match(attributes)
            || !LINE_CTA_HINTS.iter().any(|hint| hint.is_match(tag))
        {
            return tag.to_string();
        }
        count += 1;
        format!("<a {} {}{}>", attributes, CTA_MARKER_ATTRIBUTE, &caps[2])
    });
    (marked.into_owned(), count)
}

/// Replace the `href` of every marked anchor, wherever the marker sits
/// relative to `href` inside the tag
fn rewrite_cta_href(html: &str, cta_url: &str) -> String {
    let escaped = cta_url.replace('&', "&amp;").replace('"', "&quot;");
    ANCHOR_OPEN
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            if !CTA_MARKER.is_match(tag) {
                return tag.to_string();
            }
            HREF_ATTR
                .replace(tag, |href: &Captures| format!(r#"{}href="{}""#, &href[1], escaped))
                .into_owned()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "<html>\n<head>\n<title>LP</title>\n</head>\n<body class=\"lp\">\n<footer>\n<p>(c)</p>\n</footer>\n</body>\n</html>";

    #[test]
    fn test_injects_every_missing_snippet() {
        let out = inject_tags(PLAIN, None);

        assert!(out.html.contains("<head>\n<!-- Google Tag Manager -->"));
        assert!(out
            .html
            .contains("<body class=\"lp\">\n<!-- Google Tag Manager (noscript) -->"));
        assert!(out.html.contains(
            "<script src=\"/lp/widget-loader.js\" defer></script>\n<script src=\"/lp/tracking.js\"></script>\n</body>"
        ));
        assert!(out.html.contains("<footer>\n    <nav class=\"footer-links\">"));
        assert!(out.flags.analytics_tag);
        assert!(out.flags.tracking_script);
        assert!(!out.flags.cta_marker);
    }

    #[test]
    fn test_injection_is_idempotent() {
        let once = inject_tags(PLAIN, None);
        let twice = inject_tags(&once.html, None);
        assert_eq!(once.html, twice.html);
    }

    #[test]
    fn test_existing_tags_are_skipped() {
        let html = "<html><head><script src=\"https://www.googletagmanager.com/gtm.js?id=GTM-ABC123\"></script></head>\
                    <body><script src=\"/lp/tracking.js\"></script></body></html>";
        let out = inject_tags(html, None);

        assert_eq!(out.html.matches("googletagmanager.com").count(), 1);
        assert_eq!(out.html.matches("tracking.js").count(), 1);
        assert!(out.html.contains("widget-loader.js"));
    }

    #[test]
    fn test_header_element_is_not_mistaken_for_head() {
        let html = "<html><body><header class=\"top\"></header></body></html>";
        let out = inject_tags(html, None);
        assert!(out.html.starts_with("<html><body>\n<!-- Google Tag Manager (noscript) -->"));
        assert!(!out.html.contains("<header class=\"top\">\n<!--"));
    }

    #[test]
    fn test_marks_line_anchors() {
        let html = "<body><a href=\"https://lin.ee/abc\">Add</a><a class=\"btn btn-line\" href=\"#\">Go</a>\
                    <a href=\"/about\">About</a><a data-cats=\"other\" href=\"https://line.me/x\">x</a></body>";
        let out = inject_tags(html, None);

        assert_eq!(out.html.matches(CTA_MARKER_ATTRIBUTE).count(), 2);
        assert!(out.html.contains("<a href=\"/about\">"));
        assert!(out.html.contains("<a data-cats=\"other\" href=\"https://line.me/x\">"));
        assert!(out.flags.cta_marker);
    }

    #[test]
    fn test_cta_href_rewritten_with_marker_before_or_after_href() {
        let html = "<body>\
                    <a data-cats=\"lineFriendsFollowLink\" href=\"old\">A</a>\
                    <a href='old' class=\"cta\" data-cats=\"lineFriendsFollowLink\">B</a>\
                    <a href=\"keep\">C</a></body>";
        let out = inject_tags(html, Some("https://x.example/signup?a=1&b=2"));

        assert_eq!(
            out.html
                .matches("href=\"https://x.example/signup?a=1&amp;b=2\"")
                .count(),
            2
        );
        assert!(out.html.contains("<a href=\"keep\">"));
        assert!(!out.html.contains("old"));
    }

    #[test]
    fn test_cta_href_ignores_data_href() {
        let html = "<body><a data-cats=\"lineFriendsFollowLink\" data-href=\"x\" href=\"old\">A</a></body>";
        let out = inject_tags(html, Some("https://x.example/signup"));

        assert!(out.html.contains("data-href=\"x\""));
        assert!(out.html.contains(" href=\"https://x.example/signup\""));
        assert!(!out.html.contains("old"));
    }

    #[test]
    fn test_no_cta_anchor_is_noop_for_href() {
        let html = "<body><a href=\"/x\">x</a></body>";
        let out = inject_tags(html, Some("https://x.example/signup"));
        assert!(out.html.contains("<a href=\"/x\">"));
    }

    #[test]
    fn test_malformed_markup_degrades_gracefully() {
        let out = inject_tags("just some text", None);
        assert_eq!(out.html, "just some text");
        assert!(out.flags.analytics_tag);
    }
}
