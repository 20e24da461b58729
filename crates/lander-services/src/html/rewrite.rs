//! Path Rewriter
//!
//! Turns relative asset references of the entry document into absolute
//! storage URLs under the site's prefix. Absolute references (`http…`, `//`,
//! a leading `/`, `data:`) are left alone, which also makes a second pass over
//! rewritten output a no-op.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| attr_pattern("src"));
static SRCSET_ATTR: LazyLock<Regex> = LazyLock::new(|| attr_pattern("srcset"));
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| attr_pattern("href"));
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(['"]?)([^'")]+?)(['"]?)\s*\)"#)
        .unwrap_or_else(|e| panic!("invalid url() pattern: {}", e))
});

/// Extensions whose `href` references are treated as assets
const ASSET_HREF_EXTENSIONS: &[&str] = &["css", "ico", "png", "jpg", "jpeg", "gif", "svg", "webp"];

/// `name="…"` or `name='…'`; group 1 is the double-quoted value, group 2 the
/// single-quoted one
fn attr_pattern(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)\b{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        name
    ))
    .unwrap_or_else(|e| panic!("invalid {} pattern: {}", name, e))
}

/// Strip any run of leading `./` and `../` segments
///
/// Assets can never resolve above the site's own storage prefix.
pub fn normalize_path(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix("../") {
            path = rest;
        } else {
            return path;
        }
    }
}

fn is_absolute(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.is_empty()
        || lower.starts_with("http")
        || lower.starts_with('/')
        || lower.starts_with("data:")
}

fn is_asset_href(value: &str) -> bool {
    if value.starts_with('#') || value.to_ascii_lowercase().starts_with("mailto:") {
        return false;
    }
    let path = value.split(['?', '#']).next().unwrap_or(value);
    match path.rsplit_once('.') {
        Some((_, ext)) => ASSET_HREF_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

struct Rewriter {
    base: String,
}

impl Rewriter {
    fn absolute(&self, value: &str) -> String {
        format!("{}/{}", self.base, normalize_path(value.trim()))
    }

    fn rewrite_attr(&self, caps: &Captures, name: &str, rewrite: impl Fn(&str) -> Option<String>) -> String {
        let (value, quote) = match (caps.get(1), caps.get(2)) {
            (Some(v), _) => (v.as_str(), '"'),
            (None, Some(v)) => (v.as_str(), '\''),
            (None, None) => return caps[0].to_string(),
        };
        match rewrite(value) {
            Some(new_value) => format!("{}={}{}{}", name, quote, new_value, quote),
            None => caps[0].to_string(),
        }
    }

    fn src(&self, value: &str) -> Option<String> {
        (!is_absolute(value)).then(|| self.absolute(value))
    }

    /// `None` when every candidate is already absolute
    fn srcset(&self, value: &str) -> Option<String> {
        let mut changed = false;
        let rewritten: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .map(|candidate| {
                let (url, descriptor) = match candidate.split_once(char::is_whitespace) {
                    Some((url, descriptor)) => (url, Some(descriptor.trim())),
                    None => (candidate, None),
                };
                let url = if is_absolute(url) {
                    url.to_string()
                } else {
                    changed = true;
                    self.absolute(url)
                };
                match descriptor {
                    Some(d) if !d.is_empty() => format!("{} {}", url, d),
                    _ => url,
                }
            })
            .collect();
        changed.then(|| rewritten.join(", "))
    }

    fn href(&self, value: &str) -> Option<String> {
        (is_asset_href(value) && !is_absolute(value)).then(|| self.absolute(value))
    }
}

/// Rewrite `src`, `srcset`, asset `href` and CSS `url()` references to
/// `{base_url}/{site_number}/{normalized path}`
pub fn rewrite_asset_paths(html: &str, site_number: i32, base_url: &str) -> String {
    let rewriter = Rewriter {
        base: format!("{}/{}", base_url.trim_end_matches('/'), site_number),
    };

    let html = SRC_ATTR.replace_all(html, |caps: &Captures| {
        rewriter.rewrite_attr(caps, "src", |v| rewriter.src(v))
    });
    let html = SRCSET_ATTR.replace_all(&html, |caps: &Captures| {
        rewriter.rewrite_attr(caps, "srcset", |v| rewriter.srcset(v))
    });
    let html = HREF_ATTR.replace_all(&html, |caps: &Captures| {
        rewriter.rewrite_attr(caps, "href", |v| rewriter.href(v))
    });
    let html = CSS_URL.replace_all(&html, |caps: &Captures| {
        let value = &caps[2];
        if is_absolute(value) {
            return caps[0].to_string();
        }
        format!("url({}{}{})", &caps[1], rewriter.absolute(value), &caps[3])
    });

    html.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.test/storage/v1/object/public/lp-assets";

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./a/b"), "a/b");
        assert_eq!(normalize_path("../a/b"), "a/b");
        assert_eq!(normalize_path("a/b"), "a/b");
        assert_eq!(normalize_path("./../.././a/b"), "a/b");
    }

    #[test]
    fn test_relative_src_is_rewritten() {
        let out = rewrite_asset_paths(r#"<img src="./img/logo.png">"#, 3, BASE);
        assert_eq!(out, format!(r#"<img src="{}/3/img/logo.png">"#, BASE));
    }

    #[test]
    fn test_absolute_references_are_untouched() {
        for value in [
            "https://x.example/a.png",
            "http://x.example/a.png",
            "//x.example/a.png",
            "/static/a.png",
            "data:image/png;base64,AAAA",
        ] {
            let html = format!(r#"<img src="{v}"><link href="{v}">"#, v = value);
            assert_eq!(rewrite_asset_paths(&html, 1, BASE), html);
        }
    }

    #[test]
    fn test_href_only_rewritten_for_asset_extensions() {
        let html = r##"<link rel="stylesheet" href="css/style.css"><a href="about.html">a</a><a href="#top">t</a><link rel="icon" href='favicon.ICO'>"##;
        let out = rewrite_asset_paths(html, 2, BASE);

        assert!(out.contains(&format!(r#"href="{}/2/css/style.css""#, BASE)));
        assert!(out.contains(r#"<a href="about.html">"#));
        assert!(out.contains(r##"<a href="#top">"##));
        assert!(out.contains(&format!("href='{}/2/favicon.ICO'", BASE)));
    }

    #[test]
    fn test_srcset_keeps_descriptors() {
        let html = r#"<img srcset="img/a.png 1x, ../img/b.png 2x, https://x.example/c.png 3x">"#;
        let out = rewrite_asset_paths(html, 5, BASE);
        assert_eq!(
            out,
            format!(
                r#"<img srcset="{b}/5/img/a.png 1x, {b}/5/img/b.png 2x, https://x.example/c.png 3x">"#,
                b = BASE
            )
        );
    }

    #[test]
    fn test_absolute_srcset_keeps_its_formatting() {
        let html = r#"<img srcset="https://x.example/a.png 1x,https://x.example/b.png   2x">"#;
        assert_eq!(rewrite_asset_paths(html, 5, BASE), html);
    }

    #[test]
    fn test_css_url_rewritten() {
        let html = r#"<div style="background: url('img/bg.jpg')"></div><style>.a{background:url(data:image/png;base64,AA)}</style>"#;
        let out = rewrite_asset_paths(html, 0, BASE);
        assert!(out.contains(&format!("url('{}/0/img/bg.jpg')", BASE)));
        assert!(out.contains("url(data:image/png;base64,AA)"));
    }

    #[test]
    fn test_second_pass_is_noop() {
        let html = r#"<img src="a.png"><link href="s.css"><p style="background:url(b.png)">"#;
        let once = rewrite_asset_paths(html, 7, BASE);
        assert_eq!(rewrite_asset_paths(&once, 7, BASE), once);
    }
}
