//! Detection patterns and snippets shared by the injector and the scanner

use regex::Regex;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {}: {}", pattern, e))
}

/// Analytics container already present
pub(crate) static ANALYTICS_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)googletagmanager\.com|GTM-[A-Z0-9]+"));

/// First-party tracking script already present
pub(crate) static TRACKING_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)tracking\.js|/api/lp-tracking"));

/// Widget loader script already present
pub(crate) static WIDGET_LOADER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)widget-loader\.js"));

/// Footer legal links already present
pub(crate) static FOOTER_LINKS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)tastas\.work/terms|tastas\.work/privacy|careergift\.co\.jp")
});

/// CTA marker attribute on an anchor
pub(crate) static CTA_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)data-cats\s*=\s*["']lineFriendsFollowLink["']"#));

/// Any `data-cats` attribute, whatever its value
pub(crate) static ANY_DATA_CATS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)data-cats\s*="));

/// Anchors that look like a LINE friend-add call to action
pub(crate) static LINE_CTA_HINTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)href\s*=\s*["'][^"']*line\.me[^"']*["']"#,
        r#"(?i)href\s*=\s*["'][^"']*lin\.ee[^"']*["']"#,
        r#"(?i)class\s*=\s*["'][^"']*btn-line[^"']*["']"#,
        r#"(?i)class\s*=\s*["'][^"']*line-btn[^"']*["']"#,
        r#"(?i)class\s*=\s*["'][^"']*line-cta[^"']*["']"#,
        r#"(?i)class\s*=\s*["'][^"']*line-friend[^"']*["']"#,
    ]
    .into_iter()
    .map(compile)
    .collect()
});

/// Opening anchor tag; group 1 holds its attributes
pub(crate) static ANCHOR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<a\s([^>]*?)\s*(/?)>"));

/// `href` attribute with a quoted value; group 1 is the whitespace before it,
/// so `data-href` never matches
pub(crate) static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)(\s)href\s*=\s*(?:"[^"]*"|'[^']*')"#));

pub(crate) static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<head(?:\s[^>]*)?>"));

pub(crate) static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<body(?:\s[^>]*)?>"));

pub(crate) static BODY_CLOSE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)</body\s*>"));

/// Opening footer tag plus the whitespace that follows it
pub(crate) static FOOTER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(<footer(?:\s[^>]*)?>)\s*"));

/// Minimal structure a hand-edited document must keep
pub(crate) static DOCUMENT_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<html[\s>]|<body[\s>]"));

pub(crate) const ANALYTICS_HEAD_SNIPPET: &str = r#"<!-- Google Tag Manager -->
<script>(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':
new Date().getTime(),event:'gtm.js'});var f=d.getElementsByTagName(s)[0],
j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=
'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);
})(window,document,'script','dataLayer','GTM-WTXNHD5K');</script>
<!-- End Google Tag Manager -->"#;

pub(crate) const ANALYTICS_BODY_SNIPPET: &str = r#"<!-- Google Tag Manager (noscript) -->
<noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-WTXNHD5K"
height="0" width="0" style="display:none;visibility:hidden"></iframe></noscript>
<!-- End Google Tag Manager (noscript) -->"#;

pub(crate) const WIDGET_LOADER_SNIPPET: &str =
    r#"<script src="/lp/widget-loader.js" defer></script>"#;

pub(crate) const TRACKING_SNIPPET: &str = r#"<script src="/lp/tracking.js"></script>"#;

pub(crate) const FOOTER_LINKS_SNIPPET: &str = r#"    <nav class="footer-links">
      <a href="https://tastas.work/terms" target="_blank" rel="noopener noreferrer">利用規約</a>
      <a href="https://tastas.work/privacy" target="_blank" rel="noopener noreferrer">プライバシーポリシー</a>
      <a href="https://www.careergift.co.jp" target="_blank" rel="noopener noreferrer">運営会社</a>
    </nav>"#;

/// Attribute marking the CTA anchor whose target follows the site's CTA URL
pub(crate) const CTA_MARKER_ATTRIBUTE: &str = r#"data-cats="lineFriendsFollowLink""#;
