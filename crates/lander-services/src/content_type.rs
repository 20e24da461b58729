//! Content type inference from file extensions

/// Content type of a stored HTML document
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Map a lower-cased extension to its content type
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => HTML_CONTENT_TYPE,
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Content type of a path, judged by the text after its last `.`
pub fn content_type_for_path(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => content_type_for_extension(&ext.to_ascii_lowercase()),
        None => DEFAULT_CONTENT_TYPE,
    }
}

/// Whether a path is served as an HTML document
pub fn is_html_path(path: &str) -> bool {
    content_type_for_path(path) == HTML_CONTENT_TYPE
}
