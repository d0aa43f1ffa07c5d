//! MIME type detection based on file extensions.

use std::path::Path;

use crate::http::util::file_extension;

/// Fallback for unknown extensions.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Maps a file extension (without the dot, any case) to a MIME type.
pub fn from_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "otf" => "font/otf",
        _ => DEFAULT_MIME,
    }
}

/// MIME type for a filesystem path, from the text after the last `.` of its
/// file name.
pub fn from_path(path: &Path) -> &'static str {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| from_extension(&file_extension(name)))
        .unwrap_or(DEFAULT_MIME)
}
