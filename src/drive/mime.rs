//! MIME type tables: search shortcuts, Workspace export formats, and
//! extension-based detection for uploads.

/// Folder MIME type.
pub const FOLDER: &str = "application/vnd.google-apps.folder";
/// Google Docs MIME type.
pub const DOCUMENT: &str = "application/vnd.google-apps.document";
/// Google Sheets MIME type.
pub const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
/// Google Slides MIME type.
pub const PRESENTATION: &str = "application/vnd.google-apps.presentation";

/// Fallback MIME type for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// File-type shortcuts accepted by `drive_search`, each expanding to a MIME
/// set. Explicit MIME types (anything containing `/`) pass through.
const SHORTCUTS: &[(&str, &[&str])] = &[
    (
        "image",
        &[
            "image/jpeg",
            "image/jpg",
            "image/png",
            "image/gif",
            "image/bmp",
            "image/webp",
            "image/svg+xml",
            "image/tiff",
        ],
    ),
    (
        "audio",
        &["audio/mpeg", "audio/mp3", "audio/wav", "audio/ogg", "audio/aac", "audio/flac", "audio/m4a"],
    ),
    (
        "video",
        &[
            "video/mp4",
            "video/mpeg",
            "video/quicktime",
            "video/x-msvideo",
            "video/x-matroska",
            "video/webm",
            "video/avi",
        ],
    ),
    (
        "prez",
        &[
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            PRESENTATION,
        ],
    ),
    (
        "doc",
        &[
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            DOCUMENT,
            "application/rtf",
        ],
    ),
    (
        "spreadsheet",
        &[
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            SPREADSHEET,
        ],
    ),
    ("txt", &["text/plain", "text/csv", "text/html", "text/markdown"]),
    ("pdf", &["application/pdf"]),
    ("folder", &[FOLDER]),
];

/// Export formats per Workspace MIME type: format name → export MIME type.
const EXPORT_FORMATS: &[(&str, &[(&str, &str)])] = &[
    (
        DOCUMENT,
        &[
            ("pdf", "application/pdf"),
            ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            ("txt", "text/plain"),
            ("html", "text/html"),
        ],
    ),
    (
        SPREADSHEET,
        &[
            ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            ("pdf", "application/pdf"),
            ("csv", "text/csv"),
        ],
    ),
    (
        PRESENTATION,
        &[
            ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
            ("pdf", "application/pdf"),
        ],
    ),
];

/// Extension → MIME type for upload auto-detection.
const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    (".pdf", "application/pdf"),
    (".doc", "application/msword"),
    (".docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    (".xls", "application/vnd.ms-excel"),
    (".xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    (".ppt", "application/vnd.ms-powerpoint"),
    (".pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    (".txt", "text/plain"),
    (".csv", "text/csv"),
    (".html", "text/html"),
    (".json", "application/json"),
    (".xml", "application/xml"),
    (".zip", "application/zip"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".svg", "image/svg+xml"),
    (".mp4", "video/mp4"),
    (".mp3", "audio/mpeg"),
    (".wav", "audio/wav"),
];

/// Workspace MIME types that cannot be downloaded raw.
const WORKSPACE_TYPES: &[&str] = &[
    DOCUMENT,
    SPREADSHEET,
    PRESENTATION,
    "application/vnd.google-apps.form",
    "application/vnd.google-apps.drawing",
    "application/vnd.google-apps.map",
    "application/vnd.google-apps.site",
];

/// Check whether a MIME type is a provider-native Workspace type.
#[must_use]
pub fn is_workspace_type(mime_type: &str) -> bool {
    WORKSPACE_TYPES.contains(&mime_type)
}

/// Expand shortcuts and explicit MIME types into a deduplicated MIME list.
/// Unknown shortcuts are skipped with a warning.
#[must_use]
pub fn expand_file_types(file_types: &[String]) -> Vec<String> {
    let mut mime_types = Vec::new();
    let mut push = |mime: &str| {
        if !mime_types.iter().any(|m| m == mime) {
            mime_types.push(mime.to_string());
        }
    };

    for file_type in file_types {
        if file_type.contains('/') {
            push(file_type);
        } else if let Some((_, types)) =
            SHORTCUTS.iter().find(|(name, _)| *name == file_type.to_lowercase())
        {
            for mime in *types {
                push(mime);
            }
        } else {
            tracing::warn!(file_type = %file_type, "unknown file type, ignoring");
        }
    }

    mime_types
}

/// The export MIME type for a Workspace file and format, if supported.
#[must_use]
pub fn export_mime_type(workspace_mime_type: &str, format: &str) -> Option<&'static str> {
    EXPORT_FORMATS
        .iter()
        .find(|(mime, _)| *mime == workspace_mime_type)?
        .1
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, mime)| *mime)
}

/// Formats supported for a Workspace MIME type, for error messages.
#[must_use]
pub fn supported_formats(workspace_mime_type: &str) -> Vec<&'static str> {
    EXPORT_FORMATS
        .iter()
        .find(|(mime, _)| *mime == workspace_mime_type)
        .map(|(_, formats)| formats.iter().map(|(name, _)| *name).collect())
        .unwrap_or_default()
}

/// Detect a MIME type from a filename extension.
#[must_use]
pub fn detect_mime_type(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    let ext = match lower.rfind('.') {
        Some(idx) => &lower[idx..],
        None => return OCTET_STREAM,
    };
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or(OCTET_STREAM, |(_, mime)| mime)
}

/// Replace a filename's extension with the export format's.
#[must_use]
pub fn adjust_filename(name: &str, format: &str) -> String {
    if format.is_empty() {
        return name.to_string();
    }
    let base = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{base}.{format}")
}
