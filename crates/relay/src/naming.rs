//! Destination-name derivation.

use driveferry_acquire::SourceName;

/// Longest title prefix kept in a derived destination name, in characters.
pub const MAX_TITLE_LEN: usize = 64;

/// Replaces path separators and control characters so the name is safe as
/// a single storage object name.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Derives the storage object name from the acquisition's naming intent.
///
/// Platform-supplied filenames are kept as-is (sanitized). Titles are
/// truncated to [`MAX_TITLE_LEN`] characters with a `…` marker and given
/// the staged container's extension.
pub fn destination_name(source: &SourceName) -> String {
    match source {
        SourceName::Original(name) => sanitize_file_name(name),
        SourceName::Title { title, ext } => {
            let title = sanitize_file_name(title);
            let stem = if title.chars().count() > MAX_TITLE_LEN {
                let prefix: String = title.chars().take(MAX_TITLE_LEN).collect();
                format!("{prefix}…")
            } else {
                title
            };
            format!("{stem}.{ext}")
        }
    }
}
