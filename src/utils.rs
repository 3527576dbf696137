use std::path::{Component, Path};

/// File extensions treated as audio by the library scanner and the reconciler.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "flac", "ogg", "oga", "opus", "wav", "aiff", "aif", "wma", "alac",
];

/// Extension of the playlist manifest files.
pub const MANIFEST_EXTENSION: &str = "m3u";

const MAX_COMPONENT_LEN: usize = 120;

/// Reduces a playlist title to a filesystem-safe token.
///
/// Only alphanumeric characters, spaces, hyphens and underscores survive.
/// A title that sanitizes to nothing becomes `playlist` so that every
/// manifest still gets a usable file name.
pub fn sanitize_playlist_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    if safe.trim().is_empty() {
        return "playlist".to_string();
    }
    safe
}

/// Makes an artist, album or title usable as a single path component.
///
/// Path separators, characters rejected by common filesystems and control
/// characters are replaced with `_`. Leading/trailing whitespace and trailing
/// dots are dropped and the result is capped in length.
pub fn sanitize_path_component(value: &str, fallback: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        return fallback.to_string();
    }

    truncate_on_char_boundary(trimmed, MAX_COMPONENT_LEN).to_string()
}

fn truncate_on_char_boundary(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].trim_end()
}

/// The marker embedded in every library file name: `[<external_id>]`.
pub fn id_marker(external_id: &str) -> String {
    format!("[{}]", external_id)
}

/// Builds the file stem `<title> [<external_id>]` used for library files.
pub fn track_file_stem(title: &str, external_id: &str) -> String {
    format!(
        "{} {}",
        sanitize_path_component(title, "Unknown Title"),
        id_marker(external_id)
    )
}

/// Recovers the external id from a library file name.
///
/// The stem must end with `[<id>]`; anything else yields `None`.
pub fn external_id_from_path(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    let inner = stem.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let id = &inner[open + 1..];
    is_valid_external_id(id).then_some(id)
}

/// Whether an id can be embedded in a file name and recovered again.
///
/// The id also names a staging directory, so it has to be exactly one
/// normal path component: `.` and `..` are rejected along with separators.
pub fn is_valid_external_id(id: &str) -> bool {
    if id.is_empty()
        || id
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '[' | ']'))
    {
        return false;
    }

    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

pub fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
        .unwrap_or(false)
}

/// Case-insensitive check for the protection marker in a playlist summary.
pub fn has_protection_marker(summary: &str, marker: &str) -> bool {
    let marker = marker.trim();
    if marker.is_empty() {
        return false;
    }
    summary.to_lowercase().contains(&marker.to_lowercase())
}

/// Splits a comma separated list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
