use super::StorageError;

/// Builds the object key for a step's log: `/<prefix>/<process-id>`.
///
/// Redundant slashes in `prefix` collapse; an empty prefix yields `/<process-id>`.
#[must_use]
pub fn object_key(prefix: &str, process_id: i64) -> String {
    let mut segments: Vec<&str> = prefix
        .trim()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let id = process_id.to_string();
    segments.push(&id);
    format!("/{}", segments.join("/"))
}

/// Splits a key into path segments safe to use below a storage root.
pub(crate) fn key_segments(key: &str) -> Result<Vec<&str>, StorageError> {
    let segments: Vec<&str> = key
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    for segment in &segments {
        validate_segment(key, segment)?;
    }

    Ok(segments)
}

fn validate_segment(key: &str, segment: &str) -> Result<(), StorageError> {
    if segment == "." || segment == ".." || segment.len() > 255 {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    const INVALID_CHARS: &[char] = &['\0', '\n', '\r', '\\'];
    if segment.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(())
}
