use crate::error::IngestError;
use std::collections::HashMap;

/// Reduces a declared content type to its bare `type/subtype` form.
///
/// Parameters (`; charset=...`) are rejected rather than stripped: an upload
/// declaring them is treated as a malformed header.
pub fn parse_content_type(raw: &str) -> Result<String, IngestError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(IngestError::InvalidInput(
            "Empty content-type header".to_string(),
        ));
    }
    if raw.contains(';') {
        return Err(IngestError::InvalidInput(
            "Invalid or malformed content-type header".to_string(),
        ));
    }

    let parsed: mime::Mime = raw.parse().map_err(|e| {
        IngestError::InvalidInput(format!("Unable to parse media type '{}': {}", raw, e))
    })?;

    Ok(parsed.essence_str().to_ascii_lowercase())
}

/// Looks up the file extension for an allow-listed media type.
pub fn resolve_extension<'a>(
    allowed: &'a HashMap<String, String>,
    media_type: &str,
) -> Result<&'a str, IngestError> {
    allowed
        .get(media_type)
        .map(String::as_str)
        .ok_or_else(|| {
            IngestError::UnsupportedMediaType(format!("'{}' is not an accepted type", media_type))
        })
}

/// Rejects uploads whose announced size is already over the limit.
pub fn validate_declared_size(declared: Option<u64>, max_size: u64) -> Result<(), IngestError> {
    match declared {
        Some(size) if size > max_size => Err(IngestError::TooLarge(format!(
            "Upload of {} bytes exceeds maximum allowed {} bytes ({} MB)",
            size,
            max_size,
            max_size / 1024 / 1024
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> HashMap<String, String> {
        HashMap::from([
            ("video/mp4".to_string(), "mp4".to_string()),
            ("image/png".to_string(), "png".to_string()),
        ])
    }

    #[test]
    fn test_parse_content_type() {
        assert_eq!(parse_content_type("video/mp4").unwrap(), "video/mp4");
        assert_eq!(parse_content_type("  Video/MP4 ").unwrap(), "video/mp4");
    }

    #[test]
    fn test_parse_content_type_rejects_malformed() {
        for raw in ["", "   ", "video/mp4; codecs=avc1", "not a type"] {
            assert!(
                matches!(parse_content_type(raw), Err(IngestError::InvalidInput(_))),
                "expected '{}' to be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_resolve_extension() {
        let allowed = allow_list();
        assert_eq!(resolve_extension(&allowed, "video/mp4").unwrap(), "mp4");
        assert!(matches!(
            resolve_extension(&allowed, "application/pdf"),
            Err(IngestError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_validate_declared_size() {
        assert!(validate_declared_size(None, 10).is_ok());
        assert!(validate_declared_size(Some(10), 10).is_ok());
        assert!(matches!(
            validate_declared_size(Some(11), 10),
            Err(IngestError::TooLarge(_))
        ));
    }
}
