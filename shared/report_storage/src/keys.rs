//! Object key naming
//!
//! JSON inputs are stored under `<prefix><YYYYMMDD_HHMMSS>_<filename>` and HTML
//! results under `<prefix><report_id>.html`. Timestamps are UTC with second
//! granularity, so two uploads of the same filename within one second map to
//! the same key and the later one wins.

use chrono::{DateTime, Utc};

use crate::{StorageError, StorageResult};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Builds the timestamped key for an uploaded JSON file
///
/// # Errors
///
/// Returns `StorageError::InvalidInput` if the filename is empty or contains a path separator
pub fn json_object_key(
    prefix: &str,
    original_filename: &str,
    now: DateTime<Utc>,
) -> StorageResult<String> {
    validate_segment("filename", original_filename)?;

    Ok(format!(
        "{prefix}{}_{original_filename}",
        now.format(TIMESTAMP_FORMAT)
    ))
}

/// Builds the deterministic key for a rendered report
///
/// # Errors
///
/// Returns `StorageError::InvalidInput` if the report id is empty or contains a path separator
pub fn result_object_key(prefix: &str, report_id: &str) -> StorageResult<String> {
    validate_segment("report id", report_id)?;

    Ok(format!("{prefix}{report_id}.html"))
}

fn validate_segment(what: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidInput(format!("{what} must not be empty")));
    }
    if value.contains(['/', '\\']) {
        return Err(StorageError::InvalidInput(format!(
            "{what} must not contain path separators: {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_json_object_key_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        let key = json_object_key("qq-reports/json/", "report.json", now).unwrap();

        assert_eq!(key, "qq-reports/json/20240309_070502_report.json");
    }

    #[test]
    fn test_result_object_key_is_deterministic() {
        let first = result_object_key("qq-reports/results/", "abc123").unwrap();
        let second = result_object_key("qq-reports/results/", "abc123").unwrap();

        assert_eq!(first, "qq-reports/results/abc123.html");
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_invalid_segments() {
        let now = Utc::now();

        assert!(matches!(
            json_object_key("p/", "", now),
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            json_object_key("p/", "../etc/passwd", now),
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            result_object_key("p/", "a\\b"),
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            result_object_key("p/", "   "),
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_keeps_unicode_filenames() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let key = json_object_key("in/", "聊天记录.json", now).unwrap();

        assert_eq!(key, "in/20251231_235959_聊天记录.json");
    }
}
