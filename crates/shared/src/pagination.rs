//! Cursor-based pagination utilities.
//!
//! Ticket and reply listings paginate with an opaque composite cursor so
//! pages stay stable while new rows are appended.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for cursor operations.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("Invalid ID in cursor")]
    InvalidId,
}

/// Encodes a cursor from a creation timestamp and row ID.
///
/// The cursor format is base64(RFC3339_timestamp:id). The composite keeps
/// ordering total when several rows share a timestamp.
pub fn encode_cursor(created_at: DateTime<Utc>, id: i64) -> String {
    let raw = format!(
        "{}:{}",
        created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        id
    );
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor into `(timestamp, id)`.
pub fn decode_cursor(cursor: &str) -> Result<(DateTime<Utc>, i64), CursorError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;

    let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

    // Split on last colon (timestamp contains colons)
    let colon_pos = s.rfind(':').ok_or(CursorError::InvalidFormat)?;

    let timestamp_str = &s[..colon_pos];
    let id_str = &s[colon_pos + 1..];

    let id: i64 = id_str.parse().map_err(|_| CursorError::InvalidId)?;

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .map_err(|_| CursorError::InvalidTimestamp)?
        .with_timezone(&Utc);

    Ok((timestamp, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cursor_round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let cursor = encode_cursor(ts, 42);
        let (decoded_ts, decoded_id) = decode_cursor(&cursor).unwrap();
        assert_eq!(decoded_ts, ts);
        assert_eq!(decoded_id, 42);
    }

    #[test]
    fn test_cursor_is_opaque() {
        let ts = Utc::now();
        let cursor = encode_cursor(ts, 7);
        assert!(!cursor.contains(':'));
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(matches!(
            decode_cursor("!!!not-base64!!!"),
            Err(CursorError::InvalidEncoding)
        ));
    }

    #[test]
    fn test_decode_missing_separator() {
        let cursor = URL_SAFE_NO_PAD.encode(b"no-separator-here");
        assert!(matches!(
            decode_cursor(&cursor),
            Err(CursorError::InvalidFormat)
        ));
    }

    #[test]
    fn test_decode_bad_id() {
        let cursor = URL_SAFE_NO_PAD.encode(b"2025-03-14T09:26:53.000000Z:abc");
        assert!(matches!(decode_cursor(&cursor), Err(CursorError::InvalidId)));
    }

    #[test]
    fn test_decode_bad_timestamp() {
        let cursor = URL_SAFE_NO_PAD.encode(b"not-a-timestamp:42");
        assert!(matches!(
            decode_cursor(&cursor),
            Err(CursorError::InvalidTimestamp)
        ));
    }
}
