//! Schema-checked decoding of stream frames and query bodies.
//!
//! Decoding never panics and never tears anything down. A payload that does
//! not match its record type yields a [`DecodeError`] and the caller drops it.

use emergence_types::StreamFrame;
use serde::de::DeserializeOwned;

use crate::error::DecodeError;

/// Decode one text message from the tick stream.
pub fn decode_frame(raw: &str) -> Result<StreamFrame, DecodeError> {
    serde_json::from_str(raw).map_err(|e| DecodeError::schema("StreamFrame", e))
}

/// Decode a query response body into its typed record.
pub fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(body).map_err(|e| DecodeError::schema(record_name::<T>(), e))
}

/// Short name of a record type for error messages.
fn record_name<T>() -> &'static str {
    let full = core::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergence_types::{EventList, Season, Weather};

    const FRAME: &str = r#"{"tick":3,"season":"Summer","weather":"Storm","agents_alive":8,"deaths_this_tick":0,"actions_resolved":16}"#;

    #[test]
    fn decodes_valid_frame() {
        let frame = decode_frame(FRAME).ok();
        assert_eq!(frame.map(|f| (f.tick, f.season, f.weather)), Some((3, Season::Summer, Weather::Storm)));
    }

    #[test]
    fn rejects_missing_field() {
        let raw = r#"{"tick":3,"season":"Summer","weather":"Storm","agents_alive":8}"#;
        assert!(matches!(decode_frame(raw), Err(DecodeError::Schema { record: "StreamFrame", .. })));
    }

    #[test]
    fn rejects_out_of_enum_weather() {
        let raw = FRAME.replace("Storm", "Hail");
        assert!(decode_frame(&raw).is_err());
    }

    #[test]
    fn rejects_string_count() {
        let raw = FRAME.replace("\"agents_alive\":8", "\"agents_alive\":\"8\"");
        assert!(decode_frame(&raw).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(decode_frame("tick 3").is_err());
    }

    #[test]
    fn response_error_names_short_record_type() {
        let err = decode_response::<EventList>(b"{\"count\": 1}").err();
        assert!(matches!(err, Some(DecodeError::Schema { record: "EventList", .. })));
    }
}
