//! The per-tick summary pushed over the observer's WebSocket stream.

use serde::{Deserialize, Serialize};

use crate::enums::{Season, Weather};

/// One frame of the tick stream.
///
/// The observer sends exactly one of these as a JSON text message after
/// each tick completes. Frames are immutable once decoded; extra fields
/// are ignored so newer servers stay compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFrame {
    /// The tick number that just completed.
    pub tick: u64,
    /// Current season.
    pub season: Season,
    /// Current weather.
    pub weather: Weather,
    /// Number of living agents.
    pub agents_alive: u32,
    /// Number of deaths this tick.
    pub deaths_this_tick: u32,
    /// Number of actions resolved this tick.
    pub actions_resolved: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_tolerates_unknown_fields() {
        let raw = r#"{"tick":7,"season":"Winter","weather":"Snow","agents_alive":12,
            "deaths_this_tick":1,"actions_resolved":30,"server_version":"0.3"}"#;
        let frame: Result<StreamFrame, _> = serde_json::from_str(raw);
        let frame = frame.ok();
        assert_eq!(frame.map(|f| f.tick), Some(7));
        assert_eq!(frame.map(|f| f.season), Some(Season::Winter));
    }

    #[test]
    fn frame_rejects_negative_and_fractional_counts() {
        let negative = r#"{"tick":1,"season":"Spring","weather":"Clear","agents_alive":-1,
            "deaths_this_tick":0,"actions_resolved":0}"#;
        let fractional = r#"{"tick":1.5,"season":"Spring","weather":"Clear","agents_alive":1,
            "deaths_this_tick":0,"actions_resolved":0}"#;
        assert!(serde_json::from_str::<StreamFrame>(negative).is_err());
        assert!(serde_json::from_str::<StreamFrame>(fractional).is_err());
    }
}
