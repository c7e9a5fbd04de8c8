//! Taler-style timestamps: wire form `{"t_s": <unix seconds>}` or
//! `{"t_s": "never"}` for the distinguished never-expires value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TalerTimestamp {
    At(u64),
    Never,
}

impl TalerTimestamp {
    pub fn now() -> TalerTimestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        TalerTimestamp::At(secs)
    }

    pub fn from_unix_seconds(secs: u64) -> TalerTimestamp {
        TalerTimestamp::At(secs)
    }

    pub fn as_system_time(self) -> Option<SystemTime> {
        match self {
            TalerTimestamp::At(secs) => Some(UNIX_EPOCH + Duration::from_secs(secs)),
            TalerTimestamp::Never => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Wire {
    Seconds(u64),
    Never(NeverMarker),
}

#[derive(Serialize, Deserialize)]
enum NeverMarker {
    #[serde(rename = "never")]
    Never,
}

impl Serialize for TalerTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope {
            t_s: Wire,
        }
        let wire = match self {
            TalerTimestamp::At(secs) => Wire::Seconds(*secs),
            TalerTimestamp::Never => Wire::Never(NeverMarker::Never),
        };
        Envelope { t_s: wire }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TalerTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Envelope {
            t_s: Wire,
        }
        let envelope = Envelope::deserialize(deserializer)?;
        Ok(match envelope.t_s {
            Wire::Seconds(secs) => TalerTimestamp::At(secs),
            Wire::Never(NeverMarker::Never) => TalerTimestamp::Never,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_concrete_instant() {
        let ts = TalerTimestamp::from_unix_seconds(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#"{"t_s":1700000000}"#);
        let back: TalerTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn round_trips_never() {
        let ts = TalerTimestamp::Never;
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#"{"t_s":"never"}"#);
        let back: TalerTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TalerTimestamp::Never);
    }
}
