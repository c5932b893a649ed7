use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Object wire contract consumed by filters
///
/// The pipeline executor treats every value as an opaque string; this
/// framing exists for filters (and their callers) that exchange typed
/// objects: a class identifier plus arbitrary properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEnvelope {
    pub classid: String,
    pub properties: HashMap<String, Value>,
}

impl ObjectEnvelope {
    /// Parse an envelope from a pipeline value.
    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let raw = r#"{"classid":"com.example.TypeA","properties":{"text":"hi","id":7}}"#;
        let envelope = ObjectEnvelope::from_json(raw).unwrap();
        assert_eq!(envelope.classid, "com.example.TypeA");
        assert_eq!(envelope.properties["text"], "hi");

        let re_encoded = envelope.to_json().unwrap();
        let again = ObjectEnvelope::from_json(&re_encoded).unwrap();
        assert_eq!(again.classid, envelope.classid);
    }

    #[test]
    fn test_envelope_rejects_missing_classid() {
        assert!(ObjectEnvelope::from_json(r#"{"properties":{}}"#).is_err());
    }
}
