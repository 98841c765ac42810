//! Batch-file form of events.
//!
//! A batch document names the two teams once and lists the events:
//!
//! ```json
//! {
//!   "team a": "Germany",
//!   "team b": "Japan",
//!   "events": [
//!     {
//!       "event name": "kickoff",
//!       "time": 0,
//!       "general game updates": { "active": true },
//!       "team a updates": { "possession": "51%" },
//!       "team b updates": {},
//!       "description": "And we're off!"
//!     }
//!   ]
//! }
//! ```
//!
//! Update values may be any JSON value; they are coerced to strings on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{Event, Updates, channel_name, is_wire_safe_update};

/// Events loaded from one batch file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub team_a: String,
    pub team_b: String,
    pub events: Vec<Event>,
}

impl Batch {
    /// Channel the batch is published to.
    #[must_use]
    pub fn channel(&self) -> String {
        channel_name(&self.team_a, &self.team_b)
    }

    /// Parse a batch document.
    ///
    /// # Errors
    /// Returns error if the text is not a valid batch document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let file: BatchFile = serde_json::from_str(text)?;
        Ok(file.into())
    }

    /// Render the batch as a document. Update values are written as strings.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&BatchFile::from(self))
    }
}

/// Coerce an update value to its string form.
///
/// Strings pass through unchanged. Any other value (number, bool, null,
/// array, object) becomes its compact JSON text, so `true` becomes `"true"`
/// and `{"a":1}` becomes `"{\"a\":1}"`.
#[must_use]
pub fn coerce_update_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a raw update map, dropping entries the wire body cannot carry.
fn coerce_updates(raw: BTreeMap<String, Value>) -> Updates {
    raw.into_iter()
        .filter_map(|(key, value)| {
            let value = coerce_update_value(&value);
            if is_wire_safe_update(&key, &value) {
                Some((key, value))
            } else {
                tracing::warn!(%key, %value, "dropping update that cannot be sent");
                None
            }
        })
        .collect()
}

fn raw_updates(updates: &Updates) -> BTreeMap<String, Value> {
    updates
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct BatchFile {
    #[serde(rename = "team a", default)]
    team_a: String,
    #[serde(rename = "team b", default)]
    team_b: String,
    #[serde(default)]
    events: Vec<BatchEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BatchEvent {
    #[serde(rename = "event name", default)]
    name: String,
    time: u64,
    #[serde(rename = "general game updates", default)]
    general_updates: BTreeMap<String, Value>,
    #[serde(rename = "team a updates", default)]
    team_a_updates: BTreeMap<String, Value>,
    #[serde(rename = "team b updates", default)]
    team_b_updates: BTreeMap<String, Value>,
    #[serde(default)]
    description: String,
}

impl From<BatchFile> for Batch {
    fn from(file: BatchFile) -> Self {
        let events = file
            .events
            .into_iter()
            .map(|raw| Event {
                team_a: file.team_a.clone(),
                team_b: file.team_b.clone(),
                name: raw.name,
                time: raw.time,
                general_updates: coerce_updates(raw.general_updates),
                team_a_updates: coerce_updates(raw.team_a_updates),
                team_b_updates: coerce_updates(raw.team_b_updates),
                description: raw.description,
            })
            .collect();

        Self {
            team_a: file.team_a,
            team_b: file.team_b,
            events,
        }
    }
}

impl From<&Batch> for BatchFile {
    fn from(batch: &Batch) -> Self {
        Self {
            team_a: batch.team_a.clone(),
            team_b: batch.team_b.clone(),
            events: batch
                .events
                .iter()
                .map(|event| BatchEvent {
                    name: event.name.clone(),
                    time: event.time,
                    general_updates: raw_updates(&event.general_updates),
                    team_a_updates: raw_updates(&event.team_a_updates),
                    team_b_updates: raw_updates(&event.team_b_updates),
                    description: event.description.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SAMPLE: &str = r#"{
        "team a": "Germany",
        "team b": "Japan",
        "events": [
            {
                "event name": "kickoff",
                "time": 0,
                "general game updates": { "active": true, "before halftime": "true" },
                "team a updates": { "possession": "51%", "shots": 3 },
                "team b updates": { "formation": { "def": 4, "mid": 4 } },
                "description": "And we're off!"
            },
            {
                "event name": "goal!!!!",
                "time": 1980
            }
        ]
    }"#;

    #[test]
    fn test_load_sample() {
        let batch = Batch::from_json(SAMPLE).unwrap();

        assert_eq!(batch.channel(), "Germany_Japan");
        assert_eq!(batch.events.len(), 2);

        let kickoff = &batch.events[0];
        assert_eq!(kickoff.team_a, "Germany");
        assert_eq!(kickoff.team_b, "Japan");
        assert_eq!(kickoff.general_updates["active"], "true");
        assert_eq!(kickoff.general_updates["before halftime"], "true");
        assert_eq!(kickoff.team_a_updates["shots"], "3");
        assert_eq!(kickoff.team_b_updates["formation"], r#"{"def":4,"mid":4}"#);

        let goal = &batch.events[1];
        assert_eq!(goal.time, 1980);
        assert!(goal.general_updates.is_empty());
        assert_eq!(goal.description, "");
    }

    #[test]
    fn test_coerce_update_value() {
        assert_eq!(coerce_update_value(&json!("plain")), "plain");
        assert_eq!(coerce_update_value(&json!(12)), "12");
        assert_eq!(coerce_update_value(&json!(1.5)), "1.5");
        assert_eq!(coerce_update_value(&json!(false)), "false");
        assert_eq!(coerce_update_value(&json!(null)), "null");
        assert_eq!(coerce_update_value(&json!([1, "x"])), r#"[1,"x"]"#);
    }

    #[test]
    fn test_missing_time_is_malformed() {
        let text = r#"{"team a": "a", "team b": "b", "events": [{"event name": "x"}]}"#;
        assert!(Batch::from_json(text).is_err());
    }

    #[test]
    fn test_negative_time_is_malformed() {
        let text = r#"{"team a": "a", "team b": "b", "events": [{"time": -1}]}"#;
        assert!(Batch::from_json(text).is_err());
    }

    #[test]
    fn test_updates_the_wire_cannot_carry_are_dropped() {
        let text = r#"{
            "team a": "a",
            "team b": "b",
            "events": [{
                "time": 2700,
                "general game updates": {
                    "description": "",
                    "score at 45:00": "1-0",
                    "score": "1-0"
                },
                "team b updates": { "note": "two\nlines" },
                "description": "Half time"
            }]
        }"#;
        let batch = Batch::from_json(text).unwrap();
        let event = &batch.events[0];
        assert_eq!(event.general_updates.len(), 1);
        assert_eq!(event.general_updates["score"], "1-0");
        assert!(event.team_b_updates.is_empty());

        let parsed = Event::from_wire_body(&event.to_wire_body("alice")).unwrap();
        assert_eq!(&parsed, event);
    }

    #[test]
    fn test_document_roundtrip() {
        let batch = Batch::from_json(SAMPLE).unwrap();
        let again = Batch::from_json(&batch.to_json().unwrap()).unwrap();
        assert_eq!(again, batch);
    }
}
