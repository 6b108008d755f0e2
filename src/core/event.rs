//! External events (social-media posts) that get pinned onto price charts.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::market::Extra;

/// A timestamped external event.
///
/// On the wire this is a post: `{ author, content, date, tts }`, where `date`
/// is in seconds and `tts` is a key for lazily resolving a spoken rendition.
///
/// # Examples
///
/// ```
/// use marketpulse::core::Event;
///
/// let event: Event = serde_json::from_str(
///     r#"{"author": "someone", "content": "Big news", "date": 1700000000, "tts": ""}"#,
/// ).unwrap();
/// assert_eq!(event.timestamp, 1_700_000_000);
/// assert!(event.audio_key.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds since the Unix epoch.
    #[serde(rename = "date")]
    pub timestamp: i64,

    /// Event text.
    #[serde(default)]
    pub content: String,

    /// Who published it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Key for the audio lookup endpoint; empty upstream values become `None`.
    #[serde(
        rename = "tts",
        default,
        deserialize_with = "de_optional_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio_key: Option<String>,

    /// Any other upstream metadata.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Event {
    /// Creates an event with only a timestamp and text.
    pub fn new(timestamp: i64, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            content: content.into(),
            author: None,
            audio_key: None,
            extra: BTreeMap::new(),
        }
    }
}

fn de_optional_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|k| !k.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_from_post() {
        let event: Event = serde_json::from_value(json!({
            "author": "trump",
            "content": "Tariffs!",
            "date": 1_744_000_000,
            "tts": "audio/abc.mp3",
            "id": 42
        }))
        .unwrap();

        assert_eq!(event.author.as_deref(), Some("trump"));
        assert_eq!(event.audio_key.as_deref(), Some("audio/abc.mp3"));
        assert_eq!(event.extra.get("id"), Some(&json!(42)));
    }

    #[test]
    fn test_event_missing_tts() {
        let event: Event = serde_json::from_value(json!({"content": "x", "date": 5})).unwrap();
        assert!(event.audio_key.is_none());
        assert!(event.author.is_none());
    }

    #[test]
    fn test_event_serializes_wire_names() {
        let event = Event::new(10, "hello");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["date"], 10);
        assert!(value.get("tts").is_none());
    }
}
