use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A received message, decoded for display. `data_json` falls back to a
/// plain JSON string when the payload is not valid JSON.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PubsubMessage {
    pub id: String,
    pub publish_time: Option<DateTime<Utc>>,
    pub data: String,
    pub data_json: Value,
    pub attributes: HashMap<String, String>,
    pub attributes_json: Value,
}

impl From<google_cloud_googleapis::pubsub::v1::PubsubMessage> for PubsubMessage {
    fn from(value: google_cloud_googleapis::pubsub::v1::PubsubMessage) -> Self {
        let publish_time = value
            .publish_time
            .and_then(|t| timestamp_to_datetime(t.seconds, t.nanos));

        let data = String::from_utf8_lossy(&value.data).into_owned();

        let data_json: Value = match serde_json::from_str(&data) {
            Ok(val) => val,
            Err(_) => Value::String(data.clone()),
        };

        let attributes_json = Value::Object(Map::from_iter(
            value
                .attributes
                .iter()
                .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned()))),
        ));

        Self {
            id: value.message_id,
            publish_time,
            data,
            data_json,
            attributes: value.attributes,
            attributes_json,
        }
    }
}

fn timestamp_to_datetime(seconds: i64, nanos: i32) -> Option<DateTime<Utc>> {
    match Utc.timestamp_opt(seconds, nanos.try_into().unwrap_or(0)) {
        chrono::LocalResult::Single(dt) => Some(dt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proto_message(data: &[u8]) -> google_cloud_googleapis::pubsub::v1::PubsubMessage {
        google_cloud_googleapis::pubsub::v1::PubsubMessage {
            data: data.to_vec().into(),
            message_id: "message-id-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn converts_json_payload() {
        let message = PubsubMessage::from(proto_message(br#"{"key":"value"}"#));

        assert_eq!(message.id, "message-id-1");
        assert_eq!(message.data, r#"{"key":"value"}"#);
        assert_eq!(message.data_json["key"], "value");
        assert!(message.publish_time.is_none());
    }

    #[test]
    fn non_json_payload_falls_back_to_string() {
        let message = PubsubMessage::from(proto_message(b"plain text"));

        assert_eq!(message.data_json, Value::String("plain text".to_string()));
    }

    #[test]
    fn attributes_become_json_object() {
        let mut proto = proto_message(b"{}");
        proto
            .attributes
            .insert("origin".to_string(), "subman".to_string());

        let message = PubsubMessage::from(proto);

        assert_eq!(message.attributes_json["origin"], "subman");
        assert_eq!(message.attributes["origin"], "subman");
    }

    #[test]
    fn timestamp_conversion() {
        let dt = timestamp_to_datetime(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.timestamp_subsec_nanos(), 500_000_000);

        assert!(timestamp_to_datetime(i64::MAX, 0).is_none());
    }
}
