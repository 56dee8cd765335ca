use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PubsubMessageToPublish {
    data: String,
    attributes: HashMap<String, String>,
}

impl PubsubMessageToPublish {
    pub fn new(data: String, attributes: HashMap<String, String>) -> Self {
        Self { data, attributes }
    }
}

impl From<PubsubMessageToPublish> for google_cloud_googleapis::pubsub::v1::PubsubMessage {
    fn from(val: PubsubMessageToPublish) -> Self {
        Self {
            data: val.data.into(),
            attributes: val.attributes,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_proto_message() {
        let message = PubsubMessageToPublish::new(
            "hello".to_string(),
            HashMap::from([("k".to_string(), "v".to_string())]),
        );

        let proto: google_cloud_googleapis::pubsub::v1::PubsubMessage = message.into();

        assert_eq!(proto.data, "hello".as_bytes());
        assert_eq!(proto.attributes["k"], "v");
        assert!(proto.message_id.is_empty());
    }
}
