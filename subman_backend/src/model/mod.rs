mod pubsub_message;
mod pubsub_message_to_publish;

pub use pubsub_message::PubsubMessage;
pub use pubsub_message_to_publish::PubsubMessageToPublish;

use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TopicName(pub String);

impl TopicName {
    pub fn fully_qualified(&self, project_id: &str) -> String {
        format!("projects/{}/topics/{}", project_id, self.0)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionName(pub String);

impl SubscriptionName {
    pub fn fully_qualified(&self, project_id: &str) -> String {
        format!("projects/{}/subscriptions/{}", project_id, self.0)
    }
}

impl fmt::Display for SubscriptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// HTTP callback URL registered for push subscriptions. The token is a
/// shared secret the receiving endpoint checks on every delivery.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PushEndpoint<'a> {
    pub project_id: &'a str,
    pub token: &'a str,
    pub topic: &'a str,
}

impl fmt::Display for PushEndpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "https://{}.appspot.com/pubsub/push?token={}&topic={}",
            self.project_id, self.token, self.topic
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_name_fully_qualified() {
        let topic = TopicName("my-topic".to_string());
        assert_eq!(
            topic.fully_qualified("my-project"),
            "projects/my-project/topics/my-topic"
        );
    }

    #[test]
    fn subscription_name_fully_qualified() {
        let sub = SubscriptionName("my-sub".to_string());
        assert_eq!(
            sub.fully_qualified("my-project"),
            "projects/my-project/subscriptions/my-sub"
        );
    }

    #[test]
    fn push_endpoint_url() {
        let endpoint = PushEndpoint {
            project_id: "my-project",
            token: "s3cret",
            topic: "events",
        };
        assert_eq!(
            endpoint.to_string(),
            "https://my-project.appspot.com/pubsub/push?token=s3cret&topic=events"
        );
    }
}
