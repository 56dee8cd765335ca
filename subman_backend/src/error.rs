use google_cloud_gax::grpc::Status;
use thiserror::Error;

use crate::model::{SubscriptionName, TopicName};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to authenticate with Pub/Sub: {0}")]
    Auth(#[from] google_cloud_pubsub::client::google_cloud_auth::error::Error),

    #[error("failed to connect to Pub/Sub: {0}")]
    Connection(#[from] google_cloud_pubsub::client::Error),

    #[error("no project ID was supplied and none could be resolved from the environment")]
    MissingProjectId,

    #[error("failed to list subscriptions: {0}")]
    ListSubscriptions(Status),

    #[error("failed to create subscription {0}: {1}")]
    CreateSubscription(SubscriptionName, Status),

    #[error("failed to delete subscription {0}: {1}")]
    DeleteSubscription(SubscriptionName, Status),

    #[error("failed to subscribe to {0}: {1}")]
    Subscribe(SubscriptionName, Status),

    #[error("failed to publish to topic {0}: {1}")]
    Publish(TopicName, Status),
}
