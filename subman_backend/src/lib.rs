use std::time::Duration;

use futures_util::StreamExt;
use google_cloud_gax::conn::Environment;
use google_cloud_gax::grpc::Code;
use google_cloud_googleapis::pubsub::v1::PushConfig;
use google_cloud_pubsub::{
    client::{Client, ClientConfig},
    subscription::{Subscription, SubscriptionConfig},
};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod model;

use error::BackendError;
use model::{PubsubMessage, PubsubMessageToPublish, PushEndpoint, SubscriptionName, TopicName};

/// Acknowledgement deadline applied to every subscription this manager
/// creates. Never mutated after creation.
const ACK_DEADLINE_SECONDS: i32 = 10;

#[derive(Debug, Default)]
pub struct ManagerConfig {
    /// Explicit project ID, overriding whatever the credentials resolve to.
    pub project_id: Option<String>,
    /// Override for the Pub/Sub Emulator project ID. Only applied when the
    /// client is actually talking to an emulator.
    pub emulator_project_id: Option<String>,
}

pub struct SubscriptionManager {
    project_id: String,
    client: Client,
}

impl SubscriptionManager {
    pub async fn new(config: ManagerConfig) -> Result<Self, BackendError> {
        let mut client_config = ClientConfig::default().with_auth().await?;

        if let (Environment::Emulator(_), Some(emulator_project_id)) =
            (&client_config.environment, config.emulator_project_id)
        {
            client_config.project_id = Some(emulator_project_id);
        }

        if let Some(project_id) = config.project_id {
            client_config.project_id = Some(project_id);
        }

        let project_id = client_config
            .project_id
            .clone()
            .ok_or(BackendError::MissingProjectId)?;

        let client = Client::new(client_config).await?;

        Ok(Self { project_id, client })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Creates a pull subscription bound to `topic` unless one with the
    /// same ID already exists, in which case the existing one is returned.
    pub async fn ensure_pull_subscription(
        &self,
        topic: &TopicName,
        sub_name: &SubscriptionName,
    ) -> Result<Subscription, BackendError> {
        self.ensure_subscription(topic, sub_name, None).await
    }

    /// Creates a push subscription bound to `topic` unless one with the
    /// same ID already exists. The registered endpoint embeds `token` as a
    /// shared secret query parameter.
    pub async fn ensure_push_subscription(
        &self,
        topic: &TopicName,
        sub_name: &SubscriptionName,
        token: &str,
    ) -> Result<Subscription, BackendError> {
        let push_endpoint = PushEndpoint {
            project_id: &self.project_id,
            token,
            topic: &topic.0,
        };

        let push_config = PushConfig {
            push_endpoint: push_endpoint.to_string(),
            ..Default::default()
        };

        self.ensure_subscription(topic, sub_name, Some(push_config))
            .await
    }

    // Listing then creating is not atomic. Concurrent callers may both miss
    // the existing subscription and race on creation; the loser's
    // AlreadyExists is resolved to the subscription the winner created.
    async fn ensure_subscription(
        &self,
        topic: &TopicName,
        sub_name: &SubscriptionName,
        push_config: Option<PushConfig>,
    ) -> Result<Subscription, BackendError> {
        for subscription in self.list_subscriptions().await? {
            if subscription.id() == sub_name.0 {
                info!("subscription already exists: {sub_name}");
                return Ok(subscription);
            }
        }

        let config = SubscriptionConfig {
            push_config,
            ack_deadline_seconds: ACK_DEADLINE_SECONDS,
            ..Default::default()
        };

        match self
            .client
            .create_subscription(
                &sub_name.0,
                &topic.fully_qualified(&self.project_id),
                config,
                None,
            )
            .await
        {
            Ok(subscription) => {
                info!("successfully created subscription: {sub_name}");
                Ok(subscription)
            }
            Err(status) if status.code() == Code::AlreadyExists => {
                info!("subscription already exists: {sub_name}");
                Ok(self.client.subscription(&sub_name.0))
            }
            Err(status) => Err(BackendError::CreateSubscription(sub_name.clone(), status)),
        }
    }

    /// All subscriptions under the configured project. Pagination happens
    /// inside the client.
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, BackendError> {
        let subscriptions = self
            .client
            .get_subscriptions(None)
            .await
            .map_err(BackendError::ListSubscriptions)?;

        for subscription in &subscriptions {
            info!("{}", subscription.fully_qualified_name());
        }

        Ok(subscriptions)
    }

    pub async fn delete_subscription(
        &self,
        sub_name: &SubscriptionName,
    ) -> Result<(), BackendError> {
        self.client
            .subscription(&sub_name.0)
            .delete(None)
            .await
            .map_err(|status| BackendError::DeleteSubscription(sub_name.clone(), status))?;

        info!("deleted subscription: {sub_name}");
        Ok(())
    }

    /// Publishes a single message and returns its server-assigned ID.
    pub async fn publish(
        &self,
        topic: &TopicName,
        message: PubsubMessageToPublish,
    ) -> Result<String, BackendError> {
        let topic_handle = self.client.topic(&topic.0);
        let publisher = topic_handle.new_publisher(None);

        let awaiter = publisher.publish(message.into()).await;
        let message_id = awaiter
            .get()
            .await
            .map_err(|status| BackendError::Publish(topic.clone(), status))?;

        info!("published message: {message_id}");
        Ok(message_id)
    }

    /// Opens a single streaming pull on `sub_name`, logs and acknowledges
    /// every delivered message, and returns the number acknowledged. The
    /// session ends when `timeout` elapses, `cancel_token` fires, or the
    /// stream closes. Ack failures are logged and never end the session.
    pub async fn receive(
        &self,
        sub_name: &SubscriptionName,
        timeout: Duration,
        cancel_token: CancellationToken,
    ) -> Result<usize, BackendError> {
        let subscription = self.client.subscription(&sub_name.0);

        let mut stream = subscription
            .subscribe(None)
            .await
            .map_err(|status| BackendError::Subscribe(sub_name.clone(), status))?;

        let mut acked = 0usize;

        let pull_messages_future = async {
            while let Some(message) = stream.next().await {
                let received = PubsubMessage::from(message.message.clone());
                info!("id: {}", received.id);
                info!("data: {}", received.data);

                match message.ack().await {
                    Ok(()) => acked += 1,
                    Err(status) => warn!("failed to ack message {}: {status}", received.id),
                }
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                info!("receive session reached its {}s limit", timeout.as_secs());
            }
            _ = cancel_token.cancelled() => {
                info!("receive session cancelled");
            }
            _ = pull_messages_future => {}
        }

        Ok(acked)
    }
}
