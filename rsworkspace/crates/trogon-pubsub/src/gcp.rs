//! Google Cloud Pub/Sub backend.
//!
//! Implements the client traits for [`google_cloud_pubsub::client::Client`].
//! Credentials are resolved the usual way (`GOOGLE_APPLICATION_CREDENTIALS`,
//! metadata server, or `PUBSUB_EMULATOR_HOST` for the emulator).

use google_cloud_gax::grpc::Status;
use google_cloud_googleapis::pubsub::v1::PushConfig;
use google_cloud_pubsub::client::{Client, ClientConfig};
use google_cloud_pubsub::subscription::{Subscription, SubscriptionConfig};
use google_cloud_pubsub::topic::Topic;
use thiserror::Error;
use tracing::info;

use crate::client::{PushSubscriptionConfig, SubscriptionClient, TopicClient};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to resolve Google Cloud credentials: {0}")]
    Auth(String),

    #[error("failed to create Pub/Sub client: {0}")]
    Client(String),
}

/// Builds an authenticated client bound to `project_id`.
pub async fn connect(project_id: &str) -> Result<Client, ConnectError> {
    let mut config = ClientConfig::default()
        .with_auth()
        .await
        .map_err(|e| ConnectError::Auth(e.to_string()))?;
    config.project_id = Some(project_id.to_string());

    let client = Client::new(config)
        .await
        .map_err(|e| ConnectError::Client(e.to_string()))?;

    info!(project_id, "Connected to Google Cloud Pub/Sub");
    Ok(client)
}

impl TopicClient for Client {
    type Topic = Topic;
    type TopicError = Status;

    fn topic(&self, name: &str) -> Topic {
        Client::topic(self, name)
    }

    async fn topic_exists(&self, topic: &Topic) -> Result<bool, Status> {
        topic.exists(None).await
    }

    async fn create_topic(&self, name: &str) -> Result<Topic, Status> {
        Client::create_topic(self, name, None, None).await
    }
}

impl SubscriptionClient for Client {
    type Subscription = Subscription;
    type SubscriptionError = Status;

    fn subscription(&self, name: &str) -> Subscription {
        Client::subscription(self, name)
    }

    async fn subscription_exists(&self, subscription: &Subscription) -> Result<bool, Status> {
        subscription.exists(None).await
    }

    async fn create_subscription(
        &self,
        name: &str,
        config: PushSubscriptionConfig<Topic>,
    ) -> Result<Subscription, Status> {
        let subscription_config = SubscriptionConfig {
            push_config: Some(PushConfig {
                push_endpoint: config.push_endpoint,
                ..Default::default()
            }),
            ack_deadline_seconds: i32::try_from(config.ack_deadline.as_secs()).unwrap_or(i32::MAX),
            ..Default::default()
        };

        Client::create_subscription(
            self,
            name,
            config.topic.fully_qualified_name(),
            subscription_config,
            None,
        )
        .await
    }
}
