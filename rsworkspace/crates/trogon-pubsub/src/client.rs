//! Backend client traits.
//!
//! The provisioner depends only on these operations, never on a concrete
//! SDK. Production code uses the `google-cloud-pubsub` client (feature
//! `gcp`); tests use [`MockPubSubClient`](crate::mocks::MockPubSubClient).

use std::error::Error;
use std::future::Future;
use std::time::Duration;

pub trait TopicClient: Send + Sync + Clone + 'static {
    /// Handle to a remote topic. Obtaining one never touches the network.
    type Topic: Send + Sync;
    type TopicError: Error + Send + Sync + 'static;

    fn topic(&self, name: &str) -> Self::Topic;

    fn topic_exists(
        &self,
        topic: &Self::Topic,
    ) -> impl Future<Output = Result<bool, Self::TopicError>> + Send;

    fn create_topic(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Self::Topic, Self::TopicError>> + Send;
}

pub trait SubscriptionClient: TopicClient {
    /// Handle to a remote subscription. Obtaining one never touches the network.
    type Subscription: Send + Sync;
    type SubscriptionError: Error + Send + Sync + 'static;

    fn subscription(&self, name: &str) -> Self::Subscription;

    fn subscription_exists(
        &self,
        subscription: &Self::Subscription,
    ) -> impl Future<Output = Result<bool, Self::SubscriptionError>> + Send;

    fn create_subscription(
        &self,
        name: &str,
        config: PushSubscriptionConfig<Self::Topic>,
    ) -> impl Future<Output = Result<Self::Subscription, Self::SubscriptionError>> + Send;
}

/// Settings for a new push subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSubscriptionConfig<T> {
    pub topic: T,
    pub ack_deadline: Duration,
    pub push_endpoint: String,
}
