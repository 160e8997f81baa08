//! Idempotent topic and push-subscription provisioning.

use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::client::{PushSubscriptionConfig, SubscriptionClient};
use crate::dispatcher::registration_path;
use crate::error::{BackendError, ProvisionError, ProvisionStep};
use crate::subscription::Subscription;

/// How long the backend waits for a 200 before redelivering.
pub const ACK_DEADLINE: Duration = Duration::from_secs(10);

/// Makes sure the topic and push subscription behind a [`Subscription`]
/// exist on the backend.
///
/// Resources are checked before they are created, so [`ensure`](Self::ensure)
/// is safe to call on every process start. An existing subscription is
/// never reconfigured: if `host` changes after the first run, the remote push
/// endpoint keeps pointing at the old host.
#[derive(Debug, Clone)]
pub struct Provisioner<C> {
    client: C,
    host: String,
}

impl<C: SubscriptionClient> Provisioner<C> {
    /// `host` is the base URL the backend pushes to, e.g.
    /// `https://subscriber.example.appspot.com`. A trailing `/` is ignored.
    pub fn new(client: C, host: impl Into<String>) -> Self {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        Self { client, host }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn push_endpoint<H>(&self, subscription: &Subscription<H>) -> String {
        format!(
            "{}{}",
            self.host,
            registration_path(subscription.topic(), subscription.name())
        )
    }

    /// Validates the subscription, then creates whatever is missing: the
    /// topic first, then the subscription pointing at it.
    ///
    /// Stops at the first failure. Nothing is rolled back: a topic created
    /// before a failed subscription creation stays in place.
    #[instrument(
        name = "pubsub.ensure",
        skip_all,
        fields(topic = %subscription.topic(), subscription = %subscription.name())
    )]
    pub async fn ensure<H>(&self, subscription: &Subscription<H>) -> Result<(), ProvisionError> {
        subscription.validate()?;

        let topic = self.ensure_topic(subscription.topic()).await?;
        self.ensure_subscription(subscription, topic).await?;

        Ok(())
    }

    async fn ensure_topic(&self, name: &str) -> Result<C::Topic, BackendError> {
        let topic = self.client.topic(name);

        let exists = self
            .client
            .topic_exists(&topic)
            .await
            .map_err(|e| BackendError::new(ProvisionStep::TopicExists, e))?;

        if exists {
            debug!("Topic already exists");
            return Ok(topic);
        }

        let topic = self
            .client
            .create_topic(name)
            .await
            .map_err(|e| BackendError::new(ProvisionStep::CreateTopic, e))?;

        info!("Topic created");
        Ok(topic)
    }

    async fn ensure_subscription<H>(
        &self,
        subscription: &Subscription<H>,
        topic: C::Topic,
    ) -> Result<(), BackendError> {
        let remote = self.client.subscription(subscription.name());

        let exists = self
            .client
            .subscription_exists(&remote)
            .await
            .map_err(|e| BackendError::new(ProvisionStep::SubscriptionExists, e))?;

        if exists {
            debug!("Subscription already exists, leaving its push config untouched");
            return Ok(());
        }

        let config = PushSubscriptionConfig {
            topic,
            ack_deadline: ACK_DEADLINE,
            push_endpoint: self.push_endpoint(subscription),
        };
        let endpoint = config.push_endpoint.clone();

        self.client
            .create_subscription(subscription.name(), config)
            .await
            .map_err(|e| BackendError::new(ProvisionStep::CreateSubscription, e))?;

        info!(push_endpoint = %endpoint, "Push subscription created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::mocks::{MockCall, MockOperation, MockPubSubClient};

    const HOST: &str = "https://subscriber.example.com";

    fn subscription() -> Subscription<()> {
        Subscription::new("test", "testing", ())
    }

    fn provisioner(client: &MockPubSubClient) -> Provisioner<MockPubSubClient> {
        Provisioner::new(client.clone(), HOST)
    }

    #[tokio::test]
    async fn creates_topic_and_subscription_when_missing() {
        let client = MockPubSubClient::new();

        provisioner(&client).ensure(&subscription()).await.unwrap();

        assert_eq!(
            client.calls(),
            vec![
                MockCall::Topic("test".to_string()),
                MockCall::TopicExists("test".to_string()),
                MockCall::CreateTopic("test".to_string()),
                MockCall::Subscription("testing".to_string()),
                MockCall::SubscriptionExists("testing".to_string()),
                MockCall::CreateSubscription {
                    name: "testing".to_string(),
                    topic: "test".to_string(),
                    ack_deadline: Duration::from_secs(10),
                    push_endpoint: format!("{HOST}/_handlers/topics/test/subscribers/testing"),
                },
            ]
        );
        assert!(client.has_topic("test"));
        assert!(client.has_subscription("testing"));
    }

    #[tokio::test]
    async fn existing_topic_handle_is_reused() {
        let client = MockPubSubClient::new().with_topic("test");

        provisioner(&client).ensure(&subscription()).await.unwrap();

        assert_eq!(client.count(|c| matches!(c, MockCall::CreateTopic(_))), 0);
        assert!(client.calls().contains(&MockCall::CreateSubscription {
            name: "testing".to_string(),
            topic: "test".to_string(),
            ack_deadline: ACK_DEADLINE,
            push_endpoint: format!("{HOST}/_handlers/topics/test/subscribers/testing"),
        }));
    }

    #[tokio::test]
    async fn existing_subscription_is_left_untouched() {
        let client = MockPubSubClient::new()
            .with_topic("test")
            .with_subscription("testing");

        provisioner(&client).ensure(&subscription()).await.unwrap();

        assert_eq!(client.create_count(), 0);
    }

    #[tokio::test]
    async fn second_ensure_creates_nothing() {
        let client = MockPubSubClient::new();
        let provisioner = provisioner(&client);

        provisioner.ensure(&subscription()).await.unwrap();
        client.clear_calls();
        provisioner.ensure(&subscription()).await.unwrap();

        assert_eq!(client.create_count(), 0);
    }

    #[tokio::test]
    async fn validation_happens_before_any_backend_call() {
        let client = MockPubSubClient::new();

        let err = provisioner(&client)
            .ensure(&Subscription::new("", "testing", ()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(ValidationError::EmptyTopic)));

        let err = provisioner(&client)
            .ensure(&Subscription::new("test", "", ()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(ValidationError::EmptyName)));

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn topic_exists_failure_stops_everything() {
        let client = MockPubSubClient::new();
        client.fail_on(MockOperation::TopicExists);

        let err = provisioner(&client).ensure(&subscription()).await.unwrap_err();

        assert_eq!(err.step(), Some(ProvisionStep::TopicExists));
        assert_eq!(
            client.calls(),
            vec![
                MockCall::Topic("test".to_string()),
                MockCall::TopicExists("test".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn create_topic_failure_skips_subscription_steps() {
        let client = MockPubSubClient::new();
        client.fail_on(MockOperation::CreateTopic);

        let err = provisioner(&client).ensure(&subscription()).await.unwrap_err();

        assert_eq!(err.step(), Some(ProvisionStep::CreateTopic));
        assert_eq!(
            client.count(|c| matches!(
                c,
                MockCall::Subscription(_)
                    | MockCall::SubscriptionExists(_)
                    | MockCall::CreateSubscription { .. }
            )),
            0
        );
    }

    #[tokio::test]
    async fn subscription_exists_failure_skips_creation() {
        let client = MockPubSubClient::new();
        client.fail_on(MockOperation::SubscriptionExists);

        let err = provisioner(&client).ensure(&subscription()).await.unwrap_err();

        assert_eq!(err.step(), Some(ProvisionStep::SubscriptionExists));
        assert_eq!(
            client.count(|c| matches!(c, MockCall::CreateSubscription { .. })),
            0
        );
    }

    #[tokio::test]
    async fn create_subscription_failure_keeps_the_created_topic() {
        let client = MockPubSubClient::new();
        client.fail_on(MockOperation::CreateSubscription);

        let err = provisioner(&client).ensure(&subscription()).await.unwrap_err();

        assert_eq!(err.step(), Some(ProvisionStep::CreateSubscription));
        assert!(client.has_topic("test"));
        assert!(!client.has_subscription("testing"));
    }

    #[test]
    fn trailing_slash_on_host_is_ignored() {
        let provisioner = Provisioner::new(MockPubSubClient::new(), "https://svc.appspot.com/");
        assert_eq!(
            provisioner.push_endpoint(&subscription()),
            "https://svc.appspot.com/_handlers/topics/test/subscribers/testing"
        );
    }
}
