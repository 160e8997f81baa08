//! Test doubles for the backend client and the serving process.
//!
//! Enabled with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! trogon-pubsub = { path = "...", features = ["test-support"] }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;

use crate::client::{PushSubscriptionConfig, SubscriptionClient, TopicClient};
use crate::runner::Runner;

// ── MockPubSubClient ──────────────────────────────────────────────────────────

/// Every call the provisioner made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Topic(String),
    TopicExists(String),
    CreateTopic(String),
    Subscription(String),
    SubscriptionExists(String),
    CreateSubscription {
        name: String,
        topic: String,
        ack_deadline: Duration,
        push_endpoint: String,
    },
}

/// Remote operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    TopicExists,
    CreateTopic,
    SubscriptionExists,
    CreateSubscription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTopic {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSubscription {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MockBackendError(pub String);

impl std::fmt::Display for MockBackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockBackendError {}

#[derive(Debug, Default)]
struct Backend {
    topics: HashSet<String>,
    subscriptions: HashSet<String>,
    failing: HashSet<MockOperation>,
    calls: Vec<MockCall>,
}

/// In-memory Pub/Sub backend that records every call.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the provisioner owns another.
#[derive(Debug, Clone, Default)]
pub struct MockPubSubClient {
    backend: Arc<Mutex<Backend>>,
}

impl MockPubSubClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a topic that already exists remotely.
    pub fn with_topic(self, name: &str) -> Self {
        self.lock().topics.insert(name.to_string());
        self
    }

    /// Seed a subscription that already exists remotely.
    pub fn with_subscription(self, name: &str) -> Self {
        self.lock().subscriptions.insert(name.to_string());
        self
    }

    pub fn fail_on(&self, operation: MockOperation) {
        self.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: MockOperation) {
        self.lock().failing.remove(&operation);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(*c)).count()
    }

    /// Number of `create_topic` plus `create_subscription` calls.
    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::CreateTopic(_) | MockCall::CreateSubscription { .. }))
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn has_topic(&self, name: &str) -> bool {
        self.lock().topics.contains(name)
    }

    pub fn has_subscription(&self, name: &str) -> bool {
        self.lock().subscriptions.contains(name)
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: MockCall, operation: Option<MockOperation>) -> Result<(), MockBackendError> {
        let mut backend = self.lock();
        backend.calls.push(call);
        match operation {
            Some(op) if backend.failing.contains(&op) => {
                Err(MockBackendError(format!("mock: {op:?} failed")))
            }
            _ => Ok(()),
        }
    }
}

impl TopicClient for MockPubSubClient {
    type Topic = MockTopic;
    type TopicError = MockBackendError;

    fn topic(&self, name: &str) -> MockTopic {
        let _ = self.record(MockCall::Topic(name.to_string()), None);
        MockTopic {
            name: name.to_string(),
        }
    }

    async fn topic_exists(&self, topic: &MockTopic) -> Result<bool, MockBackendError> {
        self.record(
            MockCall::TopicExists(topic.name.clone()),
            Some(MockOperation::TopicExists),
        )?;
        Ok(self.has_topic(&topic.name))
    }

    async fn create_topic(&self, name: &str) -> Result<MockTopic, MockBackendError> {
        self.record(
            MockCall::CreateTopic(name.to_string()),
            Some(MockOperation::CreateTopic),
        )?;
        if !self.lock().topics.insert(name.to_string()) {
            return Err(MockBackendError(format!("mock: topic {name} already exists")));
        }
        Ok(MockTopic {
            name: name.to_string(),
        })
    }
}

impl SubscriptionClient for MockPubSubClient {
    type Subscription = MockSubscription;
    type SubscriptionError = MockBackendError;

    fn subscription(&self, name: &str) -> MockSubscription {
        let _ = self.record(MockCall::Subscription(name.to_string()), None);
        MockSubscription {
            name: name.to_string(),
        }
    }

    async fn subscription_exists(
        &self,
        subscription: &MockSubscription,
    ) -> Result<bool, MockBackendError> {
        self.record(
            MockCall::SubscriptionExists(subscription.name.clone()),
            Some(MockOperation::SubscriptionExists),
        )?;
        Ok(self.has_subscription(&subscription.name))
    }

    async fn create_subscription(
        &self,
        name: &str,
        config: PushSubscriptionConfig<MockTopic>,
    ) -> Result<MockSubscription, MockBackendError> {
        self.record(
            MockCall::CreateSubscription {
                name: name.to_string(),
                topic: config.topic.name.clone(),
                ack_deadline: config.ack_deadline,
                push_endpoint: config.push_endpoint,
            },
            Some(MockOperation::CreateSubscription),
        )?;
        if !self.lock().subscriptions.insert(name.to_string()) {
            return Err(MockBackendError(format!(
                "mock: subscription {name} already exists"
            )));
        }
        Ok(MockSubscription {
            name: name.to_string(),
        })
    }
}

// ── MockRunner ────────────────────────────────────────────────────────────────

/// Runner that returns immediately instead of serving, keeping the router it
/// was handed so tests can drive it with `tower::ServiceExt::oneshot`.
#[derive(Clone, Default)]
pub struct MockRunner {
    runs: Arc<Mutex<Vec<Router>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_with.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Router passed to the most recent `run`.
    pub fn last_router(&self) -> Option<Router> {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl std::fmt::Debug for MockRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRunner")
            .field("run_count", &self.run_count())
            .finish_non_exhaustive()
    }
}

impl Runner for MockRunner {
    type Error = MockBackendError;

    async fn run(&self, router: Router) -> Result<(), MockBackendError> {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(router);
        match self
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(message) => Err(MockBackendError(message)),
            None => Ok(()),
        }
    }
}
