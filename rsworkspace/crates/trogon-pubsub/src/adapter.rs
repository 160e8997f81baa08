use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use tracing::info;

use crate::client::SubscriptionClient;
use crate::dispatcher::{NOT_FOUND, WebhookDispatcher};
use crate::error::{AdapterError, ValidationError};
use crate::provisioner::Provisioner;
use crate::runner::Runner;
use crate::subscription::{MessageHandler, Subscription};

/// Entry point for applications: prepare subscriptions, then run.
///
/// ```rust,ignore
/// let mut adapter = Adapter::new(client, "https://subscriber.example.com", HttpRunner::new(8080));
/// let printer = Arc::new(Subscription::new("printer", "printing", handler));
/// adapter.prepare(Arc::clone(&printer)).await?;
/// adapter.run(&printer).await?;
/// ```
pub struct Adapter<C, R> {
    provisioner: Provisioner<C>,
    runner: R,
    router: Router,
    registered: BTreeSet<String>,
}

impl<C, R> std::fmt::Debug for Adapter<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

impl<C: SubscriptionClient, R: Runner> Adapter<C, R> {
    pub fn new(client: C, host: impl Into<String>, runner: R) -> Self {
        Self {
            provisioner: Provisioner::new(client, host),
            runner,
            router: Router::new(),
            registered: BTreeSet::new(),
        }
    }

    pub fn provisioner(&self) -> &Provisioner<C> {
        &self.provisioner
    }

    pub fn registered_paths(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }

    /// Router holding every push endpoint registered so far. Any other path
    /// answers 404 `not found`.
    pub fn router(&self) -> Router {
        self.router
            .clone()
            .fallback(|| async { (StatusCode::NOT_FOUND, NOT_FOUND) })
    }

    /// Registers the push endpoint, then provisions the remote topic and
    /// subscription.
    ///
    /// The endpoint is registered first so it is already routable by the
    /// time the backend starts pushing. The first failure is returned as is;
    /// a registered endpoint or a created topic is not undone.
    pub async fn prepare<H: MessageHandler>(
        &mut self,
        subscription: impl Into<Arc<Subscription<H>>>,
    ) -> Result<(), AdapterError> {
        let subscription = subscription.into();
        subscription.validate()?;

        self.register(WebhookDispatcher::new(Arc::clone(&subscription)))?;
        self.provisioner.ensure(&subscription).await?;

        Ok(())
    }

    /// Hands the registered endpoints to the runner and blocks until it stops.
    pub async fn run<H>(&self, subscription: &Subscription<H>) -> Result<(), AdapterError> {
        info!(
            topic = %subscription.topic(),
            subscription = %subscription.name(),
            endpoints = self.registered.len(),
            "Starting push subscriber"
        );

        self.runner
            .run(self.router())
            .await
            .map_err(|e| AdapterError::Run(Box::new(e)))
    }

    fn register<H: MessageHandler>(
        &mut self,
        dispatcher: WebhookDispatcher<H>,
    ) -> Result<(), ValidationError> {
        let path = dispatcher.registration_path().to_string();
        if self.registered.contains(&path) {
            return Err(ValidationError::AlreadyRegistered(path));
        }

        self.router = std::mem::take(&mut self.router).merge(dispatcher.router());
        info!(path = %path, "Push endpoint registered");
        self.registered.insert(path);

        Ok(())
    }
}
