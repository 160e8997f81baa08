use std::future::Future;

use crate::error::ValidationError;
use crate::message::Message;

/// Business logic of a subscription.
///
/// Returning `Ok` acknowledges the message. Returning `Err` makes the push
/// endpoint answer with a 5xx so the backend redelivers later, following its
/// own retry policy.
pub trait MessageHandler: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn handle(&self, message: Message) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Adapts an async closure into a [`MessageHandler`].
///
/// ```
/// use trogon_pubsub::{Message, handler_fn};
///
/// let printer = handler_fn(|message: Message| async move {
///     println!("{}", message.text().unwrap_or_default());
///     Ok::<(), std::convert::Infallible>(())
/// });
/// # let _ = printer;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

impl<F, Fut, E> MessageHandler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn handle(&self, message: Message) -> impl Future<Output = Result<(), E>> + Send {
        (self.f)(message)
    }
}

/// A named push subscription on a topic, together with its handler.
///
/// Immutable once built: the webhook dispatcher shares it across request
/// tasks without synchronisation.
#[derive(Debug)]
pub struct Subscription<H> {
    topic: String,
    name: String,
    handler: H,
}

impl<H> Subscription<H> {
    /// Builds a subscription without validating it. [`Adapter::prepare`] and
    /// [`Provisioner::ensure`] validate before doing anything else.
    ///
    /// [`Adapter::prepare`]: crate::adapter::Adapter::prepare
    /// [`Provisioner::ensure`]: crate::provisioner::Provisioner::ensure
    pub fn new(topic: impl Into<String>, name: impl Into<String>, handler: H) -> Self {
        Self {
            topic: topic.into(),
            name: name.into(),
            handler,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Topic and name must be non-empty and usable as a single URL path
    /// segment of the push endpoint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        check_segment("topic", &self.topic)?;
        check_segment("name", &self.name)
    }
}

impl Subscription<()> {
    pub fn builder(topic: impl Into<String>, name: impl Into<String>) -> SubscriptionBuilder {
        SubscriptionBuilder {
            topic: topic.into(),
            name: name.into(),
        }
    }
}

/// Validating constructor: `Subscription::builder(topic, name).handler(h).build()`.
#[derive(Debug, Clone)]
pub struct SubscriptionBuilder {
    topic: String,
    name: String,
}

impl SubscriptionBuilder {
    pub fn handler<H: MessageHandler>(self, handler: H) -> SubscriptionBuilderWithHandler<H> {
        SubscriptionBuilderWithHandler {
            subscription: Subscription::new(self.topic, self.name, handler),
        }
    }
}

#[derive(Debug)]
pub struct SubscriptionBuilderWithHandler<H> {
    subscription: Subscription<H>,
}

impl<H: MessageHandler> SubscriptionBuilderWithHandler<H> {
    pub fn build(self) -> Result<Subscription<H>, ValidationError> {
        self.subscription.validate()?;
        Ok(self.subscription)
    }
}

fn check_segment(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains(['/', '{', '}', '*', ':']) {
        return Err(ValidationError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
