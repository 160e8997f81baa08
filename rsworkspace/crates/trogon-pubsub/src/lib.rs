//! # trogon-pubsub
//!
//! Push subscriptions for Google Cloud Pub/Sub: provision the remote
//! resources, then serve the HTTP endpoint the backend pushes to.
//!
//! ## How it works
//!
//! 1. The application builds a [`Subscription`] (topic, name, handler).
//! 2. [`Adapter::prepare`] registers a [`WebhookDispatcher`] at
//!    `/_handlers/topics/{topic}/subscribers/{name}` and then asks the
//!    [`Provisioner`] to create the topic and a push subscription pointing at
//!    `{BASE_HOST}/_handlers/topics/{topic}/subscribers/{name}` (ack
//!    deadline 10s). Existing resources are reused, never reconfigured.
//! 3. [`Adapter::run`] hands the endpoints to a [`Runner`] ([`HttpRunner`]
//!    serves them with axum).
//! 4. Each push request is decoded and passed to the handler. `200` acks the
//!    message; `500` makes Pub/Sub redeliver it later.
//!
//! ## Responses
//!
//! | Situation | Status | Body |
//! |---|---|---|
//! | handler returned `Ok` | `200` | empty |
//! | wrong path or not `POST` | `404` | `not found` |
//! | invalid JSON envelope or empty `data` | `500` | [`ENVELOPE_ERROR`] |
//! | `data` is not base64 | `500` | [`PAYLOAD_ERROR`] |
//! | handler returned `Err` | `500` | [`EXECUTION_ERROR`] |
//!
//! ## Configuration (env vars)
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PUB_SUB_PROJECT_ID` | — | Google Cloud project id |
//! | `BASE_HOST` | — | Base URL of the push endpoints |
//! | `PORT` | `8080` | HTTP listening port |
//!
//! ## Features
//!
//! - `gcp`: backend client for `google-cloud-pubsub` and the `pubsub-printer` binary.
//! - `test-support`: [`mocks`] for the backend client and runner.

pub mod adapter;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod provisioner;
pub mod runner;
pub mod subscription;

#[cfg(feature = "gcp")]
pub mod gcp;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use adapter::Adapter;
pub use client::{PushSubscriptionConfig, SubscriptionClient, TopicClient};
pub use config::{ConfigError, PubSubConfig};
pub use dispatcher::{
    DecodeError, ENVELOPE_ERROR, EXECUTION_ERROR, NOT_FOUND, PAYLOAD_ERROR, WebhookDispatcher,
    decode_envelope, registration_path,
};
pub use error::{AdapterError, BackendError, ProvisionError, ProvisionStep, ValidationError};
pub use message::Message;
pub use provisioner::{ACK_DEADLINE, Provisioner};
pub use runner::{HttpRunner, Runner};
pub use subscription::{HandlerFn, MessageHandler, Subscription, SubscriptionBuilder, handler_fn};
