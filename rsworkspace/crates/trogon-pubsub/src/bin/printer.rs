//! Push subscriber that logs every message published to the `printer` topic.
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PUB_SUB_PROJECT_ID` | — | Google Cloud project id |
//! | `BASE_HOST` | — | Public base URL of this service |
//! | `PORT` | `8080` | HTTP listening port |
//! | `RUST_LOG` | `info` | Log filter (tracing-subscriber) |

use std::convert::Infallible;
use std::sync::Arc;

use trogon_pubsub::{Adapter, HttpRunner, Message, PubSubConfig, Subscription, gcp, handler_fn};
use trogon_std::env::SystemEnv;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = PubSubConfig::from_env(&SystemEnv);
    let (project_id, host) = match (config.project_id(), config.host()) {
        (Ok(project_id), Ok(host)) => (project_id.to_string(), host.to_string()),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let client = gcp::connect(&project_id).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to connect to Pub/Sub");
        std::process::exit(1);
    });

    let printer = Arc::new(Subscription::new(
        "printer",
        "printing",
        handler_fn(|message: Message| async move {
            tracing::info!(
                message_id = message.message_id().unwrap_or("unknown"),
                payload = %String::from_utf8_lossy(message.data()),
                "Printing message"
            );
            Ok::<(), Infallible>(())
        }),
    ));

    let mut adapter = Adapter::new(client, host, HttpRunner::new(config.port));

    if let Err(e) = adapter.prepare(Arc::clone(&printer)).await {
        tracing::error!(error = %e, "Failed to prepare subscription");
        std::process::exit(1);
    }

    tracing::info!("Subscription is listening");
    if let Err(e) = adapter.run(&printer).await {
        tracing::error!(error = %e, "Subscriber exited with error");
        std::process::exit(1);
    }
}
