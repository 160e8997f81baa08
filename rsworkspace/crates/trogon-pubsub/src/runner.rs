use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tracing::info;

/// Keeps the push endpoints reachable until the process stops.
pub trait Runner: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn run(&self, router: Router) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Serves the registered push endpoints over plain HTTP with axum.
///
/// Each request runs on its own task; the hosting platform (App Engine,
/// Cloud Run, ...) terminates TLS in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRunner {
    addr: SocketAddr,
}

impl HttpRunner {
    /// Listen on all interfaces.
    pub fn new(port: u16) -> Self {
        Self::with_addr(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    pub fn with_addr(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Runner for HttpRunner {
    type Error = std::io::Error;

    async fn run(&self, router: Router) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Push endpoint server listening");

        axum::serve(listener, router).await
    }
}
