use crate::handlers;
use crate::registry::MetricsRegistry;
use anyhow::Context;
use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Scrape endpoint serving `/metrics` and `/health`.
///
/// The listener is bound in [`MetricsServer::bind`] so an unavailable port is
/// reported before anything else starts.
pub struct MetricsServer {
    listener: TcpListener,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Binds the listening socket.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: &str, registry: Arc<MetricsRegistry>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind metrics endpoint on {addr}"))?;
        Ok(Self { listener, registry })
    }

    /// Address actually bound (useful with port 0).
    ///
    /// # Errors
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn router(registry: Arc<MetricsRegistry>) -> Router {
        Router::new()
            .route("/metrics", get(handlers::metrics))
            .route("/health", get(handlers::health))
            .layer(TraceLayer::new_for_http())
            .with_state(registry)
    }

    /// Serves scrapes until `shutdown` completes.
    ///
    /// # Errors
    /// Returns an error if the server fails while accepting connections.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("Metrics endpoint listening on http://{}/metrics", addr);

        axum::serve(self.listener, Self::router(self.registry))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Metrics endpoint stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spread_watch_core::MetricsPublisher;
    use tokio::sync::oneshot;

    async fn start(registry: Arc<MetricsRegistry>) -> (SocketAddr, oneshot::Sender<()>) {
        let server = MetricsServer::bind("127.0.0.1:0", registry).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.serve(async move {
            let _ = rx.await;
        }));
        (addr, tx)
    }

    #[tokio::test]
    async fn test_scrape_metrics_over_http() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.set_spread_delta("BTCUSDT", 0.03);
        let (addr, _shutdown) = start(Arc::clone(&registry)).await;

        let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["content-type"],
            handlers::PROMETHEUS_CONTENT_TYPE
        );
        let body = response.text().await.unwrap();
        assert!(body.contains("price_spread_delta{symbol=\"BTCUSDT\"} 0.03"));
    }

    #[tokio::test]
    async fn test_health_reports_readiness() {
        let registry = Arc::new(MetricsRegistry::new());
        let (addr, _shutdown) = start(Arc::clone(&registry)).await;
        let url = format!("http://{addr}/health");

        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "STARTING");

        registry.record_iteration();
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (addr, _shutdown) = start(Arc::new(MetricsRegistry::new())).await;
        let response = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_an_error() {
        let registry = Arc::new(MetricsRegistry::new());
        let first = MetricsServer::bind("127.0.0.1:0", Arc::clone(&registry))
            .await
            .unwrap();
        let addr = first.local_addr().unwrap();

        let second = MetricsServer::bind(&addr.to_string(), registry).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let server = MetricsServer::bind("127.0.0.1:0", Arc::new(MetricsRegistry::new()))
            .await
            .unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
