/// Lint services listening on an ephemeral port.
use axum::Router;
use axum::http::StatusCode;
use axum::routing::put;
use pushproxy::http::lint::lint_metrics;
use tokio::task::JoinHandle;

pub struct LintServer {
    url: String,
    handle: JoinHandle<()>,
}

impl LintServer {
    /// Serves the proxy's own `/lint` endpoint.
    pub async fn start() -> Self {
        Self::spawn(Router::new().route("/lint", put(lint_metrics))).await
    }

    /// Answers every request with the same status and body.
    pub async fn answering(status: StatusCode, body: &'static str) -> Self {
        Self::spawn(Router::new().route("/lint", put(move || async move { (status, body) }))).await
    }

    async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind the lint server");
        let address = listener.local_addr().expect("Failed to read the local address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{}/lint", address),
            handle,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for LintServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
