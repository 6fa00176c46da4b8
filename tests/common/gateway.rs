/// A Push Gateway stand-in listening on an ephemeral port.
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::put;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// One request as the gateway saw it.
#[derive(Debug, Clone)]
pub struct ReceivedPush {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct GatewayState {
    status: StatusCode,
    delay: Duration,
    received: Arc<Mutex<Vec<ReceivedPush>>>,
    groups: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

pub struct FakeGateway {
    base_url: String,
    state: GatewayState,
    handle: JoinHandle<()>,
}

impl FakeGateway {
    /// A gateway accepting every push.
    pub async fn start() -> Self {
        Self::spawn(StatusCode::OK, Duration::ZERO).await
    }

    /// A gateway answering `status` to every push.
    pub async fn answering(status: StatusCode) -> Self {
        Self::spawn(status, Duration::ZERO).await
    }

    /// A gateway that waits before answering.
    pub async fn slow(delay: Duration) -> Self {
        Self::spawn(StatusCode::OK, delay).await
    }

    async fn spawn(status: StatusCode, delay: Duration) -> Self {
        let state = GatewayState {
            status,
            delay,
            received: Arc::default(),
            groups: Arc::default(),
        };
        let app = Router::new()
            .route("/metrics/{*grouping_key}", put(receive).post(receive))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind the fake gateway");
        let address = listener.local_addr().expect("Failed to read the local address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}", address),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a path on this gateway.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn received(&self) -> Vec<ReceivedPush> {
        self.state.received.lock().unwrap().clone()
    }

    /// What the gateway stores for a grouping key path.
    pub fn group(&self, path: &str) -> Option<Vec<u8>> {
        self.state.groups.lock().unwrap().get(path).cloned()
    }
}

impl Drop for FakeGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn receive(
    State(state): State<GatewayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    tokio::time::sleep(state.delay).await;

    let path = uri.path().to_string();
    state.received.lock().unwrap().push(ReceivedPush {
        method: method.clone(),
        path: path.clone(),
        headers,
        body: body.clone(),
    });

    if !state.status.is_success() {
        return (
            state.status,
            "pushed metrics are invalid or inconsistent with existing metrics",
        );
    }

    let mut groups = state.groups.lock().unwrap();
    if method == Method::POST {
        groups.entry(path).or_default().extend_from_slice(&body);
    } else {
        groups.insert(path, body.to_vec());
    }
    (state.status, "")
}
