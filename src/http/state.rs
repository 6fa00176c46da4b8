use crate::proxy::PushPipeline;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub name: Arc<String>,
    pub pipeline: Arc<PushPipeline>,
    /// Push Gateway behind the `/metrics/job/...` route, if any.
    pub gateway_url: Option<Arc<String>>,
}
