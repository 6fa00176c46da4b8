use axum::body::Bytes;
use axum::http::Method;

/// One inbound metrics submission, as received from the client.
///
/// The request is never mutated: the body and headers that reach the gateway
/// are the ones stored here.
#[derive(Debug, Clone)]
pub struct PushRequest {
    target_url: String,
    method: Method,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl PushRequest {
    pub fn new(
        target_url: impl Into<String>,
        method: Method,
        headers: Vec<(String, String)>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            method,
            headers,
            body: body.into(),
        }
    }

    /// A PUT request without headers, as most Push Gateway clients send it.
    pub fn put(target_url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(target_url, Method::PUT, Vec::new(), body)
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// True when the body is empty or only made of whitespace.
    ///
    /// Whitespace is the Unicode definition, so vertical tabs and
    /// no-break spaces count. Non-UTF-8 bodies fall back to ASCII.
    pub fn is_blank(&self) -> bool {
        match self.body_text() {
            Ok(text) => text.trim().is_empty(),
            Err(_) => self
                .body
                .iter()
                .all(|byte| byte.is_ascii_whitespace() || *byte == 0x0b),
        }
    }

    pub fn body_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}
