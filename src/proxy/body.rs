use crate::error::{ProxyError, ProxyResult};
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Body, Method, Request};
use log::{debug, warn};
use serde_json::Value;

/// Methods whose request body is forwarded even when it was already read or parsed
pub const BODY_METHODS: [Method; 7] = [Method::HEAD, Method::POST, Method::PUT, Method::DELETE, Method::CONNECT, Method::OPTIONS, Method::PATCH];

pub fn carries_body(method: &Method) -> bool {
    BODY_METHODS.contains(method)
}

/// Inbound body in whatever form the host handed it over
#[derive(Debug)]
pub enum RequestBody {
    Stream(Body),
    Bytes(Bytes),
    Text(String),
    Json(Value),
}

/// Body as it is written to the backend
#[derive(Debug)]
pub enum WireBody {
    Stream(Body),
    // Written in one piece with a recomputed Content-Length
    Full(Bytes),
}

/// One inbound exchange, owned by the call that proxies it
#[derive(Debug)]
pub struct ProxyRequest {
    pub parts: Parts,
    pub body: RequestBody,
}

impl ProxyRequest {
    pub fn new(parts: Parts, body: RequestBody) -> Self {
        Self { parts, body }
    }

    /// Path and query as received, `/` when the URI carries none
    pub fn path_and_query(&self) -> &str {
        self.parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
    }
}

impl From<Request<Body>> for ProxyRequest {
    fn from(req: Request<Body>) -> Self {
        let (parts, body) = req.into_parts();
        Self { parts, body: RequestBody::Stream(body) }
    }
}

impl RequestBody {
    fn describe(&self) -> &'static str {
        match self {
            RequestBody::Stream(_) => "stream",
            RequestBody::Bytes(_) => "bytes",
            RequestBody::Text(_) => "text",
            RequestBody::Json(Value::Null) => "json null",
            RequestBody::Json(Value::Bool(_)) => "json boolean",
            RequestBody::Json(Value::Number(_)) => "json number",
            RequestBody::Json(Value::String(_)) => "json string",
            RequestBody::Json(Value::Array(_)) => "json array",
            RequestBody::Json(Value::Object(_)) => "json object",
        }
    }

    /// Convert to the wire form for `method`. Structured bodies are serialized;
    /// bodies that have no wire form are rejected rather than dropped.
    pub fn into_wire(self, method: &Method) -> ProxyResult<WireBody> {
        if !carries_body(method) {
            return Ok(match self {
                RequestBody::Stream(body) => WireBody::Stream(body),
                other => {
                    warn!("Dropping pre-read {} body on {} request", other.describe(), method);
                    WireBody::Stream(Body::empty())
                }
            });
        }

        let kind = self.describe();
        let wire = match self {
            RequestBody::Stream(body) => WireBody::Stream(body),
            RequestBody::Bytes(bytes) => WireBody::Full(bytes),
            RequestBody::Text(text) => WireBody::Full(Bytes::from(text)),
            RequestBody::Json(Value::String(text)) => WireBody::Full(Bytes::from(text)),
            RequestBody::Json(value @ (Value::Object(_) | Value::Array(_) | Value::Null)) => {
                let serialized = serde_json::to_vec(&value).map_err(|e| ProxyError::UnexpectedBodyType(format!("{}: {}", kind, e)))?;
                debug!("Re-serialized {} body ({} bytes)", kind, serialized.len());
                WireBody::Full(Bytes::from(serialized))
            }
            RequestBody::Json(_) => return Err(ProxyError::UnexpectedBodyType(format!("{} cannot be sent as a {} body", kind, method))),
        };
        Ok(wire)
    }
}
