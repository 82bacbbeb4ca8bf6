use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::proxy::body::WireBody;
use crate::utils::path::join_paths;
use crate::utils::validation::is_hop_by_hop_header;
use hyper::client::HttpConnector;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Body, Client, Request, Response};
use hyper_tls::HttpsConnector;
use log::{debug, error, trace, warn};
use std::time::{Duration, Instant};

pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the client used for every outbound request, honouring the TLS verification policy
pub fn build_client(verify_tls: bool) -> ProxyResult<UpstreamClient> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let mut tls = native_tls::TlsConnector::builder();
    if !verify_tls {
        warn!("Upstream TLS certificates and host names will not be verified");
        tls.danger_accept_invalid_certs(true).danger_accept_invalid_hostnames(true);
    }
    let tls = tls.build().map_err(|e| ProxyError::InvalidConfig(format!("Failed to build TLS connector: {}", e)))?;

    let https = HttpsConnector::from((http, tokio_native_tls::TlsConnector::from(tls)));
    Ok(Client::builder().build::<_, Body>(https))
}

/// Routing state for exactly one outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRoute {
    // path and query as the backend receives it
    pub path_and_query: String,
    pub uri: String,
}

impl OutboundRoute {
    pub fn new(config: &ProxyConfig, rewritten_path: &str) -> Self {
        let path_and_query = join_paths(config.get_base_path(), rewritten_path);
        let uri = format!("{}{}", config.get_origin(), path_and_query);
        Self { path_and_query, uri }
    }

    /// Build the outbound request: inbound method and end-to-end headers,
    /// configured headers on top, `Host` set to the backend.
    pub fn build_request(&self, config: &ProxyConfig, parts: &Parts, body: WireBody) -> ProxyResult<Request<Body>> {
        let mut headers = HeaderMap::with_capacity(parts.headers.len() + config.get_headers().len() + 1);
        for (name, value) in parts.headers.iter() {
            if name == header::HOST || is_hop_by_hop_header(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        for (name, value) in config.get_headers().iter() {
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(header::HOST, config.get_host().clone());

        let body = match body {
            WireBody::Stream(body) => body,
            WireBody::Full(bytes) => {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
                Body::from(bytes)
            }
        };

        let mut req = Request::builder().method(parts.method.clone()).uri(self.uri.as_str()).body(body)?;
        *req.headers_mut() = headers;
        trace!("Outbound request: {:?}", req);
        Ok(req)
    }
}

/// Send one request upstream. Fails on transport errors or when `timeout` elapses before the response head arrives.
pub async fn dispatch(client: &UpstreamClient, req: Request<Body>, timeout: Option<Duration>) -> ProxyResult<Response<Body>> {
    let uri = req.uri().clone();
    let start = Instant::now();

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, client.request(req)).await {
            Ok(result) => result,
            Err(_) => {
                error!("Upstream {} did not respond within {} ms", uri, limit.as_millis());
                return Err(ProxyError::UpstreamTimeout(limit));
            }
        },
        None => client.request(req).await,
    };

    let mut response = match result {
        Ok(response) => response,
        Err(e) => {
            error!("Upstream request to {} failed after {} ms: {}", uri, start.elapsed().as_millis(), e);
            return Err(ProxyError::UpstreamConnection(e));
        }
    };
    debug!("Upstream {} responded {} in {} ms", uri, response.status(), start.elapsed().as_millis());

    strip_hop_by_hop(response.headers_mut());
    Ok(response)
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let names: Vec<_> = headers.keys().filter(|name| is_hop_by_hop_header(name)).cloned().collect();
    for name in names {
        headers.remove(&name);
    }
}
