use crate::config::ProxyConfig;
use crate::error::ProxyResult;
use crate::proxy::body::ProxyRequest;
use crate::proxy::forwarder::{OutboundRoute, UpstreamClient, build_client, dispatch};
use crate::proxy::response_rewriter::ResponseRewriter;
use hyper::{Body, Response};
use log::{debug, info};
use std::sync::Arc;

/// Rewrite-and-forward unit. Configuration and client are shared read-only;
/// every call owns its request, route and response.
#[derive(Clone)]
pub struct ReverseProxy {
	config: Arc<ProxyConfig>,
	client: UpstreamClient,
}

impl ReverseProxy {
	pub fn new(config: ProxyConfig) -> ProxyResult<Self> {
		let client = build_client(config.is_tls_verified())?;
		Ok(Self { config: Arc::new(config), client })
	}

	pub fn config(&self) -> &ProxyConfig {
		&self.config
	}

	/// Proxy one exchange. Resolves with the rewritten upstream response once its
	/// head has arrived; the body streams through untouched. Any transport
	/// failure fails the whole call and nothing is retried.
	pub async fn handle(&self, req: impl Into<ProxyRequest>) -> ProxyResult<Response<Body>> {
		let req: ProxyRequest = req.into();
		let inbound = req.path_and_query().to_string();
		let ProxyRequest { parts, body } = req;

		let rewritten = self.config.get_path_rules().rewrite(&inbound);
		if rewritten != inbound {
			debug!("Request path rewritten {inbound} -> {rewritten}", inbound = inbound, rewritten = rewritten);
		}

		let wire = body.into_wire(&parts.method)?;
		let route = OutboundRoute::new(&self.config, &rewritten);
		let outbound = route.build_request(&self.config, &parts, wire)?;

		let response = dispatch(&self.client, outbound, self.config.get_upstream_timeout()).await?;
		let upstream_status = response.status();

		let rewriter = ResponseRewriter::new(self.config.get_location_rules(), self.config.get_auth_cookie_name());
		let response = rewriter.rewrite(response, &route.path_and_query);

		info!(
			"{method} {inbound} -> {uri} [{upstream} -> {status}]",
			method = parts.method,
			inbound = inbound,
			uri = route.uri,
			upstream = upstream_status.as_u16(),
			status = response.status().as_u16()
		);
		Ok(response)
	}
}
