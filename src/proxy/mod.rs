// Proxy module
//
// This module contains the rewrite-and-forward pipeline split into focused submodules:
// - rules: Ordered regex rule matching
// - body: Inbound body forms and their wire representation
// - forwarder: Outbound client, request building and dispatch
// - response_rewriter: Location, status, cookie and length rewriting of upstream responses
// - request_handler: The per-request orchestration
// - http_server: Hosting the proxy on a hyper server

pub mod body;
pub mod forwarder;
pub mod http_server;
pub mod request_handler;
pub mod response_rewriter;
pub mod rules;

pub use http_server::start_rp_server;
pub use request_handler::ReverseProxy;
