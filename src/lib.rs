//! Reverse proxy that forwards a public BFF API prefix to a backend while masking
//! the backend: request paths, `Location` headers and auth cookie clearing are
//! rewritten, and redirects that would expose the backend are turned into `202`.

pub mod config;
pub mod error;
pub mod proxy;
pub mod utils;

pub use config::{ProxyConfig, ProxySettings};
pub use error::{ProxyError, ProxyResult};
pub use proxy::ReverseProxy;
pub use proxy::body::{ProxyRequest, RequestBody};
