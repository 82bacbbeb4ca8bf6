use hyper::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Failures a proxied exchange or the proxy configuration can produce
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Upstream connection error: {0}")]
    UpstreamConnection(#[from] hyper::Error),

    #[error("Upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Malformed rewrite pattern '{pattern}': {source}")]
    MalformedRule { pattern: String, source: regex::Error },

    #[error("Unexpected request body type: {0}")]
    UnexpectedBodyType(String),

    #[error("Invalid proxy configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid outbound request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),
}

impl ProxyError {
    /// Status the hosting server should answer with when the exchange fails
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamConnection(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UnexpectedBodyType(_) => StatusCode::BAD_REQUEST,
            ProxyError::MalformedRule { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ProxyResult<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(ProxyError::UpstreamTimeout(Duration::from_secs(3)).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ProxyError::UnexpectedBodyType("number".to_string()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::InvalidConfig("no target".to_string()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_malformed_rule_message_names_pattern() {
        let source = regex::Regex::new("^(unclosed").unwrap_err();
        let err = ProxyError::MalformedRule { pattern: "^(unclosed".to_string(), source };
        assert!(err.to_string().contains("'^(unclosed'"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
