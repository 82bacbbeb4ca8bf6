use crate::config::types::{ProxyConfig, ProxySettings, RuleSpec};
use crate::error::{ProxyError, ProxyResult};
use crate::proxy::rules::RuleSet;
use crate::utils::path::trim_trailing_slash;
use hyper::HeaderMap;
use hyper::header::{self, HeaderName, HeaderValue};
use log::{debug, info, warn};
use std::time::Duration;
use url::Url;

pub const TEMPLATE_SUFFIX_HEADER: &str = "x-template-suffix";

impl ProxyConfig {
    /// Validate settings and compile every rule set. All configuration defects surface here.
    pub fn from_settings(settings: ProxySettings) -> ProxyResult<Self> {
        let settings = settings.normalized();
        let target = parse_target(&settings.target)?;
        let authority = match target.port() {
            Some(port) => format!("{}:{}", target.host_str().unwrap_or_default(), port),
            None => target.host_str().unwrap_or_default().to_string(),
        };
        let origin = format!("{}://{}", target.scheme(), authority);
        let host = HeaderValue::from_str(&authority).map_err(|e| ProxyError::InvalidConfig(format!("Invalid target host '{}': {}", authority, e)))?;
        let base_path = trim_trailing_slash(target.path());

        let path_specs = match settings.path_rewrite {
            Some(spec) => spec.into_ordered(),
            None => default_path_rules(&settings.bff_api_path),
        };
        let location_specs = match settings.location_rewrite {
            Some(spec) => spec.into_ordered(),
            None => default_location_rules(&settings.target, &base_path, &settings.bff_api_path),
        };
        let path_rules = RuleSet::compile(&path_specs)?;
        let location_rules = RuleSet::compile(&location_specs)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ProxyError::InvalidConfig(format!("Invalid header name '{}': {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }
        if let Some(authorization) = &settings.authorization {
            headers.insert(header::AUTHORIZATION, header_value(authorization)?);
        }
        if let Some(suffix) = &settings.template_suffix {
            headers.insert(HeaderName::from_static(TEMPLATE_SUFFIX_HEADER), header_value(suffix)?);
        }

        let upstream_timeout = match settings.upstream_timeout_secs {
            Some(0) => {
                warn!("Upstream timeout of 0 seconds ignored, requests will not be time-bounded");
                None
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        info!(
            "Proxy configured: {bff} -> {origin}{base} ({paths} path rules, {locations} location rules)",
            bff = settings.bff_api_path,
            origin = origin,
            base = base_path,
            paths = path_rules.len(),
            locations = location_rules.len()
        );

        Ok(Self {
            origin,
            host,
            base_path,
            path_rules,
            location_rules: Some(location_rules),
            headers,
            auth_cookie_name: settings.auth_cookie_name,
            verify_tls: settings.verify_tls,
            upstream_timeout,
        })
    }
}

/// The target must be an absolute http(s) URL with a host
pub fn parse_target(target: &str) -> ProxyResult<Url> {
    let url = Url::parse(target).map_err(|e| ProxyError::InvalidConfig(format!("Invalid target URL '{}': {}", target, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ProxyError::InvalidConfig(format!("Target URL '{}' must use http or https", target)));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ProxyError::InvalidConfig(format!("Target URL '{}' has no host", target)));
    }
    if url.query().is_some() {
        warn!("Query string on target URL '{}' is ignored", target);
    }
    Ok(url)
}

/// Strip the public BFF prefix from inbound paths
pub fn default_path_rules(bff_api_path: &str) -> Vec<RuleSpec> {
    if bff_api_path.is_empty() {
        debug!("No BFF prefix configured, inbound paths are forwarded unchanged");
        return Vec::new();
    }
    vec![RuleSpec::new(format!("^{}", regex::escape(bff_api_path)), "")]
}

/// Map backend locations, absolute or under the backend base path, back under the BFF prefix
pub fn default_location_rules(endpoint: &str, base_path: &str, bff_api_path: &str) -> Vec<RuleSpec> {
    let replacement = literal_replacement(bff_api_path);
    vec![
        RuleSpec::new(format!("(?i)^{}", regex::escape(&trim_trailing_slash(endpoint))), replacement.clone()),
        RuleSpec::new(format!("(?i)^{}/", regex::escape(base_path)), format!("{}/", replacement)),
    ]
}

fn literal_replacement(value: &str) -> String {
    value.replace('$', "$$")
}

fn header_value(value: &str) -> ProxyResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ProxyError::InvalidConfig(format!("Invalid header value: {}", e)))
}
