use crate::proxy::rules::RuleSet;
use crate::utils::validation::non_blank;
use hyper::HeaderMap;
use hyper::header::HeaderValue;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A single `(pattern, replacement)` rule as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(rename = "patternStr", alias = "pattern")]
    pub pattern: String,
    #[serde(rename = "replaceStr", alias = "replacement")]
    pub replacement: String,
}

/// Rule set as accepted from configuration.
/// The mapping form is deprecated; it is ordered by pattern before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetSpec {
    Ordered(Vec<RuleSpec>),
    Legacy(BTreeMap<String, String>),
}

/// Raw proxy settings, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    // Backend origin, optionally with a base path
    pub target: String,
    // Public prefix the BFF API is served under
    #[serde(default)]
    pub bff_api_path: String,
    #[serde(deserialize_with = "optional_string", default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    #[serde(deserialize_with = "optional_string", default, skip_serializing_if = "Option::is_none")]
    pub template_suffix: Option<String>,
    #[serde(deserialize_with = "optional_string", default, skip_serializing_if = "Option::is_none")]
    pub auth_cookie_name: Option<String>,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_rewrite: Option<RuleSetSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_rewrite: Option<RuleSetSpec>,
}

/// Validated, immutable configuration shared read-only by every request
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    // scheme://authority of the backend
    pub(crate) origin: String,
    pub(crate) host: HeaderValue,
    pub(crate) base_path: String,
    pub(crate) path_rules: RuleSet,
    pub(crate) location_rules: Option<RuleSet>,
    pub(crate) headers: HeaderMap,
    pub(crate) auth_cookie_name: Option<String>,
    pub(crate) verify_tls: bool,
    pub(crate) upstream_timeout: Option<Duration>,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into() }
    }
}

impl RuleSetSpec {
    /// Produce the rules in evaluation order
    pub fn into_ordered(self) -> Vec<RuleSpec> {
        match self {
            RuleSetSpec::Ordered(rules) => rules,
            RuleSetSpec::Legacy(map) => {
                warn!("Rewrite rules given as a mapping are deprecated, use an ordered list; applying them sorted by pattern");
                map.into_iter().map(|(pattern, replacement)| RuleSpec { pattern, replacement }).collect()
            }
        }
    }
}

impl From<Vec<RuleSpec>> for RuleSetSpec {
    fn from(rules: Vec<RuleSpec>) -> Self {
        RuleSetSpec::Ordered(rules)
    }
}

impl ProxySettings {
    pub fn new(target: impl Into<String>, bff_api_path: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            bff_api_path: bff_api_path.into(),
            authorization: None,
            template_suffix: None,
            auth_cookie_name: None,
            verify_tls: default_verify_tls(),
            upstream_timeout_secs: None,
            headers: BTreeMap::new(),
            path_rewrite: None,
            location_rewrite: None,
        }
    }
}

impl ProxyConfig {
    pub fn get_origin(&self) -> &str {
        &self.origin
    }

    pub fn get_host(&self) -> &HeaderValue {
        &self.host
    }

    pub fn get_base_path(&self) -> &str {
        &self.base_path
    }

    pub fn get_path_rules(&self) -> &RuleSet {
        &self.path_rules
    }

    pub fn get_location_rules(&self) -> Option<&RuleSet> {
        self.location_rules.as_ref()
    }

    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get_auth_cookie_name(&self) -> Option<&str> {
        self.auth_cookie_name.as_deref()
    }

    pub fn is_tls_verified(&self) -> bool {
        self.verify_tls
    }

    pub fn get_upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout
    }

    /// Replace the location rules; `None` disables location rewriting and redirect coercion
    pub fn with_location_rules(mut self, rules: Option<RuleSet>) -> Self {
        self.location_rules = rules;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}

fn default_verify_tls() -> bool {
    true
}

// Blank strings count as unset, matching how the environment is read.
fn optional_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer) {
        Ok(value) => Ok(non_blank(value)),
        Err(e) => {
            warn!("Failed to deserialize string value: {}, treating as unset", e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_set_spec_ordered_form() {
        let spec: RuleSetSpec = serde_json::from_str(r#"[{"patternStr":"^/b","replaceStr":"/2"},{"patternStr":"^/a","replaceStr":"/1"}]"#).unwrap();
        let rules = spec.into_ordered();
        assert_eq!(rules, vec![RuleSpec::new("^/b", "/2"), RuleSpec::new("^/a", "/1")]);
    }

    #[test]
    fn test_rule_set_spec_accepts_short_field_names() {
        let spec: RuleSetSpec = serde_json::from_str(r#"[{"pattern":"^/bff","replacement":""}]"#).unwrap();
        assert_eq!(spec.into_ordered(), vec![RuleSpec::new("^/bff", "")]);
    }

    #[test]
    fn test_rule_set_spec_legacy_form_is_sorted() {
        let spec: RuleSetSpec = serde_json::from_str(r#"{"^/zeta":"/z","^/alpha":"/a"}"#).unwrap();
        assert!(matches!(spec, RuleSetSpec::Legacy(_)));
        let rules = spec.into_ordered();
        assert_eq!(rules[0], RuleSpec::new("^/alpha", "/a"));
        assert_eq!(rules[1], RuleSpec::new("^/zeta", "/z"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings: ProxySettings = serde_json::from_str(r#"{"target":"https://backend.example"}"#).unwrap();
        assert_eq!(settings.bff_api_path, "");
        assert!(settings.verify_tls);
        assert!(settings.authorization.is_none());
        assert!(settings.path_rewrite.is_none());
        assert!(settings.headers.is_empty());
    }

    #[test]
    fn test_settings_blank_strings_are_unset() {
        let settings: ProxySettings =
            serde_json::from_str(r#"{"target":"https://backend.example","authorization":"  ","auth_cookie_name":"SESSION","template_suffix":null}"#).unwrap();
        assert!(settings.authorization.is_none());
        assert!(settings.template_suffix.is_none());
        assert_eq!(settings.auth_cookie_name.as_deref(), Some("SESSION"));
    }
}
