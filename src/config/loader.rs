use crate::config::types::ProxySettings;
use crate::utils::path::trim_trailing_slash;
use crate::utils::validation::{non_blank, parse_flag};
use anyhow::{Result, anyhow};
use log::{debug, trace, warn};
use std::path::Path;

pub const ENV_ENDPOINT: &str = "CBPAAS_EP";
pub const ENV_BFF_API_PATH: &str = "BFF_API_PATH";
pub const ENV_AUTHORIZATION: &str = "CBPAAS_AUTHZ";
pub const ENV_TEMPLATE_SUFFIX: &str = "CBPAAS_TEMPLATE_SUFFIX";
pub const ENV_AUTH_COOKIE_NAME: &str = "CBPAAS_AUTH_COOKIE_NAME";
pub const ENV_TLS_VERIFY: &str = "CBPAAS_TLS_VERIFY";
pub const ENV_TIMEOUT_SECS: &str = "CBPAAS_TIMEOUT_SECS";

impl ProxySettings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        let target = get(ENV_ENDPOINT).ok_or_else(|| anyhow!("{} is not set", ENV_ENDPOINT))?;
        let bff_api_path = get(ENV_BFF_API_PATH).ok_or_else(|| anyhow!("{} is not set", ENV_BFF_API_PATH))?;

        let mut settings = Self::new(target, bff_api_path);
        settings.authorization = get(ENV_AUTHORIZATION);
        settings.template_suffix = get(ENV_TEMPLATE_SUFFIX);
        settings.auth_cookie_name = get(ENV_AUTH_COOKIE_NAME);

        if let Some(raw) = get(ENV_TLS_VERIFY) {
            match parse_flag(&raw) {
                Some(flag) => settings.verify_tls = flag,
                None => warn!("Ignoring unrecognised {}={:?}, TLS verification stays enabled", ENV_TLS_VERIFY, raw),
            }
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| anyhow!("{} must be a whole number of seconds: {}", ENV_TIMEOUT_SECS, e))?;
            settings.upstream_timeout_secs = Some(secs);
        }

        let settings = settings.normalized();
        trace!("Loaded settings from environment: {:#?}", settings.redacted());
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub async fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading proxy settings from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await.map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        let settings = serde_json::from_str::<ProxySettings>(&content).map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;
        let settings = settings.normalized();
        trace!("Loaded settings: {:#?}", settings.redacted());
        Ok(settings)
    }

    /// Strip trailing slashes from the endpoint and the BFF prefix
    pub fn normalized(mut self) -> Self {
        self.target = trim_trailing_slash(self.target);
        self.bff_api_path = trim_trailing_slash(self.bff_api_path);
        self
    }

    // Copy safe to log: the authorization value is masked
    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.authorization.is_some() {
            copy.authorization = Some("***".to_string());
        }
        copy
    }
}
