// Configuration module
//
// This module contains all configuration-related functionality split into focused submodules:
// - types: Raw settings, rule specifications and the compiled ProxyConfig
// - loader: Reading settings from the environment or a JSON file
// - validator: Validation and compilation of settings into a ProxyConfig

pub mod loader;
pub mod types;
pub mod validator;

pub use types::{ProxyConfig, ProxySettings, RuleSetSpec, RuleSpec};
