// Environment variable loading
//
// `CIRRUS__AWS__SQS__REGION` maps to `aws.sqs.region` when the prefix is
// `CIRRUS`. Double underscores separate segments, single underscores
// become hyphens.

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

const SEGMENT_SEPARATOR: &str = "__";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load every matching variable of the process environment, keyed by
    /// dotted property name. Variables that are not valid unicode are skipped.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        let vars = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Ok(self.load_from(vars))
    }

    /// Same as [`load`](Self::load) over an explicit variable set.
    pub fn load_from<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| Some((self.property_key(&key)?, value)))
            .collect()
    }

    /// Dotted property key for an environment variable name, or `None` when
    /// the variable does not carry the prefix.
    pub fn property_key(&self, var: &str) -> Option<String> {
        let rest = match &self.prefix {
            Some(prefix) => var
                .strip_prefix(prefix.as_str())?
                .strip_prefix(SEGMENT_SEPARATOR)?,
            None => var,
        };

        let segments: Vec<String> = rest
            .split(SEGMENT_SEPARATOR)
            .map(|segment| segment.to_lowercase().replace('_', "-"))
            .collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }
        Some(segments.join("."))
    }

    /// Environment variable name for a dotted property key.
    pub fn var_name(&self, key: &str) -> String {
        let body = key
            .split('.')
            .map(|segment| segment.to_uppercase().replace('-', "_"))
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR);

        match &self.prefix {
            Some(prefix) => format!("{}{}{}", prefix, SEGMENT_SEPARATOR, body),
            None => body,
        }
    }

    /// Load a specific property from the environment
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.var_name(key)).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe, so these tests feed variables explicitly.

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefixed_variables_nest() {
        let loader = EnvLoader::new(Some("CIRRUS".to_string()));
        let loaded = loader.load_from(vars(&[
            ("CIRRUS__AWS__SQS__REGION", "eu-central-1"),
            ("CIRRUS__AWS__DEFAULT__CLIENT__SOCKET_TIMEOUT", "123"),
            ("CIRRUSX__AWS__REGION", "ignored"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["aws.sqs.region"], "eu-central-1");
        assert_eq!(loaded["aws.default.client.socket-timeout"], "123");
    }

    #[test]
    fn test_empty_segments_are_rejected() {
        let loader = EnvLoader::new(Some("CIRRUS".to_string()));
        assert_eq!(loader.property_key("CIRRUS__AWS____REGION"), None);
        assert_eq!(loader.property_key("CIRRUS"), None);
    }

    #[test]
    fn test_unprefixed_loader_keeps_everything() {
        let loader = EnvLoader::default();
        assert_eq!(loader.property_key("HOME").as_deref(), Some("home"));
        assert_eq!(
            loader.property_key("AWS__SNS_ASYNC__ENABLED").as_deref(),
            Some("aws.sns-async.enabled")
        );
    }

    #[test]
    fn test_var_name_round_trips_key() {
        let loader = EnvLoader::new(Some("CIRRUS".to_string()));
        let name = loader.var_name("aws.sns-async.enabled");

        assert_eq!(name, "CIRRUS__AWS__SNS_ASYNC__ENABLED");
        assert_eq!(loader.property_key(&name).as_deref(), Some("aws.sns-async.enabled"));
    }

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("nonexistent-var-12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::new(Some("CIRRUS_TEST".to_string()));
        assert!(loader.load_var("missing.var-67890").is_err());
    }
}
