//! Bound client properties.
//!
//! Under one namespace (`aws` or `aws2`) every table is a
//! [`ConfigurationFragment`] keyed by service package (`sqs`), async variant
//! (`sqs-async`) or fallback (`default`). The `s3` table additionally feeds
//! [`S3ServiceProperties`], and the scalar `sync-enabled` / `async-enabled`
//! entries feed [`EnablementFlags`].
//!
//! ```toml
//! [aws.default]
//! region = "us-east-1"
//!
//! [aws.default.client]
//! socket-timeout = "15s"
//!
//! [aws.sqs]
//! region = "eu-central-1"
//! ```

use crate::error::{AutoConfigureError, Result};
use crate::lenient;
use cirrus_config::ConfigManager;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Fill every unset field of `self` from `fallback`.
pub trait Overlay {
    fn overlay(&mut self, fallback: &Self);
}

macro_rules! overlay_fields {
    ($ty:ty { $($field:ident),* $(,)? } $(nested { $($nested:ident),* $(,)? })?) => {
        impl Overlay for $ty {
            fn overlay(&mut self, fallback: &Self) {
                $(
                    if self.$field.is_none() {
                        self.$field = fallback.$field.clone();
                    }
                )*
                $($(
                    if let Some(theirs) = &fallback.$nested {
                        match &mut self.$nested {
                            Some(own) => own.overlay(theirs),
                            unset => *unset = Some(theirs.clone()),
                        }
                    }
                )*)?
            }
        }
    };
}

/// Client-level tuning: timeouts, retries, pool size and proxy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientTuning {
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub socket_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub request_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub client_execution_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub max_connections: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub max_error_retry: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub use_gzip: Option<bool>,
    pub user_agent_prefix: Option<String>,
    pub protocol: Option<String>,
    pub proxy_host: Option<String>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub proxy_port: Option<u32>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
}

overlay_fields!(ClientTuning {
    connection_timeout,
    socket_timeout,
    request_timeout,
    client_execution_timeout,
    max_connections,
    max_error_retry,
    use_gzip,
    user_agent_prefix,
    protocol,
    proxy_host,
    proxy_port,
    proxy_username,
    proxy_password,
});

/// Endpoint override. Accepts a bare URI or a table with
/// `service-endpoint` and `signing-region`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "EndpointRepr")]
pub struct EndpointConfiguration {
    pub service_endpoint: Option<String>,
    pub signing_region: Option<String>,
}

impl EndpointConfiguration {
    pub fn new(service_endpoint: impl Into<String>) -> Self {
        Self {
            service_endpoint: Some(service_endpoint.into()),
            signing_region: None,
        }
    }

    pub fn with_signing_region(mut self, region: impl Into<String>) -> Self {
        self.signing_region = Some(region.into());
        self
    }

    /// An endpoint without a URI does not override anything.
    pub fn is_usable(&self) -> bool {
        self.service_endpoint
            .as_deref()
            .is_some_and(|endpoint| !endpoint.trim().is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Uri(String),
    Table {
        #[serde(rename = "service-endpoint")]
        service_endpoint: Option<String>,
        #[serde(rename = "signing-region")]
        signing_region: Option<String>,
    },
}

impl From<EndpointRepr> for EndpointConfiguration {
    fn from(repr: EndpointRepr) -> Self {
        match repr {
            EndpointRepr::Uri(uri) => Self {
                service_endpoint: Some(uri),
                signing_region: None,
            },
            EndpointRepr::Table {
                service_endpoint,
                signing_region,
            } => Self {
                service_endpoint,
                signing_region,
            },
        }
    }
}

/// Proxy block of the inline sync transport.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProxySettings {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ntlm_domain: Option<String>,
    pub ntlm_workstation: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string_list")]
    pub non_proxy_hosts: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub preemptive_basic_authentication_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub use_system_property_values: Option<bool>,
}

overlay_fields!(ProxySettings {
    endpoint,
    username,
    password,
    ntlm_domain,
    ntlm_workstation,
    non_proxy_hosts,
    preemptive_basic_authentication_enabled,
    use_system_property_values,
});

/// Inline sync (Apache) transport settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApacheHttpClientSettings {
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub socket_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_acquisition_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub max_connections: Option<u32>,
    pub local_address: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub expect_continue_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_time_to_live: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_max_idle_time: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub use_idle_connection_reaper: Option<bool>,
    pub proxy_configuration: Option<ProxySettings>,
}

overlay_fields!(ApacheHttpClientSettings {
    socket_timeout,
    connection_timeout,
    connection_acquisition_timeout,
    max_connections,
    local_address,
    expect_continue_enabled,
    connection_time_to_live,
    connection_max_idle_time,
    use_idle_connection_reaper,
} nested { proxy_configuration });

/// Inline async (Netty) transport settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NettyHttpClientSettings {
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub max_concurrency: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub max_pending_connection_acquires: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub read_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub write_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_acquisition_timeout: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_time_to_live: Option<Duration>,
    #[serde(deserialize_with = "lenient::opt_duration")]
    pub connection_max_idle_time: Option<Duration>,
    pub event_loop_group_bean_name: Option<String>,
    pub event_loop_group_builder_bean_name: Option<String>,
    pub protocol: Option<String>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub max_http2_streams: Option<u32>,
}

overlay_fields!(NettyHttpClientSettings {
    max_concurrency,
    max_pending_connection_acquires,
    read_timeout,
    write_timeout,
    connection_timeout,
    connection_acquisition_timeout,
    connection_time_to_live,
    connection_max_idle_time,
    event_loop_group_bean_name,
    event_loop_group_builder_bean_name,
    protocol,
    max_http2_streams,
});

/// Optional settings for one configuration key.
///
/// Every field is optional; `None` means "not set here, ask the next level".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigurationFragment {
    pub client: Option<ClientTuning>,
    pub endpoint: Option<EndpointConfiguration>,
    pub region: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub enabled: Option<bool>,
    pub credentials_provider_bean_name: Option<String>,
    pub client_override_configuration_bean_name: Option<String>,
    pub http_client_bean_name: Option<String>,
    pub http_client_builder_bean_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string_list")]
    pub request_handler_bean_names: Option<Vec<String>>,
    pub apache_http_client_builder: Option<ApacheHttpClientSettings>,
    pub netty_nio_async_http_client_builder: Option<NettyHttpClientSettings>,
}

impl ConfigurationFragment {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: EndpointConfiguration) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_client(mut self, client: ClientTuning) -> Self {
        self.client = Some(client);
        self
    }
}

/// Storage-family flags shared by every variant of the storage client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct S3ServiceProperties {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub path_style_access_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub chunked_encoding_disabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub chunked_encoding_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub accelerate_mode_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub payload_signing_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub dualstack_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub force_global_bucket_access_enabled: Option<bool>,
}

impl S3ServiceProperties {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Which variants catalog discovery may register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EnablementFlags {
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub sync_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub async_enabled: Option<bool>,
}

impl EnablementFlags {
    /// Sync clients are on unless switched off.
    pub fn sync_enabled(&self) -> bool {
        self.sync_enabled.unwrap_or(true)
    }

    /// Async clients are off unless switched on.
    pub fn async_enabled(&self) -> bool {
        self.async_enabled.unwrap_or(false)
    }

    pub fn allows(&self, is_async: bool) -> bool {
        if is_async {
            self.async_enabled()
        } else {
            self.sync_enabled()
        }
    }
}

/// Configuration key to fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationMap {
    fragments: HashMap<String, ConfigurationFragment>,
}

impl ConfigurationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every table under `namespace`. Scalars are not fragments and are
    /// skipped.
    pub fn from_value(namespace: &str, value: &serde_json::Value) -> Result<Self> {
        let mut map = Self::new();
        let Some(entries) = value.as_object() else {
            return Ok(map);
        };

        for (key, entry) in entries.iter().filter(|(_, entry)| entry.is_object()) {
            let fragment = bind(namespace, key, entry)?;
            map.insert(key.clone(), fragment);
        }
        Ok(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, fragment: ConfigurationFragment) {
        self.fragments.insert(key.into(), fragment);
    }

    pub fn with(mut self, key: impl Into<String>, fragment: ConfigurationFragment) -> Self {
        self.insert(key, fragment);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigurationFragment> {
        self.fragments.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Everything bound from one namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AwsProperties {
    pub clients: ConfigurationMap,
    pub s3: S3ServiceProperties,
    pub flags: EnablementFlags,
}

impl AwsProperties {
    pub fn new(clients: ConfigurationMap) -> Self {
        Self {
            clients,
            ..Self::default()
        }
    }

    pub fn with_s3(mut self, s3: S3ServiceProperties) -> Self {
        self.s3 = s3;
        self
    }

    pub fn with_flags(mut self, flags: EnablementFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Bind the subtree that sits under `namespace`.
    pub fn from_value(namespace: &str, value: &serde_json::Value) -> Result<Self> {
        let clients = ConfigurationMap::from_value(namespace, value)?;
        let s3 = match value.get("s3") {
            Some(table) if table.is_object() => bind(namespace, "s3", table)?,
            _ => S3ServiceProperties::default(),
        };
        let flags = bind(namespace, "", value)?;

        debug!(
            namespace,
            fragments = clients.len(),
            "Bound client properties"
        );
        Ok(Self { clients, s3, flags })
    }

    /// Bind `namespace` from a configuration manager. A missing namespace
    /// yields defaults.
    pub fn from_config(config: &ConfigManager, namespace: &str) -> Result<Self> {
        match config.section(namespace) {
            Some(value) => Self::from_value(namespace, &value),
            None => Ok(Self::default()),
        }
    }
}

fn bind<T: serde::de::DeserializeOwned>(
    namespace: &str,
    key: &str,
    value: &serde_json::Value,
) -> Result<T> {
    T::deserialize(value).map_err(|e| AutoConfigureError::Properties {
        key: if key.is_empty() {
            namespace.to_string()
        } else {
            format!("{}.{}", namespace, key)
        },
        message: e.to_string(),
    })
}
