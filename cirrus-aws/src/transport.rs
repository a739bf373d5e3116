//! Inline HTTP transports.
//!
//! When no transport bean is named, a builder can still receive an inline
//! transport assembled from `apache-http-client-builder` (sync clients) or
//! `netty-nio-async-http-client-builder` (async clients). Which of the two
//! applies is decided by the builder's capabilities, never by its name.

use crate::configurer::StepContext;
use crate::invoker::DynamicObject;
use crate::overrides::OverrideChain;
use crate::properties::{ApacheHttpClientSettings, NettyHttpClientSettings, ProxySettings};
use crate::value::Value;
use std::sync::Arc;
use tracing::debug;

pub const APACHE_HTTP_CLIENT: &str = "software.amazon.awssdk.http.apache.ApacheHttpClient";
pub const APACHE_PROXY_CONFIGURATION: &str = "software.amazon.awssdk.http.apache.ProxyConfiguration";
pub const NETTY_HTTP_CLIENT: &str = "software.amazon.awssdk.http.nio.netty.NettyNioAsyncHttpClient";

/// Builds a transport builder from the resolved settings of one client.
pub trait TransportAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transport builder to hand to the client builder, or `None` when no
    /// level of the chain configures this transport.
    fn inline_transport(&self, steps: &StepContext<'_>, chain: &OverrideChain<'_>) -> Option<Value>;
}

/// Sync transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApacheTransport;

impl TransportAdapter for ApacheTransport {
    fn name(&self) -> &'static str {
        "apache"
    }

    fn inline_transport(&self, steps: &StepContext<'_>, chain: &OverrideChain<'_>) -> Option<Value> {
        let settings: ApacheHttpClientSettings =
            chain.resolve_merged(|f| f.apache_http_client_builder.as_ref())?;
        let handle = steps.construct(APACHE_HTTP_CLIENT, "builder", &[])?;
        let builder = &*handle;

        steps.apply_opt(builder, "socketTimeout", settings.socket_timeout);
        steps.apply_opt(builder, "connectionTimeout", settings.connection_timeout);
        steps.apply_opt(
            builder,
            "connectionAcquisitionTimeout",
            settings.connection_acquisition_timeout,
        );
        steps.apply_opt(builder, "maxConnections", settings.max_connections);
        steps.apply_opt(builder, "localAddress", settings.local_address.clone());
        steps.apply_opt(builder, "expectContinueEnabled", settings.expect_continue_enabled);
        steps.apply_opt(builder, "connectionTimeToLive", settings.connection_time_to_live);
        steps.apply_opt(builder, "connectionMaxIdleTime", settings.connection_max_idle_time);
        steps.apply_opt(builder, "useIdleConnectionReaper", settings.use_idle_connection_reaper);

        if let Some(proxy) = settings
            .proxy_configuration
            .as_ref()
            .and_then(|proxy| proxy_configuration(steps, proxy))
        {
            steps.apply(builder, "proxyConfiguration", &[proxy]);
        }

        debug!(client = steps.client(), transport = self.name(), "Prepared inline transport");
        Some(Value::Object(handle))
    }
}

fn proxy_configuration(steps: &StepContext<'_>, proxy: &ProxySettings) -> Option<Value> {
    let handle = steps.construct(APACHE_PROXY_CONFIGURATION, "builder", &[])?;
    let builder = &*handle;

    steps.apply_opt(builder, "endpoint", proxy.endpoint.clone());
    steps.apply_opt(builder, "username", proxy.username.clone());
    steps.apply_opt(builder, "password", proxy.password.clone());
    steps.apply_opt(builder, "ntlmDomain", proxy.ntlm_domain.clone());
    steps.apply_opt(builder, "ntlmWorkstation", proxy.ntlm_workstation.clone());
    steps.apply_opt(
        builder,
        "nonProxyHosts",
        proxy
            .non_proxy_hosts
            .as_ref()
            .map(|hosts| Value::List(hosts.iter().cloned().map(Value::from).collect())),
    );
    steps.apply_opt(
        builder,
        "preemptiveBasicAuthenticationEnabled",
        proxy.preemptive_basic_authentication_enabled,
    );
    steps.apply_opt(builder, "useSystemPropertyValues", proxy.use_system_property_values);

    steps.build(builder)
}

/// Async transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct NettyTransport;

impl TransportAdapter for NettyTransport {
    fn name(&self) -> &'static str {
        "netty"
    }

    fn inline_transport(&self, steps: &StepContext<'_>, chain: &OverrideChain<'_>) -> Option<Value> {
        let settings: NettyHttpClientSettings =
            chain.resolve_merged(|f| f.netty_nio_async_http_client_builder.as_ref())?;
        let handle: Arc<dyn DynamicObject> = steps.construct(NETTY_HTTP_CLIENT, "builder", &[])?;
        let builder = &*handle;

        steps.apply_opt(builder, "maxConcurrency", settings.max_concurrency);
        steps.apply_opt(
            builder,
            "maxPendingConnectionAcquires",
            settings.max_pending_connection_acquires,
        );
        steps.apply_opt(builder, "readTimeout", settings.read_timeout);
        steps.apply_opt(builder, "writeTimeout", settings.write_timeout);
        steps.apply_opt(builder, "connectionTimeout", settings.connection_timeout);
        steps.apply_opt(
            builder,
            "connectionAcquisitionTimeout",
            settings.connection_acquisition_timeout,
        );
        steps.apply_opt(builder, "connectionTimeToLive", settings.connection_time_to_live);
        steps.apply_opt(builder, "connectionMaxIdleTime", settings.connection_max_idle_time);
        steps.apply_opt(builder, "protocol", settings.protocol.as_deref().map(str::to_ascii_uppercase));
        steps.apply_opt(builder, "maxHttp2Streams", settings.max_http2_streams);

        if let Some(name) = settings.event_loop_group_bean_name.as_deref()
            && let Some(group) = steps.bean(name, "event loop group")
        {
            steps.apply(builder, "eventLoopGroup", &[Value::Bean(group)]);
        }
        if let Some(name) = settings.event_loop_group_builder_bean_name.as_deref()
            && let Some(group) = steps.bean(name, "event loop group builder")
        {
            steps.apply(builder, "eventLoopGroupBuilder", &[Value::Bean(group)]);
        }

        debug!(client = steps.client(), transport = self.name(), "Prepared inline transport");
        Some(Value::Object(handle))
    }
}
