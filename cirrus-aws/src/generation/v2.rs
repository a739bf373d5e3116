//! Second-generation SDK (`software.amazon.awssdk.services.*`).
//!
//! Builders come from the client type's static `builder()` and take fluent
//! setters. Tuning maps onto a `ClientOverrideConfiguration`; a configured
//! override bean is applied after it and therefore wins.

use super::{Operations, SdkGeneration, chunked_encoding_disabled};
use crate::configurer::StepContext;
use crate::descriptor::{ClientDescriptor, NamingConvention};
use crate::invoker::DynamicObject;
use crate::properties::{ClientTuning, S3ServiceProperties};
use crate::transport::{ApacheTransport, NettyTransport, TransportAdapter};
use tracing::debug;

pub const PACKAGE_PREFIX: &str = "software.amazon.awssdk.services.";
pub const SYNC_CLIENT_BUILDER: &str = "software.amazon.awssdk.core.client.builder.SdkSyncClientBuilder";
pub const ASYNC_CLIENT_BUILDER: &str =
    "software.amazon.awssdk.core.client.builder.SdkAsyncClientBuilder";
pub const CLIENT_OVERRIDE_CONFIGURATION: &str =
    "software.amazon.awssdk.core.client.config.ClientOverrideConfiguration";
pub const S3_CONFIGURATION: &str = "software.amazon.awssdk.services.s3.S3Configuration";

const BUILDER_SUFFIX: &str = "Builder";
const ASYNC_BUILDER_SUFFIX: &str = "AsyncClientBuilder";
const STORAGE_PACKAGE: &str = "s3";

const OPERATIONS: Operations = Operations {
    region: "region",
    endpoint: "endpointOverride",
    override_configuration: Some("overrideConfiguration"),
    http_client: Some("httpClient"),
    http_client_builder: Some("httpClientBuilder"),
    credentials: "credentialsProvider",
    request_handlers: None,
    encryption: None,
    build: "build",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SdkV2;

impl SdkGeneration for SdkV2 {
    fn name(&self) -> &'static str {
        "v2"
    }

    fn naming(&self) -> NamingConvention {
        NamingConvention {
            package_prefix: PACKAGE_PREFIX,
            separator: ".",
            async_suffix: Some("AsyncClient"),
        }
    }

    fn namespace(&self) -> &'static str {
        "aws2"
    }

    fn has_default_async(&self) -> bool {
        true
    }

    fn operations(&self) -> &Operations {
        &OPERATIONS
    }

    fn builder_type_for(&self, client_type: &str) -> String {
        format!("{}{}", client_type, BUILDER_SUFFIX)
    }

    fn client_type_for(&self, builder_type: &str) -> Option<String> {
        builder_type
            .strip_suffix(BUILDER_SUFFIX)
            .filter(|client| client.ends_with("Client"))
            .map(str::to_string)
    }

    fn is_async_builder(&self, builder_type: &str) -> bool {
        builder_type.ends_with(ASYNC_BUILDER_SUFFIX)
    }

    fn builder_factory(&self, client_type: &str, _builder_type: &str) -> (String, &'static str) {
        (client_type.to_string(), "builder")
    }

    fn apply_tuning(&self, steps: &StepContext<'_>, builder: &dyn DynamicObject, tuning: &ClientTuning) {
        if tuning.request_timeout.is_none() && tuning.client_execution_timeout.is_none() {
            debug!(client = steps.client(), "No call timeouts to apply");
            return;
        }

        let Some(handle) = steps.construct(CLIENT_OVERRIDE_CONFIGURATION, "builder", &[]) else {
            return;
        };
        let config = &*handle;
        steps.apply_opt(config, "apiCallTimeout", tuning.client_execution_timeout);
        steps.apply_opt(config, "apiCallAttemptTimeout", tuning.request_timeout);

        if let Some(built) = steps.build(config) {
            steps.apply(builder, "overrideConfiguration", &[built]);
        }
    }

    fn apply_storage_settings(
        &self,
        steps: &StepContext<'_>,
        builder: &dyn DynamicObject,
        descriptor: &ClientDescriptor,
        settings: &S3ServiceProperties,
    ) {
        if descriptor.service_package() != STORAGE_PACKAGE || !builder.has_operation("serviceConfiguration") {
            return;
        }

        let Some(handle) = steps.construct(S3_CONFIGURATION, "builder", &[]) else {
            return;
        };
        let config = &*handle;
        steps.apply_opt(config, "pathStyleAccessEnabled", settings.path_style_access_enabled);
        steps.apply_opt(
            config,
            "chunkedEncodingEnabled",
            chunked_encoding_disabled(settings).map(|disabled| !disabled),
        );
        steps.apply_opt(config, "accelerateModeEnabled", settings.accelerate_mode_enabled);
        steps.apply_opt(config, "dualstackEnabled", settings.dualstack_enabled);

        if let Some(built) = steps.build(config) {
            steps.apply(builder, "serviceConfiguration", &[built]);
        }
    }

    fn transport_for(
        &self,
        steps: &StepContext<'_>,
        builder: &dyn DynamicObject,
    ) -> Option<Box<dyn TransportAdapter>> {
        if steps.invoker().is_assignable(builder, SYNC_CLIENT_BUILDER) {
            Some(Box::new(ApacheTransport))
        } else if steps.invoker().is_assignable(builder, ASYNC_CLIENT_BUILDER) {
            Some(Box::new(NettyTransport))
        } else {
            None
        }
    }
}
