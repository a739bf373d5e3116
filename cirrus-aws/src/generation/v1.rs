//! First-generation SDK (`com.amazonaws.services.*`).
//!
//! Builders are `<Client>ClientBuilder` types created with `standard()` and
//! configured through JavaBean-style setters. Tuning travels as a
//! `ClientConfiguration` object with millisecond integers.

use super::{EncryptionHook, Operations, SdkGeneration, chunked_encoding_disabled};
use crate::configurer::StepContext;
use crate::descriptor::{ClientDescriptor, NamingConvention};
use crate::invoker::DynamicObject;
use crate::properties::{ClientTuning, EndpointConfiguration, S3ServiceProperties};
use crate::value::Value;
use std::time::Duration;

pub const PACKAGE_PREFIX: &str = "com.amazonaws.services.";
pub const CLIENT_CONFIGURATION: &str = "com.amazonaws.ClientConfiguration";
pub const S3_BUILDER: &str = "com.amazonaws.services.s3.AmazonS3Builder";
pub const S3_ENCRYPTION_CLIENT: &str = "com.amazonaws.services.s3.AmazonS3Encryption";
pub const ENCRYPTION_MATERIALS_BEAN: &str =
    "com.amazonaws.services.s3.model.EncryptionMaterialsProvider";

const BUILDER_SUFFIX: &str = "ClientBuilder";
const ASYNC_BUILDER_SUFFIX: &str = "AsyncClientBuilder";

const OPERATIONS: Operations = Operations {
    region: "setRegion",
    endpoint: "setEndpointConfiguration",
    override_configuration: None,
    http_client: None,
    http_client_builder: None,
    credentials: "setCredentials",
    request_handlers: Some("setRequestHandlers"),
    encryption: Some(EncryptionHook {
        operation: "setEncryptionMaterials",
        bean_name: ENCRYPTION_MATERIALS_BEAN,
    }),
    build: "build",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SdkV1;

impl SdkGeneration for SdkV1 {
    fn name(&self) -> &'static str {
        "v1"
    }

    fn naming(&self) -> NamingConvention {
        NamingConvention {
            package_prefix: PACKAGE_PREFIX,
            separator: ".",
            async_suffix: Some("Async"),
        }
    }

    fn namespace(&self) -> &'static str {
        "aws"
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
            .filter(|client| !client.is_empty())
            .map(str::to_string)
    }

    fn is_async_builder(&self, builder_type: &str) -> bool {
        builder_type.ends_with(ASYNC_BUILDER_SUFFIX)
    }

    fn builder_factory(&self, _client_type: &str, builder_type: &str) -> (String, &'static str) {
        (builder_type.to_string(), "standard")
    }

    fn endpoint_args(&self, endpoint: &EndpointConfiguration) -> Vec<Value> {
        vec![
            Value::from(endpoint.service_endpoint.clone().unwrap_or_default()),
            endpoint
                .signing_region
                .clone()
                .map(Value::from)
                .unwrap_or(Value::Null),
        ]
    }

    fn apply_tuning(&self, steps: &StepContext<'_>, builder: &dyn DynamicObject, tuning: &ClientTuning) {
        let Some(handle) = steps.construct(CLIENT_CONFIGURATION, "new", &[]) else {
            return;
        };
        let config = &*handle;

        steps.apply_opt(config, "setConnectionTimeout", tuning.connection_timeout.map(millis));
        steps.apply_opt(config, "setSocketTimeout", tuning.socket_timeout.map(millis));
        steps.apply_opt(config, "setRequestTimeout", tuning.request_timeout.map(millis));
        steps.apply_opt(
            config,
            "setClientExecutionTimeout",
            tuning.client_execution_timeout.map(millis),
        );
        steps.apply_opt(config, "setMaxConnections", tuning.max_connections);
        steps.apply_opt(config, "setMaxErrorRetry", tuning.max_error_retry);
        steps.apply_opt(config, "setUseGzip", tuning.use_gzip);
        steps.apply_opt(config, "setUserAgentPrefix", tuning.user_agent_prefix.clone());
        steps.apply_opt(
            config,
            "setProtocol",
            tuning.protocol.as_deref().map(str::to_ascii_uppercase),
        );
        steps.apply_opt(config, "setProxyHost", tuning.proxy_host.clone());
        steps.apply_opt(config, "setProxyPort", tuning.proxy_port);
        steps.apply_opt(config, "setProxyUsername", tuning.proxy_username.clone());
        steps.apply_opt(config, "setProxyPassword", tuning.proxy_password.clone());

        steps.apply(builder, "setClientConfiguration", &[Value::Object(handle.clone())]);
    }

    fn apply_storage_settings(
        &self,
        steps: &StepContext<'_>,
        builder: &dyn DynamicObject,
        _descriptor: &ClientDescriptor,
        settings: &S3ServiceProperties,
    ) {
        if !steps.invoker().is_assignable(builder, S3_BUILDER) {
            return;
        }

        steps.apply_opt(builder, "setPathStyleAccessEnabled", settings.path_style_access_enabled);
        steps.apply_opt(builder, "setChunkedEncodingDisabled", chunked_encoding_disabled(settings));
        steps.apply_opt(builder, "setAccelerateModeEnabled", settings.accelerate_mode_enabled);
        steps.apply_opt(builder, "setPayloadSigningEnabled", settings.payload_signing_enabled);
        steps.apply_opt(builder, "setDualstackEnabled", settings.dualstack_enabled);
        steps.apply_opt(
            builder,
            "setForceGlobalBucketAccessEnabled",
            settings.force_global_bucket_access_enabled,
        );
    }

    fn required_collaborator(&self, client_type: &str) -> Option<&'static str> {
        client_type
            .starts_with(S3_ENCRYPTION_CLIENT)
            .then_some(ENCRYPTION_MATERIALS_BEAN)
    }
}

fn millis(duration: Duration) -> Value {
    Value::Int(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}
