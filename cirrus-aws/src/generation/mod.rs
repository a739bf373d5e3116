//! SDK generations.
//!
//! Each generation knows its naming convention, how builders are created,
//! which operation names carry which setting, and the few settings whose
//! shape differs (tuning objects, storage flags, transports).

pub mod v1;
pub mod v2;

#[cfg(feature = "rust-sdk")]
pub mod rust_sdk;

use crate::configurer::StepContext;
use crate::descriptor::{ClientDescriptor, NamingConvention};
use crate::invoker::DynamicObject;
use crate::properties::{ClientTuning, EndpointConfiguration, S3ServiceProperties};
use crate::transport::TransportAdapter;
use crate::value::Value;

pub use v1::SdkV1;
pub use v2::SdkV2;

#[cfg(feature = "rust-sdk")]
pub use rust_sdk::RustSdk;

/// Encryption materials attached to builders that accept them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionHook {
    pub operation: &'static str,
    pub bean_name: &'static str,
}

/// Builder operation names of one generation. `None` marks a setting the
/// generation has no operation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operations {
    pub region: &'static str,
    pub endpoint: &'static str,
    pub override_configuration: Option<&'static str>,
    pub http_client: Option<&'static str>,
    pub http_client_builder: Option<&'static str>,
    pub credentials: &'static str,
    pub request_handlers: Option<&'static str>,
    pub encryption: Option<EncryptionHook>,
    pub build: &'static str,
}

/// Adapter for one SDK generation.
pub trait SdkGeneration: Send + Sync {
    fn name(&self) -> &'static str;

    fn naming(&self) -> NamingConvention;

    /// Property namespace, e.g. `aws`.
    fn namespace(&self) -> &'static str;

    /// Whether async clients consult `default-async` before `default`.
    fn has_default_async(&self) -> bool {
        false
    }

    fn operations(&self) -> &Operations;

    fn builder_type_for(&self, client_type: &str) -> String;

    /// Client type for a discovered builder, `None` when the builder name
    /// does not follow the convention.
    fn client_type_for(&self, builder_type: &str) -> Option<String>;

    fn is_async_builder(&self, builder_type: &str) -> bool;

    /// Type and static operation that produce a fresh builder.
    fn builder_factory(&self, client_type: &str, builder_type: &str) -> (String, &'static str);

    /// Arguments of the endpoint operation.
    fn endpoint_args(&self, endpoint: &EndpointConfiguration) -> Vec<Value> {
        vec![Value::from(endpoint.service_endpoint.clone().unwrap_or_default())]
    }

    fn apply_tuning(&self, steps: &StepContext<'_>, builder: &dyn DynamicObject, tuning: &ClientTuning);

    fn apply_storage_settings(
        &self,
        steps: &StepContext<'_>,
        builder: &dyn DynamicObject,
        descriptor: &ClientDescriptor,
        settings: &S3ServiceProperties,
    ) {
        let _ = (steps, builder, descriptor, settings);
    }

    /// Bean the client cannot be built without.
    fn required_collaborator(&self, client_type: &str) -> Option<&'static str> {
        let _ = client_type;
        None
    }

    /// Inline transport support for this builder, chosen by capability.
    fn transport_for(
        &self,
        steps: &StepContext<'_>,
        builder: &dyn DynamicObject,
    ) -> Option<Box<dyn TransportAdapter>> {
        let _ = (steps, builder);
        None
    }
}

/// `chunked-encoding-disabled` wins; otherwise the inverse of
/// `chunked-encoding-enabled`.
pub(crate) fn chunked_encoding_disabled(settings: &S3ServiceProperties) -> Option<bool> {
    settings
        .chunked_encoding_disabled
        .or(settings.chunked_encoding_enabled.map(|enabled| !enabled))
}
