//! # Cirrus AWS
//!
//! Property-driven discovery, configuration and registration of AWS SDK
//! clients in a bean container.
//!
//! ## Features
//!
//! The core drives SDK builders through dynamic invocation, so first- and
//! second-generation SDKs are handled by name alone. The `rust-sdk` feature
//! and its per-service features (`s3`, `sqs`, `sns`, `dynamodb`) add
//! adapters for the official Rust SDK crates.
//!
//! ## Configuration
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
//!
//! [aws.sqs-async]
//! enabled = false
//! ```
//!
//! Each setting resolves on its own: `<service>-async` (async clients only),
//! then `<service>`, then `default`. An endpoint override makes the region
//! irrelevant.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cirrus_aws::{AwsAutoConfiguration, ClientSelection, DirectoryResourceLoader, TypeRegistry};
//! use cirrus_config::ConfigManager;
//! use cirrus_container::Container;
//!
//! let config = ConfigManager::with_prefix("APP");
//! config.load_file("config/application.toml")?;
//! config.load_env()?;
//!
//! let types = TypeRegistry::new();
//! // register the SDK's builder types here
//!
//! let container = Container::new();
//! let report = AwsAutoConfiguration::v2(ClientSelection::discover(
//!     DirectoryResourceLoader::new("app").with_root("resources"),
//! ))
//! .apply(&config, types, &container)?;
//! println!("registered {:?}", report.registered);
//! ```

mod bootstrap;
mod catalog;
mod configurer;
mod descriptor;
mod error;
mod invoker;
mod key;
mod lenient;
mod overrides;
mod properties;
mod registrar;
mod transport;
mod value;

pub mod generation;

pub use bootstrap::AwsAutoConfiguration;
pub use catalog::{
    BUILDERS_RESOURCE, BuilderNameCatalog, DirectoryResourceLoader, ResourceLoader,
    StaticResourceLoader, parse_builder_names,
};
pub use configurer::{BuiltClient, ClientBuilderConfigurer, StepContext};
pub use descriptor::{ClientDescriptor, NamingConvention};
pub use error::{AutoConfigureError, InvocationError, MalformedTypeName, Result};
pub use generation::{EncryptionHook, Operations, SdkGeneration, SdkV1, SdkV2};
pub use invoker::{AsBean, DynamicInvoker, DynamicObject, DynamicType, FunctionType, TypeRegistry};
pub use key::{ASYNC_KEY_SUFFIX, ConfigKey, ConfigKeyResolver, DEFAULT_KEY};
pub use lenient::parse_duration;
pub use overrides::OverrideChain;
pub use properties::{
    ApacheHttpClientSettings, AwsProperties, ClientTuning, ConfigurationFragment, ConfigurationMap,
    EnablementFlags, EndpointConfiguration, NettyHttpClientSettings, Overlay, ProxySettings,
    S3ServiceProperties,
};
pub use registrar::{
    ClientRegistrar, ClientSelection, RegistrationMode, RegistrationReport, SkipReason,
    SkippedClient,
};
pub use transport::{
    APACHE_HTTP_CLIENT, APACHE_PROXY_CONFIGURATION, ApacheTransport, NETTY_HTTP_CLIENT, NettyTransport,
    TransportAdapter,
};
pub use value::Value;

#[cfg(feature = "rust-sdk")]
pub use generation::RustSdk;

// Re-export AWS types for convenience
#[cfg(feature = "rust-sdk")]
pub use aws_credential_types;
#[cfg(feature = "rust-sdk")]
pub use aws_types;

#[cfg(feature = "s3")]
pub use aws_sdk_s3;

#[cfg(feature = "dynamodb")]
pub use aws_sdk_dynamodb;

#[cfg(feature = "sqs")]
pub use aws_sdk_sqs;

#[cfg(feature = "sns")]
pub use aws_sdk_sns;

pub mod prelude {
    pub use crate::{
        AutoConfigureError, AwsAutoConfiguration, AwsProperties, BuilderNameCatalog, ClientSelection,
        DynamicObject, RegistrationMode, RegistrationReport, TypeRegistry, Value,
    };
}
