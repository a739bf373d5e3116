//! Adapters for the official Rust SDK crates (`aws_sdk_*`).
//!
//! Each enabled service crate registers its `Client` type under
//! `aws_sdk_<service>::Client`. The static `builder` operation yields a
//! dynamic wrapper around `aws_sdk_<service>::config::Builder`; timeouts and
//! retries are collected while configuring and applied when the client is
//! built.

use super::{Operations, SdkGeneration};
use crate::configurer::StepContext;
use crate::descriptor::{ClientDescriptor, NamingConvention};
use crate::error::InvocationError;
use crate::invoker::{DynamicObject, TypeRegistry};
use crate::properties::{ClientTuning, S3ServiceProperties};
use crate::value::{Value, arg, expect_kind};
#[cfg(any(feature = "s3", feature = "sqs", feature = "sns", feature = "dynamodb"))]
use crate::invoker::FunctionType;
use aws_credential_types::provider::SharedCredentialsProvider;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

pub const PACKAGE_PREFIX: &str = "aws_sdk_";

const CLIENT_SUFFIX: &str = "::Client";
const BUILDER_SUFFIX: &str = "::config::Builder";

const OPERATIONS: Operations = Operations {
    region: "region",
    endpoint: "endpointOverride",
    override_configuration: None,
    http_client: None,
    http_client_builder: None,
    credentials: "credentialsProvider",
    request_handlers: None,
    encryption: None,
    build: "build",
};

const TIMEOUT_OPERATIONS: [&str; 4] = [
    "connectTimeout",
    "readTimeout",
    "operationTimeout",
    "operationAttemptTimeout",
];
const STORAGE_OPERATIONS: [&str; 3] = ["forcePathStyle", "accelerate", "useDualStack"];

#[derive(Debug, Clone, Copy, Default)]
pub struct RustSdk;

impl SdkGeneration for RustSdk {
    fn name(&self) -> &'static str {
        "rust-sdk"
    }

    fn naming(&self) -> NamingConvention {
        NamingConvention {
            package_prefix: PACKAGE_PREFIX,
            separator: "::",
            async_suffix: None,
        }
    }

    fn namespace(&self) -> &'static str {
        "aws"
    }

    fn operations(&self) -> &Operations {
        &OPERATIONS
    }

    fn builder_type_for(&self, client_type: &str) -> String {
        let service_crate = client_type.strip_suffix(CLIENT_SUFFIX).unwrap_or(client_type);
        format!("{}{}", service_crate, BUILDER_SUFFIX)
    }

    fn client_type_for(&self, builder_type: &str) -> Option<String> {
        builder_type
            .strip_suffix(BUILDER_SUFFIX)
            .filter(|service_crate| service_crate.starts_with(PACKAGE_PREFIX))
            .map(|service_crate| format!("{}{}", service_crate, CLIENT_SUFFIX))
    }

    fn is_async_builder(&self, _builder_type: &str) -> bool {
        false
    }

    fn builder_factory(&self, client_type: &str, _builder_type: &str) -> (String, &'static str) {
        (client_type.to_string(), "builder")
    }

    fn apply_tuning(&self, steps: &StepContext<'_>, builder: &dyn DynamicObject, tuning: &ClientTuning) {
        steps.apply_opt(builder, "connectTimeout", tuning.connection_timeout);
        steps.apply_opt(builder, "readTimeout", tuning.socket_timeout);
        steps.apply_opt(builder, "operationTimeout", tuning.client_execution_timeout);
        steps.apply_opt(builder, "operationAttemptTimeout", tuning.request_timeout);
        // The SDK counts the first attempt.
        steps.apply_opt(
            builder,
            "maxAttempts",
            tuning.max_error_retry.map(|retries| retries.saturating_add(1)),
        );
    }

    fn apply_storage_settings(
        &self,
        steps: &StepContext<'_>,
        builder: &dyn DynamicObject,
        descriptor: &ClientDescriptor,
        settings: &S3ServiceProperties,
    ) {
        if descriptor.service_package() != "s3" {
            return;
        }
        steps.apply_opt(builder, "forcePathStyle", settings.path_style_access_enabled);
        steps.apply_opt(builder, "accelerate", settings.accelerate_mode_enabled);
        steps.apply_opt(builder, "useDualStack", settings.dualstack_enabled);
    }
}

/// Storage flags understood by the S3 config builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFlag {
    ForcePathStyle,
    Accelerate,
    UseDualStack,
}

impl StorageFlag {
    fn from_operation(operation: &str) -> Option<Self> {
        match operation {
            "forcePathStyle" => Some(Self::ForcePathStyle),
            "accelerate" => Some(Self::Accelerate),
            "useDualStack" => Some(Self::UseDualStack),
            _ => None,
        }
    }
}

/// Timeouts collected from the configuration steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Option<Duration>,
    pub read: Option<Duration>,
    pub operation: Option<Duration>,
    pub operation_attempt: Option<Duration>,
}

impl Timeouts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A service config builder reachable through dynamic invocation.
pub trait ServiceConfig: Send + Sized + 'static {
    const CLIENT_TYPE: &'static str;
    const STORAGE: bool = false;

    type Client: Send + Sync + 'static;

    fn new_builder() -> Self;
    fn apply_region(&mut self, region: String);
    fn apply_endpoint_url(&mut self, url: String);
    fn apply_credentials_provider(&mut self, provider: SharedCredentialsProvider);
    fn apply_timeouts(&mut self, timeouts: &Timeouts);
    fn apply_max_attempts(&mut self, attempts: u32);

    fn apply_storage_flag(&mut self, flag: StorageFlag, value: bool) {
        let _ = (flag, value);
    }

    fn build_client(self) -> Self::Client;
}

struct Pending<B> {
    builder: Option<B>,
    timeouts: Timeouts,
    max_attempts: Option<u32>,
}

/// Dynamic wrapper around one service's config builder.
pub struct RustSdkBuilder<B: ServiceConfig> {
    type_name: String,
    pending: Mutex<Pending<B>>,
}

impl<B: ServiceConfig> RustSdkBuilder<B> {
    pub fn new() -> Self {
        Self {
            type_name: RustSdk.builder_type_for(B::CLIENT_TYPE),
            pending: Mutex::new(Pending {
                builder: Some(B::new_builder()),
                timeouts: Timeouts::default(),
                max_attempts: None,
            }),
        }
    }

    fn with_builder(
        &self,
        operation: &str,
        apply: impl FnOnce(&mut B),
    ) -> Result<Value, InvocationError> {
        let mut pending = self.pending.lock();
        let builder = pending.builder.as_mut().ok_or_else(|| self.consumed(operation))?;
        apply(builder);
        Ok(Value::Null)
    }

    fn consumed(&self, operation: &str) -> InvocationError {
        InvocationError::failed(&self.type_name, operation, "builder was already built")
    }

    fn duration_arg(operation: &str, args: &[Value]) -> Result<Duration, InvocationError> {
        expect_kind(operation, arg(operation, args, 0)?, "a duration", Value::as_duration)
    }
}

impl<B: ServiceConfig> Default for RustSdkBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ServiceConfig> DynamicObject for RustSdkBuilder<B> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn has_operation(&self, operation: &str) -> bool {
        matches!(
            operation,
            "region" | "endpointOverride" | "credentialsProvider" | "maxAttempts" | "build"
        ) || TIMEOUT_OPERATIONS.contains(&operation)
            || (B::STORAGE && STORAGE_OPERATIONS.contains(&operation))
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, InvocationError> {
        match operation {
            "region" => {
                let region = expect_kind(operation, arg(operation, args, 0)?, "a string", Value::as_str)?;
                self.with_builder(operation, |builder| builder.apply_region(region.to_string()))
            }
            "endpointOverride" => {
                let url = expect_kind(operation, arg(operation, args, 0)?, "a string", Value::as_str)?;
                self.with_builder(operation, |builder| builder.apply_endpoint_url(url.to_string()))
            }
            "credentialsProvider" => {
                let provider = arg(operation, args, 0)?
                    .downcast::<SharedCredentialsProvider>()
                    .ok_or_else(|| {
                        InvocationError::invalid_argument(operation, "expected a SharedCredentialsProvider bean")
                    })?;
                self.with_builder(operation, |builder| {
                    builder.apply_credentials_provider(SharedCredentialsProvider::clone(&provider))
                })
            }
            "connectTimeout" | "readTimeout" | "operationTimeout" | "operationAttemptTimeout" => {
                let timeout = Self::duration_arg(operation, args)?;
                let mut pending = self.pending.lock();
                let timeouts = &mut pending.timeouts;
                match operation {
                    "connectTimeout" => timeouts.connect = Some(timeout),
                    "readTimeout" => timeouts.read = Some(timeout),
                    "operationTimeout" => timeouts.operation = Some(timeout),
                    _ => timeouts.operation_attempt = Some(timeout),
                }
                Ok(Value::Null)
            }
            "maxAttempts" => {
                let attempts = expect_kind(operation, arg(operation, args, 0)?, "an integer", Value::as_int)?;
                let attempts = u32::try_from(attempts)
                    .map_err(|_| InvocationError::invalid_argument(operation, "attempts out of range"))?;
                self.pending.lock().max_attempts = Some(attempts);
                Ok(Value::Null)
            }
            "build" => {
                let mut pending = self.pending.lock();
                let mut builder = pending.builder.take().ok_or_else(|| self.consumed(operation))?;
                if !pending.timeouts.is_empty() {
                    builder.apply_timeouts(&pending.timeouts);
                }
                if let Some(attempts) = pending.max_attempts {
                    builder.apply_max_attempts(attempts);
                }
                debug!(client = B::CLIENT_TYPE, "Building SDK client");
                Ok(Value::Bean(std::sync::Arc::new(builder.build_client())))
            }
            other => match StorageFlag::from_operation(other).filter(|_| B::STORAGE) {
                Some(flag) => {
                    let value = expect_kind(other, arg(other, args, 0)?, "a boolean", Value::as_bool)?;
                    self.with_builder(other, |builder| builder.apply_storage_flag(flag, value))
                }
                None => Err(InvocationError::NoSuchOperation {
                    type_name: self.type_name.clone(),
                    operation: other.to_string(),
                }),
            },
        }
    }
}

macro_rules! rust_sdk_service {
    ($feature:literal, $krate:ident $(, $storage:ident)?) => {
        #[cfg(feature = $feature)]
        impl ServiceConfig for $krate::config::Builder {
            const CLIENT_TYPE: &'static str = concat!(stringify!($krate), "::Client");

            type Client = $krate::Client;

            fn new_builder() -> Self {
                $krate::config::Builder::new().behavior_version($krate::config::BehaviorVersion::latest())
            }

            fn apply_region(&mut self, region: String) {
                self.set_region(Some($krate::config::Region::new(region)));
            }

            fn apply_endpoint_url(&mut self, url: String) {
                self.set_endpoint_url(Some(url));
            }

            fn apply_credentials_provider(&mut self, provider: SharedCredentialsProvider) {
                self.set_credentials_provider(Some(provider));
            }

            fn apply_timeouts(&mut self, timeouts: &Timeouts) {
                let mut config = $krate::config::timeout::TimeoutConfig::builder();
                config.set_connect_timeout(timeouts.connect);
                config.set_read_timeout(timeouts.read);
                config.set_operation_timeout(timeouts.operation);
                config.set_operation_attempt_timeout(timeouts.operation_attempt);
                self.set_timeout_config(Some(config.build()));
            }

            fn apply_max_attempts(&mut self, attempts: u32) {
                self.set_retry_config(Some(
                    $krate::config::retry::RetryConfig::standard().with_max_attempts(attempts),
                ));
            }

            $(rust_sdk_service!(@$storage);)?

            fn build_client(self) -> Self::Client {
                $krate::Client::from_conf(self.build())
            }
        }
    };
    (@storage) => {
        const STORAGE: bool = true;

        fn apply_storage_flag(&mut self, flag: StorageFlag, value: bool) {
            match flag {
                StorageFlag::ForcePathStyle => {
                    self.set_force_path_style(Some(value));
                }
                StorageFlag::Accelerate => {
                    self.set_accelerate(Some(value));
                }
                StorageFlag::UseDualStack => {
                    self.set_use_dual_stack(Some(value));
                }
            }
        }
    };
}

rust_sdk_service!("s3", aws_sdk_s3, storage);
rust_sdk_service!("sqs", aws_sdk_sqs);
rust_sdk_service!("sns", aws_sdk_sns);
rust_sdk_service!("dynamodb", aws_sdk_dynamodb);

#[cfg(any(feature = "s3", feature = "sqs", feature = "sns", feature = "dynamodb"))]
fn service_type<B: ServiceConfig>() -> FunctionType {
    FunctionType::new(B::CLIENT_TYPE).with_operation("builder", |_| {
        Ok(Value::Object(std::sync::Arc::new(RustSdkBuilder::<B>::new())))
    })
}

/// Register every service crate enabled at build time.
pub fn register_types(types: &TypeRegistry) {
    #[cfg(feature = "s3")]
    types.register(service_type::<aws_sdk_s3::config::Builder>());
    #[cfg(feature = "sqs")]
    types.register(service_type::<aws_sdk_sqs::config::Builder>());
    #[cfg(feature = "sns")]
    types.register(service_type::<aws_sdk_sns::config::Builder>());
    #[cfg(feature = "dynamodb")]
    types.register(service_type::<aws_sdk_dynamodb::config::Builder>());

    debug!(types = types.len(), "Registered Rust SDK client types");
}
