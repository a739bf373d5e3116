//! Client builder configuration.
//!
//! [`ClientBuilderConfigurer`] walks one builder through the configuration
//! steps in a fixed order:
//!
//! 1. client tuning
//! 2. endpoint, or region when no usable endpoint is set
//! 3. override configuration bean
//! 4. HTTP transport: client bean, client builder bean, or inline transport
//! 5. credentials provider and request handlers
//! 6. storage flags and encryption materials
//! 7. the `enabled` switch
//!
//! Individual settings are best effort: an operation the builder lacks is
//! skipped quietly, a failing one is logged and skipped. Only creating and
//! building the builder are fatal.

use crate::descriptor::ClientDescriptor;
use crate::error::{AutoConfigureError, Result};
use crate::generation::SdkGeneration;
use crate::invoker::{DynamicInvoker, DynamicObject};
use crate::key::ConfigKey;
use crate::overrides::OverrideChain;
use crate::properties::AwsProperties;
use crate::value::Value;
use cirrus_container::{Bean, BeanRegistry, Disposer};
use std::sync::Arc;
use tracing::{debug, trace, warn};

const CLOSE_OPERATION: &str = "close";

/// Shared state of one configuration pass, handed to generation and
/// transport adapters.
pub struct StepContext<'a> {
    invoker: &'a DynamicInvoker,
    registry: &'a dyn BeanRegistry,
    client: &'a str,
}

impl<'a> StepContext<'a> {
    pub fn new(invoker: &'a DynamicInvoker, registry: &'a dyn BeanRegistry, client: &'a str) -> Self {
        Self {
            invoker,
            registry,
            client,
        }
    }

    pub fn invoker(&self) -> &DynamicInvoker {
        self.invoker
    }

    pub fn registry(&self) -> &dyn BeanRegistry {
        self.registry
    }

    /// Client type being configured.
    pub fn client(&self) -> &str {
        self.client
    }

    /// Apply one setting. Returns whether it took effect.
    pub fn apply(&self, target: &dyn DynamicObject, operation: &str, args: &[Value]) -> bool {
        match self.invoker.invoke(target, operation, args) {
            Ok(_) => true,
            Err(e) if e.is_absent() => {
                debug!(
                    client = self.client,
                    target = target.type_name(),
                    operation,
                    "Operation not supported, skipping setting"
                );
                false
            }
            Err(e) => {
                warn!(
                    client = self.client,
                    target = target.type_name(),
                    operation,
                    error = %e,
                    "Failed to apply setting"
                );
                false
            }
        }
    }

    /// Apply a setting only when it has a value.
    pub fn apply_opt<V: Into<Value>>(
        &self,
        target: &dyn DynamicObject,
        operation: &str,
        value: Option<V>,
    ) -> bool {
        match value {
            Some(value) => self.apply(target, operation, &[value.into()]),
            None => false,
        }
    }

    /// Create a nested object through a static factory, e.g. a transport
    /// builder. Missing types yield `None`.
    pub fn construct(
        &self,
        type_name: &str,
        operation: &str,
        args: &[Value],
    ) -> Option<Arc<dyn DynamicObject>> {
        match self.invoker.construct(type_name, operation, args) {
            Ok(object) => Some(object),
            Err(e) if e.is_absent() => {
                debug!(client = self.client, type_name, error = %e, "Type not available, skipping");
                None
            }
            Err(e) => {
                warn!(client = self.client, type_name, error = %e, "Failed to create nested object");
                None
            }
        }
    }

    /// Build a nested builder.
    pub fn build(&self, builder: &dyn DynamicObject) -> Option<Value> {
        match self.invoker.invoke(builder, "build", &[]) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    client = self.client,
                    target = builder.type_name(),
                    error = %e,
                    "Failed to build nested object"
                );
                None
            }
        }
    }

    /// Look up a referenced bean. A name that resolves to nothing is logged
    /// and yields `None`.
    pub fn bean(&self, name: &str, role: &str) -> Option<Bean> {
        match self.registry.get_bean(name) {
            Ok(bean) => Some(bean),
            Err(e) => {
                warn!(client = self.client, bean = name, role, error = %e, "Referenced bean unavailable");
                None
            }
        }
    }
}

/// A built client, ready for registration.
pub struct BuiltClient {
    pub bean: Bean,
    closable: Option<Arc<dyn DynamicObject>>,
    invoker: DynamicInvoker,
}

impl BuiltClient {
    /// Disposer closing the client, when it can be closed.
    pub fn disposer(&self) -> Option<Disposer> {
        let client = self.closable.clone()?;
        let invoker = self.invoker.clone();
        Some(Box::new(move || {
            if let Err(e) = invoker.invoke(&*client, CLOSE_OPERATION, &[]) {
                warn!(client = client.type_name(), error = %e, "Failed to close client");
            }
        }))
    }
}

/// Applies property values to one generation's builders.
#[derive(Clone)]
pub struct ClientBuilderConfigurer {
    generation: Arc<dyn SdkGeneration>,
    properties: Arc<AwsProperties>,
    invoker: DynamicInvoker,
}

impl ClientBuilderConfigurer {
    pub fn new(
        generation: Arc<dyn SdkGeneration>,
        properties: Arc<AwsProperties>,
        invoker: DynamicInvoker,
    ) -> Self {
        Self {
            generation,
            properties,
            invoker,
        }
    }

    pub fn generation(&self) -> &dyn SdkGeneration {
        &*self.generation
    }

    pub fn properties(&self) -> &AwsProperties {
        &self.properties
    }

    pub fn invoker(&self) -> &DynamicInvoker {
        &self.invoker
    }

    /// Override chain for `descriptor`.
    pub fn chain(&self, descriptor: &ClientDescriptor) -> OverrideChain<'_> {
        OverrideChain::new(
            &self.properties.clients,
            &ConfigKey::for_descriptor(descriptor),
            self.generation.has_default_async(),
        )
    }

    /// Whether the resolved `enabled` switch allows the client. Unset means
    /// enabled.
    pub fn is_enabled(&self, descriptor: &ClientDescriptor) -> bool {
        self.chain(descriptor).resolve(|f| f.enabled).unwrap_or(true)
    }

    /// Create a fresh builder for the client.
    pub fn create_builder(&self, client_type: &str, builder_type: &str) -> Result<Arc<dyn DynamicObject>> {
        let (factory_type, operation) = self.generation.builder_factory(client_type, builder_type);
        self.invoker
            .construct(&factory_type, operation, &[])
            .map_err(|e| AutoConfigureError::invocation(client_type, e))
    }

    /// Apply every configured setting to `builder`.
    ///
    /// Returns [`AutoConfigureError::ClientDisabled`] when the resolved
    /// `enabled` switch is off.
    pub fn configure(
        &self,
        builder: &dyn DynamicObject,
        descriptor: &ClientDescriptor,
        registry: &dyn BeanRegistry,
    ) -> Result<()> {
        let client = descriptor.type_name();
        let steps = StepContext::new(&self.invoker, registry, client);
        let chain = self.chain(descriptor);
        let ops = self.generation.operations();

        trace!(client, keys = ?chain.keys().collect::<Vec<_>>(), "Configuring client builder");

        if let Some(tuning) = chain.resolve_merged(|f| f.client.as_ref()) {
            self.generation.apply_tuning(&steps, builder, &tuning);
        }

        match chain.resolve(|f| f.endpoint.as_ref().filter(|endpoint| endpoint.is_usable())) {
            Some(endpoint) => {
                steps.apply(builder, ops.endpoint, &self.generation.endpoint_args(endpoint));
            }
            None => {
                if let Some(region) = chain.resolve(|f| f.region.as_deref()) {
                    steps.apply(builder, ops.region, &[Value::from(region)]);
                }
            }
        }

        if let Some(operation) = ops.override_configuration
            && let Some(name) = chain.resolve(|f| f.client_override_configuration_bean_name.as_deref())
            && let Some(bean) = steps.bean(name, "override configuration")
        {
            steps.apply(builder, operation, &[Value::Bean(bean)]);
        }

        self.configure_transport(&steps, &chain, builder);

        if let Some(name) = chain.resolve(|f| f.credentials_provider_bean_name.as_deref())
            && let Some(bean) = steps.bean(name, "credentials provider")
        {
            steps.apply(builder, ops.credentials, &[Value::Bean(bean)]);
        }

        if let Some(operation) = ops.request_handlers
            && let Some(names) = chain.resolve(|f| f.request_handler_bean_names.as_ref())
        {
            let handlers: Vec<Value> = names
                .iter()
                .filter_map(|name| steps.bean(name, "request handler"))
                .map(Value::Bean)
                .collect();
            if !handlers.is_empty() {
                steps.apply(builder, operation, &[Value::List(handlers)]);
            }
        }

        if !self.properties.s3.is_empty() {
            self.generation
                .apply_storage_settings(&steps, builder, descriptor, &self.properties.s3);
        }

        if let Some(hook) = ops.encryption
            && builder.has_operation(hook.operation)
            && registry.contains_bean_definition(hook.bean_name)
            && let Some(materials) = steps.bean(hook.bean_name, "encryption materials")
        {
            steps.apply(builder, hook.operation, &[Value::Bean(materials)]);
        }

        if !chain.resolve(|f| f.enabled).unwrap_or(true) {
            return Err(AutoConfigureError::ClientDisabled(client.to_string()));
        }
        Ok(())
    }

    fn configure_transport(
        &self,
        steps: &StepContext<'_>,
        chain: &OverrideChain<'_>,
        builder: &dyn DynamicObject,
    ) {
        let ops = self.generation.operations();

        if let Some(operation) = ops.http_client
            && let Some(name) = chain.resolve(|f| f.http_client_bean_name.as_deref())
        {
            if let Some(bean) = steps.bean(name, "http client") {
                steps.apply(builder, operation, &[Value::Bean(bean)]);
            }
            return;
        }

        let Some(operation) = ops.http_client_builder else {
            return;
        };

        if let Some(name) = chain.resolve(|f| f.http_client_builder_bean_name.as_deref()) {
            if let Some(bean) = steps.bean(name, "http client builder") {
                steps.apply(builder, operation, &[Value::Bean(bean)]);
            }
            return;
        }

        if let Some(transport) = self.generation.transport_for(steps, builder)
            && let Some(inline) = transport.inline_transport(steps, chain)
        {
            steps.apply(builder, operation, &[inline]);
        }
    }

    /// Build the configured builder. Failure and non-object results are
    /// fatal.
    pub fn build(&self, builder: &dyn DynamicObject, descriptor: &ClientDescriptor) -> Result<Value> {
        let client = descriptor.type_name();
        let operation = self.generation.operations().build;
        let built = self
            .invoker
            .invoke(builder, operation, &[])
            .map_err(|e| AutoConfigureError::invocation(client, e))?;

        match built {
            Value::Object(_) | Value::Bean(_) => Ok(built),
            _ => Err(AutoConfigureError::UnexpectedResult {
                client: client.to_string(),
                operation: operation.to_string(),
                expected: "a client object",
            }),
        }
    }

    /// Create, configure and build one client.
    pub fn build_client(
        &self,
        registry: &dyn BeanRegistry,
        descriptor: &ClientDescriptor,
        builder_type: &str,
    ) -> Result<BuiltClient> {
        let builder = self.create_builder(descriptor.type_name(), builder_type)?;
        self.configure(&*builder, descriptor, registry)?;
        let built = self.build(&*builder, descriptor)?;

        let closable = match &built {
            Value::Object(object) if object.has_operation(CLOSE_OPERATION) => Some(object.clone()),
            _ => None,
        };
        let bean = built.to_bean().ok_or_else(|| AutoConfigureError::UnexpectedResult {
            client: descriptor.type_name().to_string(),
            operation: self.generation.operations().build.to_string(),
            expected: "a client object",
        })?;

        Ok(BuiltClient {
            bean,
            closable,
            invoker: self.invoker.clone(),
        })
    }
}

impl std::fmt::Debug for ClientBuilderConfigurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilderConfigurer")
            .field("generation", &self.generation.name())
            .field("fragments", &self.properties.clients.len())
            .finish()
    }
}
