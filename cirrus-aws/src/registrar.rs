//! Client registration.
//!
//! The registrar turns a client selection (an explicit list, or catalog
//! discovery) into container registrations. Clients whose SDK module is not
//! linked, that the user already registered, that lack a required
//! collaborator or that are switched off are skipped. Malformed names and
//! builders that cannot be created or built stop the bootstrap.

use crate::catalog::{BuilderNameCatalog, ResourceLoader};
use crate::configurer::ClientBuilderConfigurer;
use crate::descriptor::ClientDescriptor;
use crate::error::{AutoConfigureError, Result};
use crate::generation::SdkGeneration;
use crate::invoker::{DynamicInvoker, TypeRegistry};
use crate::key::ConfigKeyResolver;
use crate::properties::AwsProperties;
use cirrus_container::{BeanDefinition, BeanRegistry};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Which clients to register.
#[derive(Clone)]
pub enum ClientSelection {
    /// Fully-qualified client type names.
    Explicit(Vec<String>),
    /// Every builder listed in the catalog visible to the loader.
    Discover(Arc<dyn ResourceLoader>),
}

impl ClientSelection {
    pub fn explicit<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Explicit(clients.into_iter().map(Into::into).collect())
    }

    pub fn discover(loader: impl ResourceLoader + 'static) -> Self {
        Self::Discover(Arc::new(loader))
    }
}

impl fmt::Debug for ClientSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(clients) => f.debug_tuple("Explicit").field(clients).finish(),
            Self::Discover(loader) => f.debug_tuple("Discover").field(&loader.context_id()).finish(),
        }
    }
}

/// When registered clients are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationMode {
    /// Register a definition; the client is built on first lookup.
    #[default]
    Lazy,
    /// Build now and register the finished client.
    Eager,
}

/// Why a client was not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The named type is not linked in.
    TypeNotFound(String),
    /// A bean with the client's name already exists.
    AlreadyRegistered,
    /// A required collaborator bean is missing.
    MissingCollaborator(String),
    /// The resolved `enabled` switch is off.
    Disabled,
    /// The sync or async variant is switched off for discovery.
    VariantDisabled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeNotFound(name) => write!(f, "type not found: {}", name),
            Self::AlreadyRegistered => f.write_str("already registered"),
            Self::MissingCollaborator(bean) => write!(f, "missing bean {}", bean),
            Self::Disabled => f.write_str("disabled"),
            Self::VariantDisabled => f.write_str("variant disabled"),
        }
    }
}

/// One skipped client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClient {
    pub client: String,
    pub reason: SkipReason,
}

/// Outcome of one registration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedClient>,
}

impl RegistrationReport {
    pub fn is_registered(&self, client: &str) -> bool {
        self.registered.iter().any(|registered| registered == client)
    }

    pub fn skip_reason(&self, client: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|skipped| skipped.client == client)
            .map(|skipped| &skipped.reason)
    }

    fn skip(&mut self, client: &str, reason: SkipReason) {
        debug!(client, reason = %reason, "Skipping client");
        self.skipped.push(SkippedClient {
            client: client.to_string(),
            reason,
        });
    }
}

enum Outcome {
    Registered,
    Skipped(SkipReason),
}

/// Registers the clients of one SDK generation.
pub struct ClientRegistrar {
    configurer: ClientBuilderConfigurer,
    resolver: ConfigKeyResolver,
    catalog: Arc<BuilderNameCatalog>,
    mode: RegistrationMode,
}

impl ClientRegistrar {
    pub fn new(
        generation: Arc<dyn SdkGeneration>,
        properties: Arc<AwsProperties>,
        types: TypeRegistry,
        catalog: Arc<BuilderNameCatalog>,
    ) -> Self {
        let resolver = ConfigKeyResolver::new(generation.naming());
        Self {
            configurer: ClientBuilderConfigurer::new(generation, properties, DynamicInvoker::new(types)),
            resolver,
            catalog,
            mode: RegistrationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: RegistrationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RegistrationMode {
        self.mode
    }

    pub fn configurer(&self) -> &ClientBuilderConfigurer {
        &self.configurer
    }

    /// Register every selected client with `registry`.
    pub fn register_clients(
        &self,
        registry: &dyn BeanRegistry,
        selection: &ClientSelection,
    ) -> Result<RegistrationReport> {
        let generation = self.configurer.generation();
        let mut report = RegistrationReport::default();

        match selection {
            ClientSelection::Explicit(clients) => {
                for client in clients {
                    let builder_type = generation.builder_type_for(client);
                    self.register_candidate(registry, client, &builder_type, &mut report)?;
                }
            }
            ClientSelection::Discover(loader) => {
                let flags = self.configurer.properties().flags;
                let builders = self.catalog.builder_names(loader.as_ref())?;

                for builder_type in builders.iter() {
                    let Some(client) = generation.client_type_for(builder_type) else {
                        let e = AutoConfigureError::ClientTypeNotDetermined(builder_type.clone());
                        error!(builder = %builder_type, error = %e, "Client auto-configuration failed");
                        return Err(e);
                    };
                    if !flags.allows(generation.is_async_builder(builder_type)) {
                        report.skip(&client, SkipReason::VariantDisabled);
                        continue;
                    }
                    self.register_candidate(registry, &client, builder_type, &mut report)?;
                }
            }
        }

        info!(
            generation = generation.name(),
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            "Client auto-configuration complete"
        );
        Ok(report)
    }

    fn register_candidate(
        &self,
        registry: &dyn BeanRegistry,
        client: &str,
        builder_type: &str,
        report: &mut RegistrationReport,
    ) -> Result<()> {
        match self.try_register(registry, client, builder_type) {
            Ok(Outcome::Registered) => {
                report.registered.push(client.to_string());
                Ok(())
            }
            Ok(Outcome::Skipped(reason)) => {
                report.skip(client, reason);
                Ok(())
            }
            Err(AutoConfigureError::ClientDisabled(_)) => {
                report.skip(client, SkipReason::Disabled);
                Ok(())
            }
            Err(AutoConfigureError::TypeNotFound(name)) => {
                report.skip(client, SkipReason::TypeNotFound(name));
                Ok(())
            }
            Err(e) => {
                error!(client, error = %e, "Client auto-configuration failed");
                Err(e)
            }
        }
    }

    fn try_register(
        &self,
        registry: &dyn BeanRegistry,
        client: &str,
        builder_type: &str,
    ) -> Result<Outcome> {
        let generation = self.configurer.generation();
        let (factory_type, _) = generation.builder_factory(client, builder_type);
        if !self.configurer.invoker().types().contains(&factory_type) {
            return Ok(Outcome::Skipped(SkipReason::TypeNotFound(factory_type)));
        }

        if registry.contains_bean_definition(client) {
            return Ok(Outcome::Skipped(SkipReason::AlreadyRegistered));
        }

        if let Some(collaborator) = generation.required_collaborator(client)
            && !registry.contains_bean_definition(collaborator)
        {
            return Ok(Outcome::Skipped(SkipReason::MissingCollaborator(collaborator.to_string())));
        }

        let descriptor = self.resolver.descriptor(client)?;

        match self.mode {
            RegistrationMode::Lazy => self.register_lazy(registry, descriptor, builder_type),
            RegistrationMode::Eager => self.register_eager(registry, &descriptor, builder_type),
        }
    }

    fn register_lazy(
        &self,
        registry: &dyn BeanRegistry,
        descriptor: ClientDescriptor,
        builder_type: &str,
    ) -> Result<Outcome> {
        if !self.configurer.is_enabled(&descriptor) {
            return Ok(Outcome::Skipped(SkipReason::Disabled));
        }

        let client = descriptor.type_name().to_string();
        let configurer = self.configurer.clone();
        let builder_type = builder_type.to_string();
        let definition = BeanDefinition::new(client.clone(), move |registry| {
            let built = configurer.build_client(registry, &descriptor, &builder_type)?;
            if let Some(disposer) = built.disposer() {
                registry.register_disposer(descriptor.type_name(), disposer);
            }
            Ok(built.bean)
        });

        registry.register_bean_definition(&client, definition)?;
        debug!(client = %client, "Registered client definition");
        Ok(Outcome::Registered)
    }

    fn register_eager(
        &self,
        registry: &dyn BeanRegistry,
        descriptor: &ClientDescriptor,
        builder_type: &str,
    ) -> Result<Outcome> {
        let client = descriptor.type_name();
        let built = self.configurer.build_client(registry, descriptor, builder_type)?;

        registry.register_singleton(client, built.bean.clone())?;
        if let Some(disposer) = built.disposer() {
            registry.register_disposer(client, disposer);
        }
        debug!(client, "Registered client");
        Ok(Outcome::Registered)
    }
}

impl fmt::Debug for ClientRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistrar")
            .field("configurer", &self.configurer)
            .field("catalog", &self.catalog.location())
            .field("mode", &self.mode)
            .finish()
    }
}
