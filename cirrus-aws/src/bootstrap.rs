// Auto-configuration entry point

use crate::catalog::BuilderNameCatalog;
use crate::error::Result;
use crate::generation::{SdkGeneration, SdkV1, SdkV2};
use crate::invoker::TypeRegistry;
use crate::properties::AwsProperties;
use crate::registrar::{ClientRegistrar, ClientSelection, RegistrationMode, RegistrationReport};
use cirrus_config::ConfigManager;
use cirrus_container::BeanRegistry;
use std::sync::Arc;
use tracing::debug;

/// Which clients of one SDK generation to set up, and how.
///
/// ```
/// use cirrus_aws::{AwsAutoConfiguration, ClientSelection, RegistrationMode, TypeRegistry};
/// use cirrus_testing::register_v1_sdk;
/// use cirrus_config::ConfigManager;
/// use cirrus_container::{BeanRegistry, Container};
///
/// let types = TypeRegistry::new();
/// register_v1_sdk(&types, &[("com.amazonaws.services.sqs.AmazonSQS", "sqs")]);
///
/// let config = ConfigManager::new();
/// config.set("aws.default.region", "us-east-1").unwrap();
///
/// let container = Container::new();
/// let report = AwsAutoConfiguration::v1(ClientSelection::explicit(["com.amazonaws.services.sqs.AmazonSQS"]))
///     .with_mode(RegistrationMode::Eager)
///     .apply(&config, types, &container)
///     .unwrap();
///
/// assert!(report.is_registered("com.amazonaws.services.sqs.AmazonSQS"));
/// assert!(container.contains_bean_definition("com.amazonaws.services.sqs.AmazonSQS"));
/// ```
#[derive(Clone)]
pub struct AwsAutoConfiguration {
    generation: Arc<dyn SdkGeneration>,
    selection: ClientSelection,
    mode: RegistrationMode,
    catalog: Arc<BuilderNameCatalog>,
}

impl AwsAutoConfiguration {
    pub fn new(generation: Arc<dyn SdkGeneration>, selection: ClientSelection) -> Self {
        Self {
            generation,
            selection,
            mode: RegistrationMode::default(),
            catalog: Arc::new(BuilderNameCatalog::new()),
        }
    }

    /// First-generation clients, configured from the `aws` namespace.
    pub fn v1(selection: ClientSelection) -> Self {
        Self::new(Arc::new(SdkV1), selection)
    }

    /// Second-generation clients, configured from the `aws2` namespace.
    pub fn v2(selection: ClientSelection) -> Self {
        Self::new(Arc::new(SdkV2), selection)
    }

    /// Rust SDK clients, configured from the `aws` namespace.
    #[cfg(feature = "rust-sdk")]
    pub fn rust_sdk(selection: ClientSelection) -> Self {
        Self::new(Arc::new(crate::generation::RustSdk), selection)
    }

    pub fn with_mode(mut self, mode: RegistrationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Share a catalog (and its cache) across configurations.
    pub fn with_catalog(mut self, catalog: Arc<BuilderNameCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn generation(&self) -> &dyn SdkGeneration {
        &*self.generation
    }

    pub fn selection(&self) -> &ClientSelection {
        &self.selection
    }

    /// Bind the generation's namespace from `config` and register the
    /// selected clients.
    pub fn apply(
        &self,
        config: &ConfigManager,
        types: TypeRegistry,
        registry: &dyn BeanRegistry,
    ) -> Result<RegistrationReport> {
        let properties = AwsProperties::from_config(config, self.generation.namespace())?;
        self.apply_properties(properties, types, registry)
    }

    /// Register the selected clients using already bound properties.
    pub fn apply_properties(
        &self,
        properties: AwsProperties,
        types: TypeRegistry,
        registry: &dyn BeanRegistry,
    ) -> Result<RegistrationReport> {
        debug!(
            generation = self.generation.name(),
            namespace = self.generation.namespace(),
            mode = ?self.mode,
            "Starting client auto-configuration"
        );

        ClientRegistrar::new(
            self.generation.clone(),
            Arc::new(properties),
            types,
            self.catalog.clone(),
        )
        .with_mode(self.mode)
        .register_clients(registry, &self.selection)
    }
}

impl std::fmt::Debug for AwsAutoConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsAutoConfiguration")
            .field("generation", &self.generation.name())
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .finish()
    }
}
