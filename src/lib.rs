// Cirrus - property-driven AWS client auto-configuration
//
// This library wires AWS SDK clients into a named bean container from
// layered application properties.

// Re-export core functionality
pub use cirrus_container::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use cirrus_config;

#[cfg(feature = "aws")]
pub use cirrus_aws;

// Prelude for common imports
pub mod prelude {
    pub use crate::{Bean, BeanDefinition, BeanRegistry, Container, ContainerError, get_bean_as};

    #[cfg(feature = "config")]
    pub use cirrus_config::{ConfigManager, FileFormat};

    #[cfg(feature = "aws")]
    pub use cirrus_aws::{
        AutoConfigureError, AwsAutoConfiguration, ClientSelection, DirectoryResourceLoader,
        RegistrationMode, RegistrationReport, SkipReason, TypeRegistry,
    };
}
