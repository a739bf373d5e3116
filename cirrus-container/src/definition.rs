// Bean definitions and the registry surface consumed by auto-configuration

use crate::{BoxError, ContainerError, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A container-managed object.
pub type Bean = Arc<dyn Any + Send + Sync>;

/// Produces a bean on first lookup. The registry is handed in so the factory
/// can resolve its own collaborators.
pub type BeanFactory =
    Arc<dyn Fn(&dyn BeanRegistry) -> std::result::Result<Bean, BoxError> + Send + Sync>;

/// Runs once when the container shuts down.
pub type Disposer = Box<dyn FnOnce() + Send + Sync>;

/// Deferred recipe for a named bean.
#[derive(Clone)]
pub struct BeanDefinition {
    type_name: String,
    factory: BeanFactory,
}

impl BeanDefinition {
    pub fn new<F>(type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&dyn BeanRegistry) -> std::result::Result<Bean, BoxError> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            factory: Arc::new(factory),
        }
    }

    /// The type this definition produces, as declared by the registrant.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn create(&self, registry: &dyn BeanRegistry) -> std::result::Result<Bean, BoxError> {
        (self.factory)(registry)
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Name-keyed bean registry.
///
/// `contains_bean_definition` answers for both lazy definitions and
/// singletons registered directly, so callers can back off whenever a name
/// is taken.
pub trait BeanRegistry: Send + Sync {
    fn contains_bean_definition(&self, name: &str) -> bool;

    fn get_bean(&self, name: &str) -> Result<Bean>;

    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> Result<()>;

    fn register_singleton(&self, name: &str, bean: Bean) -> Result<()>;

    /// Attach a shutdown hook to a bean. Registries without a lifecycle
    /// drop it.
    fn register_disposer(&self, name: &str, disposer: Disposer) {
        let _ = (name, disposer);
    }
}

/// Downcast a bean to a concrete type.
pub fn downcast_bean<T: Any + Send + Sync>(name: &str, bean: Bean) -> Result<Arc<T>> {
    bean.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Look a bean up and downcast it in one step.
pub fn get_bean_as<T: Any + Send + Sync>(registry: &dyn BeanRegistry, name: &str) -> Result<Arc<T>> {
    let bean = registry.get_bean(name)?;
    downcast_bean(name, bean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_mismatch_names_expected_type() {
        let bean: Bean = Arc::new(42u32);
        let err = downcast_bean::<String>("answer", bean).unwrap_err();

        match err {
            ContainerError::TypeMismatch { name, expected } => {
                assert_eq!(name, "answer");
                assert!(expected.contains("String"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_definition_debug_shows_type() {
        let definition = BeanDefinition::new("demo.Widget", |_| Ok(Arc::new(1u8) as Bean));
        assert!(format!("{definition:?}").contains("demo.Widget"));
    }
}
