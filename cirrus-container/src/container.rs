// Named bean container

use crate::definition::{Bean, BeanDefinition, BeanRegistry, Disposer};
use crate::{ContainerError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace, warn};

#[derive(Default)]
struct Inner {
    definitions: RwLock<HashMap<String, BeanDefinition>>,
    singletons: RwLock<HashMap<String, Bean>>,
    registration_order: RwLock<Vec<String>>,
    in_creation: Mutex<HashMap<String, ThreadId>>,
    creation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    disposers: Mutex<Vec<(String, Disposer)>>,
}

/// The bean container. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new bean container");
        Self::default()
    }

    /// Names of every registered bean, in registration order.
    pub fn bean_names(&self) -> Vec<String> {
        self.inner.registration_order.read().clone()
    }

    /// Whether the bean has been instantiated already.
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.inner.singletons.read().contains_key(name)
    }

    /// Declared type of a bean, if it was registered through a definition.
    pub fn definition_type(&self, name: &str) -> Option<String> {
        self.inner
            .definitions
            .read()
            .get(name)
            .map(|definition| definition.type_name().to_string())
    }

    /// Run shutdown hooks in reverse registration order and drop every
    /// cached singleton. Definitions stay registered.
    pub fn destroy_singletons(&self) {
        let disposers = std::mem::take(&mut *self.inner.disposers.lock());
        let count = disposers.len();

        for (name, disposer) in disposers.into_iter().rev() {
            trace!(bean = %name, "Running disposer");
            disposer();
        }

        let mut singletons = self.inner.singletons.write();
        let singleton_count = singletons.len();
        singletons.clear();

        debug!(
            disposers = count,
            singletons = singleton_count,
            "Destroyed container singletons"
        );
    }

    fn is_registered(&self, name: &str) -> bool {
        self.inner.singletons.read().contains_key(name)
            || self.inner.definitions.read().contains_key(name)
    }

    fn creation_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.inner
            .creation_locks
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn instantiate(&self, name: &str, definition: &BeanDefinition) -> Result<Bean> {
        let current = thread::current().id();
        if self.inner.in_creation.lock().get(name) == Some(&current) {
            return Err(ContainerError::CircularReference(name.to_string()));
        }

        // Other threads building the same bean wait here for the cached instance.
        let lock = self.creation_lock(name);
        let _guard = lock.lock();
        if let Some(bean) = self.inner.singletons.read().get(name) {
            trace!(bean = name, "Resolved singleton created by another thread");
            return Ok(bean.clone());
        }

        self.inner.in_creation.lock().insert(name.to_string(), current);
        trace!(bean = name, bean_type = definition.type_name(), "Instantiating bean");
        let created = definition.create(self);
        self.inner.in_creation.lock().remove(name);

        let bean = created.map_err(|source| ContainerError::Creation {
            name: name.to_string(),
            source,
        })?;

        let mut singletons = self.inner.singletons.write();
        let cached = singletons.entry(name.to_string()).or_insert(bean).clone();
        debug!(bean = name, "Bean instantiated and cached");
        Ok(cached)
    }
}

impl BeanRegistry for Container {
    fn contains_bean_definition(&self, name: &str) -> bool {
        let exists = self.is_registered(name);
        trace!(bean = name, exists, "Checked bean existence");
        exists
    }

    fn get_bean(&self, name: &str) -> Result<Bean> {
        if let Some(bean) = self.inner.singletons.read().get(name) {
            trace!(bean = name, "Resolved cached singleton");
            return Ok(bean.clone());
        }

        let definition = self.inner.definitions.read().get(name).cloned();
        match definition {
            Some(definition) => self.instantiate(name, &definition),
            None => {
                debug!(bean = name, "Bean not found in container");
                Err(ContainerError::not_found(name))
            }
        }
    }

    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> Result<()> {
        if self.is_registered(name) {
            return Err(ContainerError::DuplicateBean(name.to_string()));
        }

        debug!(bean = name, bean_type = definition.type_name(), "Registering bean definition");
        self.inner
            .definitions
            .write()
            .insert(name.to_string(), definition);
        self.inner.registration_order.write().push(name.to_string());
        Ok(())
    }

    fn register_singleton(&self, name: &str, bean: Bean) -> Result<()> {
        if self.is_registered(name) {
            return Err(ContainerError::DuplicateBean(name.to_string()));
        }

        debug!(bean = name, "Registering singleton");
        self.inner.singletons.write().insert(name.to_string(), bean);
        self.inner.registration_order.write().push(name.to_string());
        Ok(())
    }

    fn register_disposer(&self, name: &str, disposer: Disposer) {
        if !self.is_registered(name) {
            warn!(bean = name, "Disposer registered for an unknown bean");
        }
        self.inner
            .disposers
            .lock()
            .push((name.to_string(), disposer));
    }
}
