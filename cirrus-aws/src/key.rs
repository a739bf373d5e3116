//! Configuration keys.

use crate::descriptor::{ClientDescriptor, NamingConvention};
use crate::error::MalformedTypeName;
use std::fmt;
use tracing::error;

/// Fallback key shared by every client.
pub const DEFAULT_KEY: &str = "default";

/// Suffix that marks an async variant key.
pub const ASYNC_KEY_SUFFIX: &str = "-async";

/// Configuration key of one client: a service package plus the async flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigKey {
    base: String,
    is_async: bool,
}

impl ConfigKey {
    pub fn new(base: impl Into<String>, is_async: bool) -> Self {
        Self {
            base: base.into(),
            is_async,
        }
    }

    /// The `default` key.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_KEY, false)
    }

    pub fn for_descriptor(descriptor: &ClientDescriptor) -> Self {
        Self::new(descriptor.service_package(), descriptor.is_async())
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Keys consulted for this client, most specific first.
    ///
    /// `sqs-async` looks at `sqs-async`, `sqs`, then `default`. With
    /// `default_async` set the async fallback `default-async` is tried
    /// before `default`.
    pub fn lookup_chain(&self, default_async: bool) -> Vec<String> {
        let mut chain = Vec::with_capacity(4);
        if self.is_async {
            chain.push(format!("{}{}", self.base, ASYNC_KEY_SUFFIX));
        }
        if self.base != DEFAULT_KEY {
            chain.push(self.base.clone());
        }
        if self.is_async && default_async {
            chain.push(format!("{}{}", DEFAULT_KEY, ASYNC_KEY_SUFFIX));
        }
        chain.push(DEFAULT_KEY.to_string());
        chain.dedup();
        chain
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_async {
            write!(f, "{}{}", self.base, ASYNC_KEY_SUFFIX)
        } else {
            f.write_str(&self.base)
        }
    }
}

/// Derives descriptors and keys for one naming convention.
#[derive(Debug, Clone, Copy)]
pub struct ConfigKeyResolver {
    naming: NamingConvention,
}

impl ConfigKeyResolver {
    pub fn new(naming: NamingConvention) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Descriptor for `type_name`. Failures are logged before they are
    /// returned.
    pub fn descriptor(&self, type_name: &str) -> Result<ClientDescriptor, MalformedTypeName> {
        ClientDescriptor::derive(type_name, &self.naming).inspect_err(|e| {
            error!(client = type_name, error = %e, "Unable to derive configuration key");
        })
    }

    /// `<service-package>` or `<service-package>-async` for `type_name`.
    pub fn resolve_key(&self, type_name: &str) -> Result<ConfigKey, MalformedTypeName> {
        self.descriptor(type_name)
            .map(|descriptor| ConfigKey::for_descriptor(&descriptor))
    }
}
