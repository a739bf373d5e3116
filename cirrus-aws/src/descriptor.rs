//! Client identity derived from a type name.

use crate::error::MalformedTypeName;

/// How an SDK generation lays out its client type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingConvention {
    /// Package prefix shared by all service packages, separator included.
    pub package_prefix: &'static str,
    /// Path separator between package segments and before the type name.
    pub separator: &'static str,
    /// Suffix of async client type names, when the generation has them.
    pub async_suffix: Option<&'static str>,
}

impl NamingConvention {
    /// Split `type_name` into its package path and simple name.
    pub fn split<'a>(&self, type_name: &'a str) -> Option<(&'a str, &'a str)> {
        type_name.rsplit_once(self.separator)
    }

    pub fn is_async(&self, simple_name: &str) -> bool {
        self.async_suffix
            .is_some_and(|suffix| simple_name.ends_with(suffix))
    }
}

/// A client type and the facts derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDescriptor {
    type_name: String,
    service_package: String,
    is_async: bool,
}

impl ClientDescriptor {
    /// Derive the descriptor for `type_name`.
    ///
    /// The service package is what remains of the enclosing package once the
    /// generation's prefix is stripped, with separators turned into `-`:
    /// `com.amazonaws.services.dynamodbv2.AmazonDynamoDB` is `dynamodbv2`,
    /// `com.amazonaws.services.s3.transfer.Foo` is `s3-transfer`.
    pub fn derive(type_name: &str, naming: &NamingConvention) -> Result<Self, MalformedTypeName> {
        let malformed = || MalformedTypeName {
            type_name: type_name.to_string(),
            expected_prefix: naming.package_prefix.to_string(),
        };

        let (package, simple_name) = naming.split(type_name).ok_or_else(malformed)?;
        let qualified_package = format!("{}{}", package, naming.separator);
        let service_path = qualified_package
            .strip_prefix(naming.package_prefix)
            .and_then(|rest| rest.strip_suffix(naming.separator))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(malformed)?;

        Ok(Self {
            type_name: type_name.to_string(),
            service_package: service_path.replace(naming.separator, "-"),
            is_async: naming.is_async(simple_name),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn service_package(&self) -> &str {
        &self.service_package
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }
}
