// Error types for the bean container

use thiserror::Error;

/// Boxed error returned by bean factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("No bean named '{0}' is defined")]
    BeanNotFound(String),

    #[error("Bean '{name}' is not of the requested type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("A bean named '{0}' is already registered")]
    DuplicateBean(String),

    #[error("Bean '{0}' is currently in creation; is there a circular reference?")]
    CircularReference(String),

    #[error("Error creating bean '{name}': {source}")]
    Creation {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl ContainerError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::BeanNotFound(name.into())
    }

    /// True when the error only says the bean is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BeanNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
