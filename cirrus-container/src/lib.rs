//! Named bean container for Cirrus.
//!
//! Beans are registered under a string name, either as a ready instance
//! (`register_singleton`) or as a [`BeanDefinition`] whose factory runs on
//! first lookup. Auto-configuration talks to the container only through the
//! [`BeanRegistry`] trait.
//!
//! ```
//! use cirrus_container::{Bean, BeanRegistry, Container, get_bean_as};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.register_singleton("greeting", Arc::new(String::from("hello")) as Bean).unwrap();
//!
//! let greeting = get_bean_as::<String>(&container, "greeting").unwrap();
//! assert_eq!(greeting.as_str(), "hello");
//! ```

pub mod container;
pub mod definition;
pub mod error;

pub use container::Container;
pub use definition::{
    Bean, BeanDefinition, BeanFactory, BeanRegistry, Disposer, downcast_bean, get_bean_as,
};
pub use error::{BoxError, ContainerError, Result};
