//! Dynamic invocation of SDK builder operations.
//!
//! SDK builders are reached through two capability traits: [`DynamicObject`]
//! for instances and [`DynamicType`] for the static side (factories such as
//! `standard()` or `builder()`). Types are looked up by fully-qualified name
//! in a [`TypeRegistry`], so an SDK module that is not linked in shows up as
//! a missing type instead of a compile error.

use crate::error::InvocationError;
use crate::value::Value;
use cirrus_container::Bean;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Converts a shared object into a container bean without losing its
/// concrete type.
pub trait AsBean {
    fn into_bean(self: Arc<Self>) -> Bean;
}

impl<T: Any + Send + Sync> AsBean for T {
    fn into_bean(self: Arc<Self>) -> Bean {
        self
    }
}

/// An object whose operations are known only by name.
///
/// Operations mutate through interior mutability, builders are shared
/// behind `Arc` while being configured.
pub trait DynamicObject: AsBean + Send + Sync {
    /// Fully-qualified type name.
    fn type_name(&self) -> &str;

    fn has_operation(&self, operation: &str) -> bool;

    /// Whether this object can be used where `interface` is expected.
    fn implements(&self, interface: &str) -> bool {
        let _ = interface;
        false
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, InvocationError>;
}

/// The static side of a type.
pub trait DynamicType: Send + Sync {
    fn name(&self) -> &str;

    fn has_static_operation(&self, operation: &str) -> bool;

    fn invoke_static(&self, operation: &str, args: &[Value]) -> Result<Value, InvocationError>;
}

type StaticOperation = Arc<dyn Fn(&[Value]) -> Result<Value, InvocationError> + Send + Sync>;

/// A [`DynamicType`] assembled from closures.
#[derive(Clone)]
pub struct FunctionType {
    name: String,
    operations: HashMap<String, StaticOperation>,
}

impl FunctionType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: HashMap::new(),
        }
    }

    pub fn with_operation<F>(mut self, operation: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.operations.insert(operation.into(), Arc::new(body));
        self
    }
}

impl DynamicType for FunctionType {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_static_operation(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    fn invoke_static(&self, operation: &str, args: &[Value]) -> Result<Value, InvocationError> {
        let body = self
            .operations
            .get(operation)
            .ok_or_else(|| InvocationError::NoSuchStaticOperation {
                type_name: self.name.clone(),
                operation: operation.to_string(),
            })?;
        body(args)
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<_> = self.operations.keys().collect();
        operations.sort();
        f.debug_struct("FunctionType")
            .field("name", &self.name)
            .field("operations", &operations)
            .finish()
    }
}

/// Name-indexed set of available types.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: Arc<RwLock<HashMap<String, Arc<dyn DynamicType>>>>,
    /// Interface name to the types known to implement it.
    assignable: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a type available by its name.
    pub fn register(&self, ty: impl DynamicType + 'static) {
        let name = ty.name().to_string();
        trace!(type_name = %name, "Registering dynamic type");
        self.types.write().insert(name, Arc::new(ty));
    }

    /// Record that `type_name` can be used where `interface` is expected.
    pub fn declare_assignable(&self, type_name: &str, interface: &str) {
        self.assignable
            .write()
            .entry(interface.to_string())
            .or_default()
            .insert(type_name.to_string());
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.read().contains_key(type_name)
    }

    pub fn for_name(&self, type_name: &str) -> Result<Arc<dyn DynamicType>, InvocationError> {
        self.types
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| InvocationError::TypeNotFound(type_name.to_string()))
    }

    /// Types are assignable to themselves and to declared interfaces.
    pub fn is_assignable(&self, type_name: &str, interface: &str) -> bool {
        type_name == interface
            || self
                .assignable
                .read()
                .get(interface)
                .is_some_and(|types| types.contains(type_name))
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

/// Uniform entry point for dynamic calls.
#[derive(Clone, Debug, Default)]
pub struct DynamicInvoker {
    types: TypeRegistry,
}

impl DynamicInvoker {
    pub fn new(types: TypeRegistry) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Call `operation` on `target`.
    pub fn invoke(
        &self,
        target: &dyn DynamicObject,
        operation: &str,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        if !target.has_operation(operation) {
            return Err(InvocationError::NoSuchOperation {
                type_name: target.type_name().to_string(),
                operation: operation.to_string(),
            });
        }

        trace!(
            type_name = target.type_name(),
            operation,
            args = args.len(),
            "Invoking operation"
        );
        target.invoke(operation, args)
    }

    /// Call a static `operation` on the type named `type_name`.
    pub fn invoke_static(
        &self,
        type_name: &str,
        operation: &str,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        let ty = self.types.for_name(type_name)?;
        if !ty.has_static_operation(operation) {
            return Err(InvocationError::NoSuchStaticOperation {
                type_name: type_name.to_string(),
                operation: operation.to_string(),
            });
        }

        trace!(type_name, operation, args = args.len(), "Invoking static operation");
        ty.invoke_static(operation, args)
    }

    /// Call a static factory and insist on an object result.
    pub fn construct(
        &self,
        type_name: &str,
        operation: &str,
        args: &[Value],
    ) -> Result<Arc<dyn DynamicObject>, InvocationError> {
        match self.invoke_static(type_name, operation, args)? {
            Value::Object(object) => Ok(object),
            other => Err(InvocationError::invalid_argument(
                operation,
                format!("{} returned {} instead of an object", type_name, other.kind()),
            )),
        }
    }

    /// Whether `target` is usable as `interface`, either by its own claim or
    /// through a declaration in the type registry.
    pub fn is_assignable(&self, target: &dyn DynamicObject, interface: &str) -> bool {
        target.implements(interface) || self.types.is_assignable(target.type_name(), interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Counter {
        hits: Mutex<i64>,
    }

    impl DynamicObject for Counter {
        fn type_name(&self) -> &str {
            "test.Counter"
        }

        fn has_operation(&self, operation: &str) -> bool {
            matches!(operation, "add" | "get")
        }

        fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, InvocationError> {
            let mut hits = self.hits.lock();
            match operation {
                "add" => {
                    let amount = crate::value::arg(operation, args, 0)?
                        .as_int()
                        .ok_or_else(|| InvocationError::invalid_argument(operation, "int"))?;
                    *hits += amount;
                    Ok(Value::Null)
                }
                _ => Ok(Value::Int(*hits)),
            }
        }
    }

    fn registry() -> TypeRegistry {
        let types = TypeRegistry::new();
        types.register(FunctionType::new("test.Counter").with_operation("create", |_| {
            Ok(Value::Object(Arc::new(Counter {
                hits: Mutex::new(0),
            })))
        }));
        types
    }

    #[test]
    fn test_invoke_runs_operation() {
        let invoker = DynamicInvoker::new(registry());
        let counter = invoker.construct("test.Counter", "create", &[]).unwrap();

        invoker.invoke(&*counter, "add", &[Value::Int(2)]).unwrap();
        invoker.invoke(&*counter, "add", &[Value::Int(3)]).unwrap();

        assert_eq!(invoker.invoke(&*counter, "get", &[]).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_missing_operation_is_absent() {
        let invoker = DynamicInvoker::new(registry());
        let counter = invoker.construct("test.Counter", "create", &[]).unwrap();

        let err = invoker.invoke(&*counter, "reset", &[]).unwrap_err();
        assert!(err.is_absent());
        assert!(matches!(err, InvocationError::NoSuchOperation { .. }));
    }

    #[test]
    fn test_wrong_argument_shape() {
        let invoker = DynamicInvoker::new(registry());
        let counter = invoker.construct("test.Counter", "create", &[]).unwrap();

        let err = invoker.invoke(&*counter, "add", &[Value::from("two")]).unwrap_err();
        assert!(matches!(err, InvocationError::InvalidArgument { .. }));
        assert!(!err.is_absent());
    }

    #[test]
    fn test_unknown_types_and_static_operations() {
        let invoker = DynamicInvoker::new(registry());

        let missing = invoker.invoke_static("test.Missing", "create", &[]);
        assert!(matches!(missing, Err(InvocationError::TypeNotFound(name)) if name == "test.Missing"));

        let no_op = invoker.invoke_static("test.Counter", "standard", &[]);
        assert!(matches!(no_op, Err(InvocationError::NoSuchStaticOperation { .. })));
    }

    #[test]
    fn test_declared_assignability() {
        let types = registry();
        types.declare_assignable("test.Counter", "test.Countable");
        let invoker = DynamicInvoker::new(types);
        let counter = invoker.construct("test.Counter", "create", &[]).unwrap();

        assert!(invoker.is_assignable(&*counter, "test.Countable"));
        assert!(invoker.is_assignable(&*counter, "test.Counter"));
        assert!(!invoker.is_assignable(&*counter, "test.Other"));
    }
}
