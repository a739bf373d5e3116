//! # Cirrus Testing
//!
//! In-memory SDK doubles for exercising Cirrus without a real SDK.
//!
//! [`RecordingBuilder`] accepts a configurable set of operations and records
//! every call; building it yields a [`RecordingClient`] that carries the
//! recorded calls. [`register_v1_sdk`] and [`register_v2_sdk`] populate a
//! [`TypeRegistry`] with builders shaped like the respective SDK generation.

use cirrus_aws::generation::{v1, v2};
use cirrus_aws::{
    APACHE_HTTP_CLIENT, APACHE_PROXY_CONFIGURATION, DynamicObject, FunctionType, InvocationError,
    NETTY_HTTP_CLIENT, SdkGeneration, SdkV1, SdkV2, TypeRegistry, Value,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One recorded operation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: String,
    pub args: Vec<Value>,
}

fn calls_to(calls: &[Call], operation: &str) -> Vec<Vec<Value>> {
    calls
        .iter()
        .filter(|call| call.operation == operation)
        .map(|call| call.args.clone())
        .collect()
}

fn last_arg(calls: &[Call], operations: &[&str]) -> Option<Value> {
    calls
        .iter()
        .rev()
        .find(|call| operations.contains(&call.operation.as_str()))
        .and_then(|call| call.args.first().cloned())
}

/// Builder double that records calls.
pub struct RecordingBuilder {
    type_name: String,
    operations: Option<HashSet<String>>,
    interfaces: HashSet<String>,
    failing: HashSet<String>,
    product_type: String,
    service: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingBuilder {
    /// A builder accepting any operation.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            product_type: type_name.clone(),
            type_name,
            operations: None,
            interfaces: HashSet::new(),
            failing: HashSet::new(),
            service: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Restrict the builder to these operations.
    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations
            .get_or_insert_with(HashSet::new)
            .extend(operations.into_iter().map(Into::into));
        self
    }

    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    /// Make `operation` fail when called.
    pub fn failing_on(mut self, operation: impl Into<String>) -> Self {
        self.failing.insert(operation.into());
        self
    }

    /// What `build` produces: a client of `type_name` for `service`.
    pub fn producing(mut self, type_name: impl Into<String>, service: impl Into<String>) -> Self {
        self.product_type = type_name.into();
        self.service = Some(service.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<Vec<Value>> {
        calls_to(&self.calls.lock(), operation)
    }

    /// First argument of the last call to `operation`.
    pub fn last_arg(&self, operation: &str) -> Option<Value> {
        last_arg(&self.calls.lock(), &[operation])
    }

    pub fn was_called(&self, operation: &str) -> bool {
        self.calls.lock().iter().any(|call| call.operation == operation)
    }
}

impl DynamicObject for RecordingBuilder {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn has_operation(&self, operation: &str) -> bool {
        self.operations
            .as_ref()
            .is_none_or(|operations| operations.contains(operation))
    }

    fn implements(&self, interface: &str) -> bool {
        self.interfaces.contains(interface)
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, InvocationError> {
        self.calls.lock().push(Call {
            operation: operation.to_string(),
            args: args.to_vec(),
        });

        if self.failing.contains(operation) {
            return Err(InvocationError::failed(&self.type_name, operation, "simulated failure"));
        }

        if operation == "build" {
            let client = RecordingClient {
                type_name: self.product_type.clone(),
                service: self.service.clone(),
                calls: self.calls(),
                closed: AtomicBool::new(false),
            };
            return Ok(Value::Object(Arc::new(client)));
        }
        Ok(Value::Null)
    }
}

/// What a [`RecordingBuilder`] builds.
pub struct RecordingClient {
    type_name: String,
    service: Option<String>,
    calls: Vec<Call>,
    closed: AtomicBool,
}

impl RecordingClient {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Calls made on the builder before it was built.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn calls_to(&self, operation: &str) -> Vec<Vec<Value>> {
        calls_to(&self.calls, operation)
    }

    pub fn last_arg(&self, operation: &str) -> Option<Value> {
        last_arg(&self.calls, &[operation])
    }

    pub fn region(&self) -> Option<String> {
        last_arg(&self.calls, &["setRegion", "region"]).and_then(|value| value.as_str().map(str::to_string))
    }

    /// Explicit endpoint, or the regional endpoint of the service.
    pub fn endpoint(&self) -> Option<String> {
        if let Some(endpoint) = last_arg(&self.calls, &["setEndpointConfiguration", "endpointOverride"]) {
            return endpoint.as_str().map(str::to_string);
        }

        let service = self.service.as_deref()?;
        let region = self.region()?;
        if service == "s3" && region == "us-east-1" {
            Some("https://s3.amazonaws.com".to_string())
        } else {
            Some(format!("https://{}.{}.amazonaws.com", service, region))
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl DynamicObject for RecordingClient {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn has_operation(&self, operation: &str) -> bool {
        operation == "close"
    }

    fn invoke(&self, operation: &str, _args: &[Value]) -> Result<Value, InvocationError> {
        if operation != "close" {
            return Err(InvocationError::NoSuchOperation {
                type_name: self.type_name.clone(),
                operation: operation.to_string(),
            });
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(Value::Null)
    }
}

fn object(builder: RecordingBuilder) -> Value {
    Value::Object(Arc::new(builder))
}

/// A type whose static `operation` returns a fresh [`RecordingBuilder`]
/// accepting anything.
fn open_builder_type(type_name: &str, operation: &str) -> FunctionType {
    let name = type_name.to_string();
    FunctionType::new(type_name).with_operation(operation, move |_| Ok(object(RecordingBuilder::new(name.clone()))))
}

const V1_OPERATIONS: [&str; 6] = [
    "setRegion",
    "setEndpointConfiguration",
    "setClientConfiguration",
    "setCredentials",
    "setRequestHandlers",
    "build",
];

const V1_STORAGE_OPERATIONS: [&str; 6] = [
    "setPathStyleAccessEnabled",
    "setChunkedEncodingDisabled",
    "setAccelerateModeEnabled",
    "setPayloadSigningEnabled",
    "setDualstackEnabled",
    "setForceGlobalBucketAccessEnabled",
];

/// Builder shaped like a first-generation `<Client>ClientBuilder`.
pub fn v1_builder(client_type: &str, service: &str) -> RecordingBuilder {
    let mut builder = RecordingBuilder::new(SdkV1.builder_type_for(client_type))
        .with_operations(V1_OPERATIONS)
        .producing(client_type, service);

    if client_type.starts_with("com.amazonaws.services.s3.AmazonS3") {
        builder = builder
            .with_operations(V1_STORAGE_OPERATIONS)
            .implementing(v1::S3_BUILDER);
    }
    if client_type.starts_with(v1::S3_ENCRYPTION_CLIENT) {
        builder = builder.with_operations(["setEncryptionMaterials"]);
    }
    builder
}

/// Register first-generation builder types for `(client type, service)`
/// pairs, plus `ClientConfiguration`.
pub fn register_v1_sdk(types: &TypeRegistry, clients: &[(&str, &str)]) {
    types.register(open_builder_type(v1::CLIENT_CONFIGURATION, "new"));

    for &(client_type, service) in clients {
        let (client, service) = (client_type.to_string(), service.to_string());
        types.register(
            FunctionType::new(SdkV1.builder_type_for(client_type))
                .with_operation("standard", move |_| Ok(object(v1_builder(&client, &service)))),
        );
    }
}

const V2_OPERATIONS: [&str; 7] = [
    "region",
    "endpointOverride",
    "overrideConfiguration",
    "httpClient",
    "httpClientBuilder",
    "credentialsProvider",
    "build",
];

/// Builder shaped like a second-generation `<Client>Builder`.
pub fn v2_builder(client_type: &str, service: &str) -> RecordingBuilder {
    let is_async = client_type.ends_with("AsyncClient");
    let mut builder = RecordingBuilder::new(SdkV2.builder_type_for(client_type))
        .with_operations(V2_OPERATIONS)
        .implementing(if is_async {
            v2::ASYNC_CLIENT_BUILDER
        } else {
            v2::SYNC_CLIENT_BUILDER
        })
        .producing(client_type, service);

    if client_type.starts_with("software.amazon.awssdk.services.s3.") {
        builder = builder.with_operations(["serviceConfiguration"]);
    }
    builder
}

/// Register second-generation client types for `(client type, service)`
/// pairs, plus the nested configuration and transport builders.
pub fn register_v2_sdk(types: &TypeRegistry, clients: &[(&str, &str)]) {
    for nested in [
        v2::CLIENT_OVERRIDE_CONFIGURATION,
        v2::S3_CONFIGURATION,
        APACHE_HTTP_CLIENT,
        APACHE_PROXY_CONFIGURATION,
        NETTY_HTTP_CLIENT,
    ] {
        types.register(open_builder_type(nested, "builder"));
    }

    for &(client_type, service) in clients {
        let (client, service) = (client_type.to_string(), service.to_string());
        types.register(
            FunctionType::new(client_type)
                .with_operation("builder", move |_| Ok(object(v2_builder(&client, &service)))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_aws::DynamicInvoker;

    #[test]
    fn test_builder_records_and_builds() {
        let builder = RecordingBuilder::new("Builder")
            .with_operations(["region", "build"])
            .producing("Client", "sqs");

        assert!(builder.has_operation("region"));
        assert!(!builder.has_operation("endpointOverride"));

        builder.invoke("region", &[Value::from("eu-central-1")]).unwrap();
        let built = builder.invoke("build", &[]).unwrap();
        let client = built.downcast::<RecordingClient>().unwrap();

        assert_eq!(client.region().as_deref(), Some("eu-central-1"));
        assert_eq!(client.endpoint().as_deref(), Some("https://sqs.eu-central-1.amazonaws.com"));
        assert_eq!(builder.calls_to("region").len(), 1);
    }

    #[test]
    fn test_failing_operation() {
        let builder = RecordingBuilder::new("Builder").failing_on("region");
        let err = builder.invoke("region", &[Value::from("x")]).unwrap_err();
        assert!(matches!(err, InvocationError::Failed { .. }));
        assert!(builder.was_called("region"));
    }

    #[test]
    fn test_close_marks_client() {
        let client = RecordingBuilder::new("Builder")
            .invoke("build", &[])
            .unwrap()
            .downcast::<RecordingClient>()
            .unwrap();
        assert!(!client.is_closed());
        client.invoke("close", &[]).unwrap();
        assert!(client.is_closed());
    }

    #[test]
    fn test_registered_sdk_types() {
        let types = TypeRegistry::new();
        register_v1_sdk(&types, &[("com.amazonaws.services.s3.AmazonS3", "s3")]);
        register_v2_sdk(&types, &[("software.amazon.awssdk.services.sqs.SqsAsyncClient", "sqs")]);
        let invoker = DynamicInvoker::new(types);

        let s3 = invoker
            .construct("com.amazonaws.services.s3.AmazonS3ClientBuilder", "standard", &[])
            .unwrap();
        assert!(invoker.is_assignable(&*s3, v1::S3_BUILDER));

        let sqs = invoker
            .construct("software.amazon.awssdk.services.sqs.SqsAsyncClient", "builder", &[])
            .unwrap();
        assert!(invoker.is_assignable(&*sqs, v2::ASYNC_CLIENT_BUILDER));
        assert!(!sqs.has_operation("serviceConfiguration"));
    }
}
