//! End-to-end auto-configuration against the in-memory SDK doubles.

use cirrus_testing::{RecordingBuilder, RecordingClient, register_v1_sdk, register_v2_sdk, v1_builder};
use cirrus_aws::{
    APACHE_HTTP_CLIENT, AutoConfigureError, AwsAutoConfiguration, ClientSelection, DynamicObject,
    FunctionType, NETTY_HTTP_CLIENT, RegistrationMode, RegistrationReport, SkipReason, TypeRegistry,
    Value,
};
use cirrus_config::{ConfigManager, FileFormat};
use cirrus_container::{Bean, BeanRegistry, Container, get_bean_as};
use std::sync::Arc;
use std::time::Duration;

const S3: &str = "com.amazonaws.services.s3.AmazonS3";
const S3_ENCRYPTION: &str = "com.amazonaws.services.s3.AmazonS3EncryptionV2";
const SQS: &str = "com.amazonaws.services.sqs.AmazonSQS";
const SNS: &str = "com.amazonaws.services.sns.AmazonSNS";
const DYNAMODB: &str = "com.amazonaws.services.dynamodbv2.AmazonDynamoDB";
const MATERIALS: &str = "com.amazonaws.services.s3.model.EncryptionMaterialsProvider";

const S3_V2: &str = "software.amazon.awssdk.services.s3.S3Client";
const SQS_V2: &str = "software.amazon.awssdk.services.sqs.SqsClient";
const SQS_V2_ASYNC: &str = "software.amazon.awssdk.services.sqs.SqsAsyncClient";

const BASE_PROPERTIES: &str = "
aws.default.client.socket-timeout=123
aws.default.region=us-east-1
aws.sqs.region=eu-central-1
aws.dynamodbv2.client.socket-timeout=456
";

fn v1_types() -> TypeRegistry {
    let types = TypeRegistry::new();
    register_v1_sdk(
        &types,
        &[
            (S3, "s3"),
            (S3_ENCRYPTION, "s3"),
            (SQS, "sqs"),
            (SNS, "sns"),
            (DYNAMODB, "dynamodb"),
        ],
    );
    types
}

fn config(properties: &str) -> ConfigManager {
    let config = ConfigManager::new();
    config.load_str(properties, FileFormat::Properties).unwrap();
    config
}

fn run_v1(
    properties: &str,
    clients: &[&str],
    mode: RegistrationMode,
    container: &Container,
) -> RegistrationReport {
    AwsAutoConfiguration::v1(ClientSelection::explicit(clients.iter().copied()))
        .with_mode(mode)
        .apply(&config(properties), v1_types(), container)
        .unwrap()
}

fn client(container: &Container, name: &str) -> Arc<RecordingClient> {
    get_bean_as::<RecordingClient>(container, name).unwrap()
}

fn nested_builder(value: Option<Value>) -> Arc<RecordingBuilder> {
    value.and_then(|value| value.downcast::<RecordingBuilder>()).unwrap()
}

fn nested_product(value: Option<Value>) -> Arc<RecordingClient> {
    value.and_then(|value| value.downcast::<RecordingClient>()).unwrap()
}

#[test]
fn test_three_clients_with_service_specific_region() {
    let container = Container::new();
    let report = run_v1(BASE_PROPERTIES, &[S3, SQS, SNS], RegistrationMode::Eager, &container);

    assert_eq!(report.registered.len(), 3);
    assert!(report.skipped.is_empty());
    assert_eq!(container.bean_names().len(), 3);

    assert_eq!(
        client(&container, SQS).endpoint().as_deref(),
        Some("https://sqs.eu-central-1.amazonaws.com")
    );
    assert_eq!(client(&container, S3).endpoint().as_deref(), Some("https://s3.amazonaws.com"));
    assert_eq!(
        client(&container, SNS).endpoint().as_deref(),
        Some("https://sns.us-east-1.amazonaws.com")
    );
}

#[test]
fn test_client_tuning_falls_back_per_field() {
    let container = Container::new();
    run_v1(BASE_PROPERTIES, &[SQS, DYNAMODB], RegistrationMode::Eager, &container);

    let sqs_config = nested_builder(client(&container, SQS).last_arg("setClientConfiguration"));
    let dynamo_config = nested_builder(client(&container, DYNAMODB).last_arg("setClientConfiguration"));

    assert_eq!(sqs_config.last_arg("setSocketTimeout"), Some(Value::Int(123)));
    assert_eq!(dynamo_config.last_arg("setSocketTimeout"), Some(Value::Int(456)));
    assert!(!dynamo_config.was_called("setConnectionTimeout"));
    assert_eq!(
        client(&container, DYNAMODB).endpoint().as_deref(),
        Some("https://dynamodb.us-east-1.amazonaws.com")
    );
}

#[test]
fn test_durations_accept_units() {
    let container = Container::new();
    run_v1(
        "aws.default.client.socket-timeout=15s\naws.default.region=us-east-1",
        &[SNS],
        RegistrationMode::Eager,
        &container,
    );

    let config = nested_builder(client(&container, SNS).last_arg("setClientConfiguration"));
    assert_eq!(config.last_arg("setSocketTimeout"), Some(Value::Int(15_000)));
}

#[test]
fn test_endpoint_excludes_region() {
    let container = Container::new();
    let properties = format!(
        "{}\naws.sqs.endpoint.service-endpoint=http://localhost:4576\naws.sqs.endpoint.signing-region=us-east-1",
        BASE_PROPERTIES
    );
    run_v1(&properties, &[SQS], RegistrationMode::Eager, &container);

    let sqs = client(&container, SQS);
    assert!(sqs.calls_to("setRegion").is_empty());
    assert_eq!(
        sqs.calls_to("setEndpointConfiguration"),
        vec![vec![Value::from("http://localhost:4576"), Value::from("us-east-1")]]
    );
}

#[test]
fn test_existing_bean_is_left_alone() {
    let container = Container::new();
    let mine: Bean = Arc::new(String::from("user supplied"));
    container.register_singleton(SQS, mine.clone()).unwrap();

    let report = run_v1(BASE_PROPERTIES, &[S3, SQS], RegistrationMode::Eager, &container);

    assert_eq!(report.skip_reason(SQS), Some(&SkipReason::AlreadyRegistered));
    assert!(report.is_registered(S3));
    assert!(Arc::ptr_eq(&container.get_bean(SQS).unwrap(), &mine));
}

#[test]
fn test_disabling_one_client_removes_only_that_bean() {
    for mode in [RegistrationMode::Lazy, RegistrationMode::Eager] {
        let container = Container::new();
        let properties = format!("{}\naws.sns.enabled=false", BASE_PROPERTIES);
        let report = run_v1(&properties, &[S3, SQS, SNS], mode, &container);

        assert_eq!(report.skip_reason(SNS), Some(&SkipReason::Disabled), "{mode:?}");
        assert!(!container.contains_bean_definition(SNS));
        assert!(container.contains_bean_definition(S3));
        assert!(container.contains_bean_definition(SQS));
    }
}

#[test]
fn test_encryption_client_requires_materials() {
    let container = Container::new();
    let report = run_v1(BASE_PROPERTIES, &[S3_ENCRYPTION], RegistrationMode::Eager, &container);
    assert_eq!(
        report.skip_reason(S3_ENCRYPTION),
        Some(&SkipReason::MissingCollaborator(MATERIALS.to_string()))
    );
    assert!(!container.contains_bean_definition(S3_ENCRYPTION));

    let container = Container::new();
    let materials: Bean = Arc::new(String::from("kms materials"));
    container.register_singleton(MATERIALS, materials.clone()).unwrap();

    let report = run_v1(BASE_PROPERTIES, &[S3_ENCRYPTION], RegistrationMode::Eager, &container);
    assert!(report.is_registered(S3_ENCRYPTION));
    assert_eq!(
        client(&container, S3_ENCRYPTION).last_arg("setEncryptionMaterials"),
        Some(Value::Bean(materials))
    );
}

#[test]
fn test_storage_flags_only_reach_storage_builders() {
    let container = Container::new();
    let properties = format!(
        "{}\naws.s3.path-style-access-enabled=true\naws.s3.chunked-encoding-disabled=true",
        BASE_PROPERTIES
    );
    run_v1(&properties, &[S3, SQS], RegistrationMode::Eager, &container);

    let s3 = client(&container, S3);
    assert_eq!(s3.last_arg("setPathStyleAccessEnabled"), Some(Value::Bool(true)));
    assert_eq!(s3.last_arg("setChunkedEncodingDisabled"), Some(Value::Bool(true)));
    assert!(s3.calls_to("setAccelerateModeEnabled").is_empty());
    assert!(client(&container, SQS).calls_to("setPathStyleAccessEnabled").is_empty());
}

#[test]
fn test_referenced_beans_are_resolved() {
    let container = Container::new();
    let credentials: Bean = Arc::new(String::from("static credentials"));
    let handler: Bean = Arc::new(String::from("tracing handler"));
    container.register_singleton("appCredentials", credentials.clone()).unwrap();
    container.register_singleton("tracingHandler", handler.clone()).unwrap();

    let properties = format!(
        "{}\naws.default.credentials-provider-bean-name=appCredentials\n\
         aws.sqs.request-handler-bean-names=tracingHandler,missingHandler",
        BASE_PROPERTIES
    );
    run_v1(&properties, &[SQS, SNS], RegistrationMode::Eager, &container);

    let sqs = client(&container, SQS);
    assert_eq!(sqs.last_arg("setCredentials"), Some(Value::Bean(credentials.clone())));
    assert_eq!(
        sqs.last_arg("setRequestHandlers"),
        Some(Value::List(vec![Value::Bean(handler)]))
    );

    let sns = client(&container, SNS);
    assert_eq!(sns.last_arg("setCredentials"), Some(Value::Bean(credentials)));
    assert!(sns.calls_to("setRequestHandlers").is_empty());
}

#[test]
fn test_missing_referenced_bean_is_skipped() {
    let container = Container::new();
    let properties = format!("{}\naws.sqs.credentials-provider-bean-name=nowhere", BASE_PROPERTIES);
    let report = run_v1(&properties, &[SQS], RegistrationMode::Eager, &container);

    assert!(report.is_registered(SQS));
    assert!(client(&container, SQS).calls_to("setCredentials").is_empty());
}

#[test]
fn test_missing_sdk_module_is_skipped() {
    let container = Container::new();
    let kinesis = "com.amazonaws.services.kinesis.AmazonKinesis";
    let report = run_v1(BASE_PROPERTIES, &[kinesis, SQS], RegistrationMode::Eager, &container);

    assert!(matches!(report.skip_reason(kinesis), Some(SkipReason::TypeNotFound(_))));
    assert!(report.is_registered(SQS));
}

#[test]
fn test_failing_setter_does_not_stop_bootstrap() {
    let types = v1_types();
    types.register(
        FunctionType::new(format!("{SQS}ClientBuilder")).with_operation("standard", |_| {
            Ok(Value::Object(Arc::new(v1_builder(SQS, "sqs").failing_on("setRegion"))))
        }),
    );

    let container = Container::new();
    let report = AwsAutoConfiguration::v1(ClientSelection::explicit([SQS]))
        .with_mode(RegistrationMode::Eager)
        .apply(&config(BASE_PROPERTIES), types, &container)
        .unwrap();

    assert!(report.is_registered(SQS));
}

#[test]
fn test_failing_build_is_fatal() {
    let types = v1_types();
    types.register(
        FunctionType::new(format!("{SQS}ClientBuilder")).with_operation("standard", |_| {
            Ok(Value::Object(Arc::new(v1_builder(SQS, "sqs").failing_on("build"))))
        }),
    );

    let container = Container::new();
    let err = AwsAutoConfiguration::v1(ClientSelection::explicit([SQS]))
        .with_mode(RegistrationMode::Eager)
        .apply(&config(BASE_PROPERTIES), types, &container)
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, AutoConfigureError::Invocation { .. }));
    assert!(!container.contains_bean_definition(SQS));
}

#[test]
fn test_malformed_client_name_is_fatal() {
    let types = v1_types();
    types.register(
        FunctionType::new("org.example.WidgetClientBuilder")
            .with_operation("standard", |_| Ok(Value::Object(Arc::new(RecordingBuilder::new("w"))))),
    );

    let err = AwsAutoConfiguration::v1(ClientSelection::explicit(["org.example.Widget"]))
        .apply(&config(BASE_PROPERTIES), types, &Container::new())
        .unwrap_err();

    assert!(matches!(err, AutoConfigureError::MalformedTypeName(_)));
}

#[test]
fn test_lazy_clients_build_on_lookup_and_close_on_shutdown() {
    let container = Container::new();
    let report = run_v1(BASE_PROPERTIES, &[SQS], RegistrationMode::Lazy, &container);

    assert!(report.is_registered(SQS));
    assert!(!container.is_instantiated(SQS));

    let sqs = client(&container, SQS);
    assert!(container.is_instantiated(SQS));
    assert!(Arc::ptr_eq(&sqs, &client(&container, SQS)));
    assert!(!sqs.is_closed());

    container.destroy_singletons();
    assert!(sqs.is_closed());
}

#[test]
fn test_eager_clients_close_on_shutdown() {
    let container = Container::new();
    run_v1(BASE_PROPERTIES, &[SNS], RegistrationMode::Eager, &container);

    let sns = client(&container, SNS);
    container.destroy_singletons();
    assert!(sns.is_closed());
}

fn v2_types() -> TypeRegistry {
    let types = TypeRegistry::new();
    register_v2_sdk(&types, &[(S3_V2, "s3"), (SQS_V2, "sqs"), (SQS_V2_ASYNC, "sqs")]);
    types
}

const V2_PROPERTIES: &str = "
aws2.default.region=us-east-1
aws2.default-async.region=us-west-2
aws2.default.client.request-timeout=5s
aws2.default.apache-http-client-builder.max-connections=25
aws2.default.apache-http-client-builder.socket-timeout=15s
aws2.default.apache-http-client-builder.proxy-configuration.endpoint=http://proxy:8080
aws2.default.netty-nio-async-http-client-builder.max-concurrency=64
aws2.s3.path-style-access-enabled=true
";

fn run_v2(properties: &str, container: &Container) -> RegistrationReport {
    AwsAutoConfiguration::v2(ClientSelection::explicit([S3_V2, SQS_V2, SQS_V2_ASYNC]))
        .with_mode(RegistrationMode::Eager)
        .apply(&config(properties), v2_types(), container)
        .unwrap()
}

#[test]
fn test_v2_default_async_region() {
    let container = Container::new();
    let report = run_v2(V2_PROPERTIES, &container);

    assert_eq!(report.registered.len(), 3);
    assert_eq!(client(&container, SQS_V2_ASYNC).region().as_deref(), Some("us-west-2"));
    assert_eq!(client(&container, SQS_V2).region().as_deref(), Some("us-east-1"));
}

#[test]
fn test_v2_transport_follows_builder_capability() {
    let container = Container::new();
    run_v2(V2_PROPERTIES, &container);

    let sync_transport = nested_builder(client(&container, SQS_V2).last_arg("httpClientBuilder"));
    assert_eq!(sync_transport.type_name(), APACHE_HTTP_CLIENT);
    assert_eq!(sync_transport.last_arg("maxConnections"), Some(Value::Int(25)));
    assert_eq!(
        sync_transport.last_arg("socketTimeout"),
        Some(Value::Duration(Duration::from_secs(15)))
    );
    let proxy = nested_product(sync_transport.last_arg("proxyConfiguration"));
    assert_eq!(proxy.last_arg("endpoint"), Some(Value::from("http://proxy:8080")));

    let async_transport = nested_builder(client(&container, SQS_V2_ASYNC).last_arg("httpClientBuilder"));
    assert_eq!(async_transport.type_name(), NETTY_HTTP_CLIENT);
    assert_eq!(async_transport.last_arg("maxConcurrency"), Some(Value::Int(64)));
    assert!(!async_transport.was_called("maxConnections"));
}

#[test]
fn test_v2_named_transport_bean_wins() {
    let container = Container::new();
    let shared: Bean = Arc::new(String::from("shared http client"));
    container.register_singleton("sharedHttp", shared.clone()).unwrap();

    run_v2(
        &format!("{}\naws2.s3.http-client-bean-name=sharedHttp", V2_PROPERTIES),
        &container,
    );

    let s3 = client(&container, S3_V2);
    assert_eq!(s3.last_arg("httpClient"), Some(Value::Bean(shared)));
    assert!(s3.calls_to("httpClientBuilder").is_empty());
}

#[test]
fn test_v2_override_configuration() {
    let container = Container::new();
    let custom: Bean = Arc::new(String::from("custom override"));
    container.register_singleton("customOverride", custom.clone()).unwrap();

    run_v2(
        &format!("{}\naws2.sqs.client-override-configuration-bean-name=customOverride", V2_PROPERTIES),
        &container,
    );

    let s3_override = nested_product(client(&container, S3_V2).last_arg("overrideConfiguration"));
    assert_eq!(
        s3_override.last_arg("apiCallAttemptTimeout"),
        Some(Value::Duration(Duration::from_secs(5)))
    );

    let sqs = client(&container, SQS_V2);
    assert_eq!(sqs.calls_to("overrideConfiguration").len(), 2);
    assert_eq!(sqs.last_arg("overrideConfiguration"), Some(Value::Bean(custom)));
}

#[test]
fn test_v2_storage_configuration() {
    let container = Container::new();
    run_v2(V2_PROPERTIES, &container);

    let storage = nested_product(client(&container, S3_V2).last_arg("serviceConfiguration"));
    assert_eq!(storage.last_arg("pathStyleAccessEnabled"), Some(Value::Bool(true)));
    assert!(storage.calls_to("dualstackEnabled").is_empty());
    assert!(client(&container, SQS_V2).calls_to("serviceConfiguration").is_empty());
}
