use cirrus_container::{Bean, BeanDefinition, BeanRegistry, Container, ContainerError, get_bean_as};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct TestService {
    name: String,
}

fn service(name: &str) -> Bean {
    Arc::new(TestService {
        name: name.to_string(),
    })
}

#[test]
fn test_register_and_resolve_singleton() {
    let container = Container::new();
    container.register_singleton("svc", service("test")).unwrap();

    let resolved = get_bean_as::<TestService>(&container, "svc").unwrap();
    assert_eq!(resolved.name, "test");
}

#[test]
fn test_resolve_nonexistent() {
    let container = Container::new();
    let result = container.get_bean("missing");

    assert!(matches!(result, Err(ContainerError::BeanNotFound(name)) if name == "missing"));
}

#[test]
fn test_contains_covers_definitions_and_singletons() {
    let container = Container::new();
    assert!(!container.contains_bean_definition("eager"));
    assert!(!container.contains_bean_definition("lazy"));

    container.register_singleton("eager", service("eager")).unwrap();
    container
        .register_bean_definition("lazy", BeanDefinition::new("TestService", |_| Ok(service("lazy"))))
        .unwrap();

    assert!(container.contains_bean_definition("eager"));
    assert!(container.contains_bean_definition("lazy"));
    assert!(!container.is_instantiated("lazy"));
}

#[test]
fn test_duplicate_names_are_rejected() {
    let container = Container::new();
    container.register_singleton("svc", service("first")).unwrap();

    let again = container.register_singleton("svc", service("second"));
    assert!(matches!(again, Err(ContainerError::DuplicateBean(_))));

    let definition = container.register_bean_definition(
        "svc",
        BeanDefinition::new("TestService", |_| Ok(service("third"))),
    );
    assert!(matches!(definition, Err(ContainerError::DuplicateBean(_))));

    let resolved = get_bean_as::<TestService>(&container, "svc").unwrap();
    assert_eq!(resolved.name, "first");
}

#[test]
fn test_singleton_identity_is_preserved() {
    let container = Container::new();
    let original = Arc::new(TestService {
        name: "original".to_string(),
    });
    container.register_singleton("svc", original.clone()).unwrap();

    let resolved = get_bean_as::<TestService>(&container, "svc").unwrap();
    assert!(Arc::ptr_eq(&original, &resolved));
}

#[test]
fn test_factory_resolves_collaborators() {
    let container = Container::new();
    container.register_singleton("prefix", Arc::new(String::from("hello"))).unwrap();
    container
        .register_bean_definition(
            "greeter",
            BeanDefinition::new("TestService", |registry| {
                let prefix = get_bean_as::<String>(registry, "prefix")?;
                Ok(service(&format!("{prefix} world")))
            }),
        )
        .unwrap();

    let greeter = get_bean_as::<TestService>(&container, "greeter").unwrap();
    assert_eq!(greeter.name, "hello world");
}

#[test]
fn test_type_mismatch() {
    let container = Container::new();
    container.register_singleton("svc", service("test")).unwrap();

    let result = get_bean_as::<String>(&container, "svc");
    assert!(matches!(result, Err(ContainerError::TypeMismatch { .. })));
}

#[test]
fn test_bean_names_follow_registration_order() {
    let container = Container::new();
    container.register_singleton("b", service("b")).unwrap();
    container
        .register_bean_definition("a", BeanDefinition::new("TestService", |_| Ok(service("a"))))
        .unwrap();
    container.register_singleton("c", service("c")).unwrap();

    assert_eq!(container.bean_names(), vec!["b", "a", "c"]);
    assert_eq!(container.definition_type("a").as_deref(), Some("TestService"));
    assert_eq!(container.definition_type("b"), None);
}

#[test]
fn test_destroy_runs_disposers_in_reverse() {
    let container = Container::new();
    let order = Arc::new(support::Log::default());

    for name in ["first", "second"] {
        container.register_singleton(name, service(name)).unwrap();
        let log = order.clone();
        container.register_disposer(name, Box::new(move || log.push(name)));
    }

    container.destroy_singletons();

    assert_eq!(order.entries(), vec!["second", "first"]);
    assert!(!container.is_instantiated("first"));
}

#[test]
fn test_destroyed_definitions_can_be_recreated() {
    let container = Container::new();
    let created = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicBool::new(false));
    let counter = created.clone();
    let flag = closed.clone();

    container
        .register_bean_definition(
            "svc",
            BeanDefinition::new("TestService", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(service("lazy"))
            }),
        )
        .unwrap();
    container.get_bean("svc").unwrap();
    container.register_disposer("svc", Box::new(move || flag.store(true, Ordering::SeqCst)));

    container.destroy_singletons();
    assert!(closed.load(Ordering::SeqCst));

    container.get_bean("svc").unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_first_lookup_shares_one_instance() {
    let container = Container::new();
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();

    container
        .register_bean_definition(
            "slow",
            BeanDefinition::new("TestService", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(200));
                Ok(service("slow"))
            }),
        )
        .unwrap();

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let container = container.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50 * i));
                get_bean_as::<TestService>(&container, "slow")
            })
        })
        .collect();
    let beans: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    assert!(Arc::ptr_eq(&beans[0], &beans[1]));
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

mod support {
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct Log(Mutex<Vec<&'static str>>);

    impl Log {
        pub fn push(&self, entry: &'static str) {
            self.0.lock().unwrap().push(entry);
        }

        pub fn entries(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }
}
