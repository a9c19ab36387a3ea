/// Observer hooks and container options.
use ferrous_ioc::{
    Container, ContainerObserver, ContainerOptions, DiError, InsertOutcome, Initialize, Initializer, Instance,
    Lifetime, ResolverExt, ServiceKey,
};
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl ContainerObserver for Recorder {
    fn registered(&self, key: &ServiceKey, lifetime: Lifetime, outcome: InsertOutcome) {
        self.events.lock().push(format!("registered {} {lifetime} {outcome:?}", short(key)));
    }

    fn resolving(&self, key: &ServiceKey, lifetime: Lifetime) {
        self.events.lock().push(format!("resolving {} {lifetime}", short(key)));
    }

    fn resolved(&self, key: &ServiceKey, lifetime: Lifetime, _elapsed: Duration) {
        self.events.lock().push(format!("resolved {} {lifetime}", short(key)));
    }

    fn initialization_failed(&self, key: &ServiceKey, initializer: &'static str, error: &DiError) {
        let cause = match error {
            DiError::UnsatisfiedDependency(_) => "unsatisfied",
            _ => "other",
        };
        self.events
            .lock()
            .push(format!("failed {} {initializer} {cause}", short(key)));
    }
}

fn short(key: &ServiceKey) -> &'static str {
    let name = key.name().trim_end_matches('>');
    name.rsplit(['<', ':']).next().unwrap_or(name)
}

struct Needy;
struct Absent;

impl Initialize for Needy {
    fn initializer(self: Arc<Self>) -> Initializer {
        Initializer::new(|_a: Arc<Absent>| {})
    }
}

#[test]
fn test_observer_sees_lifecycle_events() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container.add_observer(recorder.clone());

    container.add_singleton(Arc::new(1u8)).unwrap();
    container.add_singleton(Arc::new(2u8)).unwrap();
    container.add_instance(Instance::with_initializer(Arc::new(Needy), |n| n)).unwrap();
    container.get_required::<Arc<u8>>();
    container.get_required::<Arc<Needy>>();
    container.get_required::<Arc<Needy>>();

    let events = recorder.events.lock().clone();
    assert_eq!(
        events,
        vec![
            "registered u8 singleton Inserted",
            "registered u8 singleton Kept",
            "registered Needy singleton Inserted",
            "resolving u8 singleton",
            "resolved u8 singleton",
            "resolving Needy singleton",
            "failed Needy initialize unsatisfied",
            "resolved Needy singleton",
            "resolving Needy singleton",
            "resolved Needy singleton",
        ]
    );
}

#[test]
fn test_trace_resolution_emits_events() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferrous_ioc=trace")
        .with_test_writer()
        .try_init();

    let container = Container::with_options(ContainerOptions::new().with_name("traced").with_trace_resolution(true));
    container.add_transient(|| Arc::new(3u16)).unwrap();
    assert_eq!(*container.get_required::<Arc<u16>>(), 3);
    assert!(format!("{container:?}").contains("observers: 1"));
}

#[test]
#[serial]
fn test_options_from_env() {
    std::env::set_var("FERROUS_IOC_NAME", "from-env");
    std::env::set_var("FERROUS_IOC_DEBUG", "true");
    let options = ContainerOptions::from_env();
    assert_eq!(options.label(), "from-env");
    assert!(options.trace_resolution);

    std::env::remove_var("FERROUS_IOC_NAME");
    std::env::set_var("FERROUS_IOC_DEBUG", "0");
    let options = ContainerOptions::from_env();
    assert_eq!(options.label(), "ioc");
    assert!(!options.trace_resolution);
    std::env::remove_var("FERROUS_IOC_DEBUG");
}

#[cfg(feature = "config")]
#[test]
fn test_options_deserialize() {
    let options: ContainerOptions = serde_json::from_str(r#"{"name": "api"}"#).unwrap();
    assert_eq!(options.label(), "api");
    assert!(!options.trace_resolution);
}

#[cfg(feature = "diagnostics")]
#[test]
fn test_debug_string_lists_bindings() {
    let container = Container::with_options(ContainerOptions::new().with_name("dump"));
    container.add_singleton(Arc::new(1u8)).unwrap();
    container.add_transient(|| Arc::new(2u16)).unwrap();

    let dump = container.to_debug_string();
    assert!(dump.starts_with("container 'dump' (3 bindings, parent: no)"));
    assert!(dump.contains("transient"));
    assert!(dump.contains("Resolver"));
}
