/// Parent delegation and requester-context initialization.
use ferrous_ioc::{Container, Initialize, Initializer, Instance, Resolver, ResolverExt};
use parking_lot::Mutex;
use std::sync::Arc;

trait Service1: Send + Sync {
    fn get_message(&self) -> String;
}

struct Message(&'static str);

impl Service1 for Message {
    fn get_message(&self) -> String {
        self.0.to_string()
    }
}

struct Y;
struct Z;

#[test]
fn test_child_falls_back_to_parent() {
    let parent = Container::new();
    let y = Arc::new(Y);
    parent.add_singleton(y.clone()).unwrap();

    let child = Container::new();
    child.set_parent(Some(parent.as_resolver()));

    let resolved = child.get_required::<Arc<Y>>();
    assert!(Arc::ptr_eq(&resolved, &y));
}

#[test]
fn test_child_binding_shadows_parent() {
    let parent = Container::new();
    parent.add_singleton::<Arc<dyn Service1>>(Arc::new(Message("parent"))).unwrap();

    let child = Container::new();
    child.add_singleton::<Arc<dyn Service1>>(Arc::new(Message("child"))).unwrap();
    child.set_parent(Some(parent.as_resolver()));

    assert_eq!(child.get_required::<Arc<dyn Service1>>().get_message(), "child");
    assert_eq!(parent.get_required::<Arc<dyn Service1>>().get_message(), "parent");
}

#[test]
fn test_resolver_identity_is_not_delegated() {
    let parent = Container::new();
    let child = Container::new();
    child.set_parent(Some(parent.as_resolver()));

    // Every container binds itself, so the chain stops at the child.
    let resolver = child.get_required::<Arc<dyn Resolver>>();
    assert_eq!(resolver.instance_id(), child.instance_id());
}

#[test]
fn test_set_parent_none_keeps_existing() {
    let parent = Container::new();
    parent.add_singleton(Arc::new(Y)).unwrap();

    let child = Container::new();
    child.set_parent(Some(parent.as_resolver()));
    child.set_parent(None);

    assert!(child.get_service::<Arc<Y>>().is_some());
}

#[test]
fn test_second_parent_is_appended_to_chain() {
    let first = Container::new();
    first.add_singleton(Arc::new(Y)).unwrap();
    let second = Container::new();
    second.add_singleton(Arc::new(Z)).unwrap();

    let child = Container::new();
    child.set_parent(Some(first.as_resolver()));
    child.set_parent(Some(second.as_resolver()));

    assert!(child.get_service::<Arc<Y>>().is_some());
    assert!(child.get_service::<Arc<Z>>().is_some());
    // The second parent was threaded in behind the first.
    assert!(first.get_service::<Arc<Z>>().is_some());
    assert!(second.get_service::<Arc<Y>>().is_none());
}

#[test]
fn test_same_parent_twice_and_self_are_ignored() {
    let parent = Container::new();
    parent.add_singleton(Arc::new(Y)).unwrap();

    let child = Container::new();
    child.set_parent(Some(parent.as_resolver()));
    child.set_parent(Some(parent.as_resolver()));
    child.set_parent(Some(Arc::new(parent.clone())));
    child.set_parent(Some(child.as_resolver()));

    assert!(child.get_service::<Arc<Y>>().is_some());
    // Nothing was forwarded into the parent.
    assert!(parent.get_service::<Arc<Z>>().is_none());
    parent.set_parent(Some(parent.as_resolver()));
    assert!(parent.get_service::<Arc<Y>>().is_some());
}

#[test]
fn test_parent_outlives_callers_handle() {
    let child = Container::new();
    {
        let parent = Container::new();
        parent.add_singleton(Arc::new(Y)).unwrap();
        child.set_parent(Some(parent.as_resolver()));
    }
    // The chain holds the parent now.
    assert!(child.get_service::<Arc<Y>>().is_some());
}

#[test]
fn test_parent_appended_behind_unreferenced_parent() {
    let child = Container::new();
    child.set_parent(Some(Container::new().as_resolver()));

    let second = Container::new();
    second.add_singleton(Arc::new(Z)).unwrap();
    child.set_parent(Some(second.as_resolver()));

    assert!(child.get_service::<Arc<Z>>().is_some());
}

#[test]
fn test_resolved_self_handle_is_retained_as_parent() {
    let child = Container::new();
    {
        let parent = Container::new();
        parent.add_singleton(Arc::new(Y)).unwrap();
        let handle = parent.get_required::<Arc<dyn Resolver>>();
        child.set_parent(Some(handle));
    }
    assert!(child.get_service::<Arc<Y>>().is_some());
}

#[test]
fn test_detached_handle_is_not_set_as_parent() {
    let detached = {
        let gone = Container::new();
        gone.get_required::<Arc<dyn Resolver>>()
    };
    assert!(detached.is_detached());

    let child = Container::new();
    child.set_parent(Some(detached));

    let live = Container::new();
    live.add_singleton(Arc::new(Z)).unwrap();
    child.set_parent(Some(live.as_resolver()));
    assert!(child.get_service::<Arc<Z>>().is_some());
}

#[derive(Default)]
struct Reporter {
    message: Mutex<Option<String>>,
}

impl Initialize for Reporter {
    fn initializer(self: Arc<Self>) -> Initializer {
        Initializer::new(move |source: Arc<dyn Service1>| {
            *self.message.lock() = Some(source.get_message());
        })
    }
}

#[test]
fn test_parent_singleton_initializes_against_requesting_child() {
    let parent = Container::new();
    parent
        .add_overridable_singleton::<Arc<dyn Service1>>(Arc::new(Message("parent default")))
        .unwrap();
    parent
        .add_instance(Instance::with_initializer(Arc::new(Reporter::default()), |r| r))
        .unwrap();

    let child = Container::new();
    child.add_singleton::<Arc<dyn Service1>>(Arc::new(Message("child override"))).unwrap();
    child.set_parent(Some(parent.as_resolver()));

    let reporter = child.get_required::<Arc<Reporter>>();
    assert_eq!(reporter.message.lock().as_deref(), Some("child override"));

    // Initialized once; the parent sees the same state.
    let from_parent = parent.get_required::<Arc<Reporter>>();
    assert!(Arc::ptr_eq(&reporter, &from_parent));
    assert_eq!(from_parent.message.lock().as_deref(), Some("child override"));
}
