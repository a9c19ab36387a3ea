/// Property-based tests for registration and resolution
///
/// These tests verify that override rules, lifetimes and parent delegation
/// hold regardless of the registration sequence.
use ferrous_ioc::{Container, InsertOutcome, Resolver, ResolverExt};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct ServiceA {
    value: String,
}

#[derive(Debug)]
struct ServiceB {
    id: u32,
}

// Property: the binding that stands is the last one registered while the
// standing binding allowed override.
proptest! {
    #[test]
    fn override_sequence_follows_first_writer_rule(
        registrations in prop::collection::vec((0u32..1000, any::<bool>()), 1..12)
    ) {
        let container = Container::new();
        let mut expected: Option<(u32, bool)> = None;

        for (id, can_override) in &registrations {
            let outcome = if *can_override {
                container.add_overridable_singleton(Arc::new(ServiceB { id: *id })).unwrap()
            } else {
                container.add_singleton(Arc::new(ServiceB { id: *id })).unwrap()
            };

            let predicted = match expected {
                None => InsertOutcome::Inserted,
                Some((_, true)) => InsertOutcome::Replaced,
                Some((_, false)) => InsertOutcome::Kept,
            };
            prop_assert_eq!(outcome, predicted);
            if predicted != InsertOutcome::Kept {
                expected = Some((*id, *can_override));
            }
        }

        let resolved = container.get_required::<Arc<ServiceB>>();
        prop_assert_eq!(resolved.id, expected.unwrap().0);
    }
}

proptest! {
    #[test]
    fn singleton_resolution_consistency(service_value in "\\PC{0,50}", resolutions in 1usize..20) {
        let container = Container::new();
        container.add_singleton(Arc::new(ServiceA { value: service_value.clone() })).unwrap();

        let first = container.get_required::<Arc<ServiceA>>();
        for _ in 0..resolutions {
            let again = container.get_required::<Arc<ServiceA>>();
            prop_assert!(Arc::ptr_eq(&first, &again));
        }
        prop_assert_eq!(&first.value, &service_value);
    }
}

proptest! {
    #[test]
    fn transient_factory_runs_per_resolution(resolutions in 1usize..30) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let container = Container::new();
        container
            .add_transient(move || Arc::new(ServiceB { id: counter.fetch_add(1, Ordering::SeqCst) }))
            .unwrap();

        let ids: Vec<u32> = (0..resolutions)
            .map(|_| container.get_required::<Arc<ServiceB>>().id)
            .collect();
        let expected: Vec<u32> = (0..resolutions as u32).collect();
        prop_assert_eq!(ids, expected);
    }
}

proptest! {
    #[test]
    fn optional_resolution_matches_registration(register_service in any::<bool>()) {
        let container = Container::new();
        if register_service {
            container.add_singleton(Arc::new(ServiceB { id: 42 })).unwrap();
        }

        let optional = container.get_service::<Arc<ServiceB>>();
        prop_assert_eq!(optional.is_some(), register_service);
        prop_assert_eq!(container.try_get_service::<Arc<ServiceB>>().unwrap().is_some(), register_service);
    }
}

// Property: a binding anywhere along a chain of parents is reachable from
// the tail, and the nearest binding wins.
proptest! {
    #[test]
    fn parent_chain_delegation(depth in 1usize..6, bound_at in 0usize..6, shadow_at in prop::option::of(0usize..6)) {
        let bound_at = bound_at % depth;
        let containers: Vec<Container> = (0..depth).map(|_| Container::new()).collect();
        for pair in containers.windows(2) {
            // containers[i] has containers[i + 1] as parent.
            pair[0].set_parent(Some(pair[1].as_resolver()));
        }

        containers[bound_at].add_singleton(Arc::new(ServiceB { id: bound_at as u32 })).unwrap();
        let shadow = shadow_at.map(|s| s % depth).filter(|s| *s != bound_at);
        if let Some(s) = shadow {
            containers[s].add_singleton(Arc::new(ServiceB { id: s as u32 })).unwrap();
        }

        let nearest = shadow.map_or(bound_at, |s| s.min(bound_at));
        let resolved = containers[0].get_required::<Arc<ServiceB>>();
        prop_assert_eq!(resolved.id, nearest as u32);

        // Containers beyond every binding see nothing.
        let deepest = shadow.map_or(bound_at, |s| s.max(bound_at));
        for c in &containers[deepest + 1..] {
            prop_assert!(c.get_service::<Arc<ServiceB>>().is_none());
        }
    }
}
