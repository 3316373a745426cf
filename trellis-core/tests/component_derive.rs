use std::any::type_name;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_core::prelude::*;
use trellis_core_macros::Component;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, PartialEq)]
struct Settings {
    name: String,
}

#[derive(Component, Default)]
struct Plain {
    #[inject]
    settings: Autowired<Settings>,
    #[inject("")]
    clock: Autowired<dyn Clock>,
    counter: usize,
}

#[derive(Component, Default)]
#[component(name = "auditor")]
#[lifecycle("prototype")]
struct Auditor {
    #[inject("plain")]
    plain: Autowired<Plain>,
}

#[derive(Component)]
#[lifecycle("session")]
struct Marker;

#[derive(Component, Default)]
#[component("selfish")]
struct Selfish {
    #[inject]
    me: Autowired<Selfish>,
}

#[test]
fn derive_generates_points_for_marked_fields_only() {
    let points = Plain::injection_points();
    let fields: Vec<_> = points.iter().map(|p| p.field()).collect();
    assert_eq!(fields, vec!["settings", "clock"]);

    assert_eq!(points[0].qualifier(), None);
    assert_eq!(points[1].qualifier(), None);
    assert_eq!(points[1].target().name(), type_name::<dyn Clock>());
}

#[test]
fn derive_reads_name_and_lifecycle_attributes() {
    assert_eq!(Plain::bean_name(), type_name::<Plain>());
    assert_eq!(Plain::lifecycle(), Lifecycle::Singleton);

    assert_eq!(Auditor::bean_name(), "auditor");
    assert_eq!(Auditor::lifecycle(), Lifecycle::Prototype);
    assert_eq!(Auditor::injection_points()[0].qualifier(), Some("plain"));

    assert_eq!(Marker::lifecycle(), Lifecycle::Session);
    assert!(Marker::injection_points().is_empty());
}

#[test]
fn type_based_injection_uses_capabilities() {
    let container = Container::new();
    container
        .provide(
            "settings",
            Settings {
                name: "demo".to_string(),
            },
        )
        .unwrap();
    container
        .register(
            BeanDefinition::new("clock", FixedClock(42))
                .exposes(|c: Arc<FixedClock>| c as Arc<dyn Clock>),
        )
        .unwrap();
    container.provide_component("plain", Plain::default()).unwrap();

    let report = container.populate().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.fields_wired, 2);

    let plain = container.get_as::<Plain>("plain").unwrap();
    assert_eq!(plain.settings.require().unwrap().name, "demo");
    assert_eq!(plain.clock.require().unwrap().now(), 42);
    assert_eq!(plain.counter, 0);
}

#[test]
fn component_default_name_is_type_name() {
    let container = Container::new();
    container.provide_component("", Plain::default()).unwrap();
    assert!(container.has(type_name::<Plain>()));
}

#[test]
fn bean_does_not_satisfy_its_own_type_dependency() {
    let container = Container::new();
    container.provide_component("", Selfish::default()).unwrap();

    let report = container.populate().unwrap();
    assert_eq!(report.fields_wired, 0);
    assert!(matches!(
        report.issues.as_slice(),
        [WiringIssue::Unresolved { field: "me", .. }]
    ));
}

#[test]
fn prototype_dependency_is_resolved_to_a_fresh_instance() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let container = Container::new();
    container
        .provide_factory(
            "settings",
            move || Settings {
                name: format!("settings-{}", counter.fetch_add(1, Ordering::SeqCst)),
            },
            Lifecycle::Prototype,
        )
        .unwrap();
    container.provide_component("plain", Plain::default()).unwrap();

    container.populate().unwrap();

    let plain = container.get_as::<Plain>("plain").unwrap();
    assert_eq!(plain.settings.require().unwrap().name, "settings-1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn pinned_field_survives_populate() {
    let container = Container::new();
    container
        .register(
            BeanDefinition::new("clock", FixedClock(1))
                .exposes(|c: Arc<FixedClock>| c as Arc<dyn Clock>),
        )
        .unwrap();
    container
        .provide_component(
            "plain",
            Plain {
                settings: Autowired::new(),
                clock: Autowired::pinned(Arc::new(FixedClock(99)) as Arc<dyn Clock>),
                counter: 3,
            },
        )
        .unwrap();

    let report = container.populate().unwrap();
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, WiringIssue::Unsettable { field: "clock", .. })));

    let plain = container.get_as::<Plain>("plain").unwrap();
    assert_eq!(plain.clock.require().unwrap().now(), 99);
}

#[test]
fn components_registered_after_populate_stay_unwired() {
    let container = Container::new();
    container
        .provide(
            "settings",
            Settings {
                name: "late".to_string(),
            },
        )
        .unwrap();
    container.populate().unwrap();

    container.provide_component("plain", Plain::default()).unwrap();
    let plain = container.get_as::<Plain>("plain").unwrap();
    assert!(!plain.settings.is_wired());

    container.populate().unwrap();
    assert!(plain.settings.is_wired());
}
