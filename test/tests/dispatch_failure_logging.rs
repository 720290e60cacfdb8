/// Integration tests for failed mutations
/// A failed write is logged exactly once, does not stop the queue, and is
/// simply absent from the foreign state afterwards

use log::Level;

use mirra_shared::{EntityKind, KindFilter, Meteor, OperationId, PropertyValue};
use mirra_test::{capture_logs, meteor, TestHarness};

#[test]
fn failed_mutation_is_logged_once_and_skipped() {
    let logs = capture_logs();
    let harness = TestHarness::new();
    let meteors = harness.manager(KindFilter::only(EntityKind::Meteor));
    let h1 = harness.runtime.insert(meteor(9101));
    let h2 = harness.runtime.insert(meteor(9102));
    let h3 = harness.runtime.insert(meteor(9103));
    meteors.reconcile(&harness.runtime).unwrap();
    let rocks = meteors.list::<Meteor>();
    harness.runtime.fail_operation(h2, OperationId::SET_INTEGRITY);

    // m1, m2, m3
    rocks[0].set_integrity(0.1);
    rocks[1].set_integrity(0.2);
    rocks[2].set_integrity(0.3);
    harness.settle();

    assert_eq!(
        harness.runtime.property(h1, Meteor::INTEGRITY),
        Some(PropertyValue::Float(0.1))
    );
    assert_eq!(
        harness.runtime.property(h3, Meteor::INTEGRITY),
        Some(PropertyValue::Float(0.3))
    );
    assert_eq!(
        harness.runtime.property(h2, Meteor::INTEGRITY),
        Some(PropertyValue::Float(1.0))
    );

    let failures = logs.matching(Level::Warn, "SetIntegrity on Meteor 9102");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("rejected by fake runtime"));
    assert!(logs.matching(Level::Warn, "on Meteor 9101").is_empty());
    assert!(logs.matching(Level::Warn, "on Meteor 9103").is_empty());

    // the local write is dispatched, so the next pass takes the foreign value
    assert!(!rocks[1].is_dirty());
    meteors.reconcile(&harness.runtime).unwrap();
    assert_eq!(rocks[1].integrity(), 1.0);
    assert_eq!(rocks[0].integrity(), 0.1);
    assert_eq!(rocks[2].integrity(), 0.3);
}

#[test]
fn panicking_mutation_is_logged_as_error() {
    let logs = capture_logs();
    let harness = TestHarness::new();

    harness
        .sender()
        .enqueue(mirra_shared::Mutation::new("explode 9201", |_| {
            panic!("foreign call exploded")
        }));
    harness.settle();

    assert_eq!(logs.matching(Level::Error, "explode 9201").len(), 1);
}
