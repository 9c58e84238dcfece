//! Event bus delivery, isolation and shutdown drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use relay_core::events::{
    event_handler, BusEvent, EventBus, EventBusError, EventHandlerError, InMemoryEventBus,
};
use relay_core::models::Actor;

fn counting_handler(counter: Arc<AtomicUsize>) -> relay_core::events::EventHandler {
    event_handler(move |_event: BusEvent| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn test_publish_without_subscribers_is_not_an_error() {
    let bus = InMemoryEventBus::default();

    let deliveries = bus.publish("nobody:listens", Actor::new_applicant(1).into());

    assert_eq!(deliveries, 0);
    let stats = bus.get_statistics();
    assert_eq!(stats.events_published, 1);
    assert_eq!(stats.unrouted_events, 1);
}

#[tokio::test]
async fn test_every_subscriber_runs_despite_failing_neighbours() {
    let bus = InMemoryEventBus::default();
    let counter = Arc::new(AtomicUsize::new(0));

    bus.subscribe("actor:approved", counting_handler(counter.clone()))
        .unwrap();
    bus.subscribe(
        "actor:approved",
        event_handler(|event: BusEvent| async move {
            Err(EventHandlerError::execution_failed(event.topic, "boom"))
        }),
    )
    .unwrap();
    bus.subscribe(
        "actor:approved",
        event_handler(|_event: BusEvent| async move {
            if true {
                panic!("subscriber panicked");
            }
            Ok(())
        }),
    )
    .unwrap();
    bus.subscribe("actor:approved", counting_handler(counter.clone()))
        .unwrap();

    let deliveries = bus.publish("actor:approved", Actor::new_applicant(1).into());
    assert_eq!(deliveries, 4);
    assert!(bus.shutdown(Duration::from_secs(1)).await);

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    let stats = bus.get_statistics();
    assert_eq!(stats.handler_errors, 2);
    assert_eq!(stats.handler_panics, 1);
}

#[tokio::test]
async fn test_publish_returns_before_subscribers_finish() {
    let bus = InMemoryEventBus::default();
    let release = Arc::new(Notify::new());
    let finished = Arc::new(AtomicUsize::new(0));

    let (gate, done) = (release.clone(), finished.clone());
    bus.subscribe(
        "slow",
        event_handler(move |_event: BusEvent| {
            let (gate, done) = (gate.clone(), done.clone());
            async move {
                gate.notified().await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }),
    )
    .unwrap();

    assert_eq!(bus.publish("slow", Actor::new_applicant(1).into()), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 0);
    assert_eq!(bus.in_flight(), 1);

    release.notify_one();
    assert!(bus.shutdown(Duration::from_secs(1)).await);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_times_out_on_stuck_subscriber_and_refuses_new_work() {
    let bus = InMemoryEventBus::default();
    bus.subscribe(
        "stuck",
        event_handler(|_event: BusEvent| async move {
            std::future::pending::<()>().await;
            Ok(())
        }),
    )
    .unwrap();
    bus.publish("stuck", Actor::new_applicant(1).into());

    assert!(!bus.shutdown(Duration::from_millis(50)).await);
    assert!(bus.is_shut_down());

    assert_eq!(bus.publish("stuck", Actor::new_applicant(2).into()), 0);
    assert_eq!(bus.get_statistics().dropped_after_shutdown, 1);
    assert_eq!(
        bus.subscribe("stuck", counting_handler(Arc::new(AtomicUsize::new(0)))),
        Err(EventBusError::ShutDown)
    );
}

#[tokio::test]
async fn test_empty_topic_is_rejected() {
    let bus = InMemoryEventBus::default();
    let result = bus.subscribe("  ", counting_handler(Arc::new(AtomicUsize::new(0))));
    assert!(matches!(result, Err(EventBusError::InvalidTopic { .. })));
}
