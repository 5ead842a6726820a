use std::time::Duration;

use taskgraph::{AdaptiveController, ControllerEvent, ControllerOptions};
use taskgraph_test_utils::fake_sampler::FakeHostSampler;
use taskgraph_test_utils::init_tracing;

/// S6: sustained high CPU readings drive the controller to propose
/// progressively lower concurrency, never below `min_concurrency`.
#[tokio::test]
async fn sustained_high_cpu_drives_repeated_downshift() {
    init_tracing();
    let options = ControllerOptions {
        min_concurrency: 1,
        max_concurrency: 8,
        initial_concurrency: 4,
        target_cpu_utilization: 50.0,
        target_memory_utilization: 90.0,
        check_interval: Duration::from_millis(10),
        adjustment_step: 1,
        history_size: 1,
    };
    let sampler = FakeHostSampler::new(std::iter::repeat((95.0, 10.0)).take(10));
    let controller = AdaptiveController::new(options, Box::new(sampler)).unwrap();

    let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&events);
    controller.subscribe(move |event| {
        if let ControllerEvent::ConcurrencyUpdate(n) = event {
            sink.lock().unwrap().push(*n);
        }
    });

    controller.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.stop();

    let seen = events.lock().unwrap().clone();
    assert!(!seen.is_empty(), "expected at least one downshift");
    assert!(seen.iter().all(|&n| n >= 1));
    assert!(seen.windows(2).all(|w| w[1] <= w[0]), "concurrency must monotonically decrease under sustained load: {seen:?}");
    assert_eq!(*seen.last().unwrap(), 1);
}

#[tokio::test]
async fn manual_override_clamps_and_emits_even_while_stopped() {
    init_tracing();
    let options = ControllerOptions {
        min_concurrency: 2,
        max_concurrency: 6,
        ..ControllerOptions::default()
    };
    let sampler = FakeHostSampler::new([(50.0, 50.0)]);
    let controller = AdaptiveController::new(options, Box::new(sampler)).unwrap();

    let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&events);
    controller.subscribe(move |event| {
        if let ControllerEvent::ConcurrencyUpdate(n) = event {
            sink.lock().unwrap().push(*n);
        }
    });

    controller.set_concurrency(100);
    assert_eq!(controller.metrics().concurrency, 6);
    assert_eq!(*events.lock().unwrap().last().unwrap(), 6);
}
