use std::thread;
use std::time::Duration;

use facebridge_kernel::{Bridge, BridgeConfig, EntryPoint, FailureKind, ForeignCallError};
use facebridge_testing::{Behavior, MockRuntime};

fn entry() -> EntryPoint {
    EntryPoint::new("face_recognition", "main")
}

#[test]
fn test_success_passes_text_through() {
    let runtime = MockRuntime::returning("alice");
    let bridge = Bridge::new(runtime.clone(), entry());

    assert_eq!(bridge.invoke(), "alice");
    facebridge_testing::assert_runtime_called!(runtime, 1);
    assert_eq!(runtime.history(), vec![entry()]);
}

#[test]
fn test_every_failure_kind_is_sentinel() {
    let failures = [
        ForeignCallError::RuntimeInit("sys.path unavailable".into()),
        ForeignCallError::ModuleResolution("No module named 'face_recognition'".into()),
        ForeignCallError::AttributeResolution("module has no attribute 'main'".into()),
        ForeignCallError::NotCallable {
            type_name: "int".into(),
        },
        ForeignCallError::InvocationRaised("RuntimeError: camera offline".into()),
        ForeignCallError::ResultNotDecodable {
            type_name: "int".into(),
            detail: "expected str".into(),
        },
    ];

    for err in failures {
        let kind = err.kind();
        let bridge = Bridge::new(MockRuntime::failing(err), entry());
        assert_eq!(bridge.invoke(), "Error", "kind {kind} must collapse");
        assert_eq!(bridge.call().unwrap_err().kind(), kind);
    }
}

#[test]
fn test_handles_released_on_every_path() {
    let runtime = MockRuntime::returning("alice");
    let bridge = Bridge::new(runtime.clone(), entry());

    runtime.enqueue(Behavior::Fail(ForeignCallError::AttributeResolution(
        "no attribute".into(),
    )));
    runtime.enqueue(Behavior::Fail(ForeignCallError::NotCallable {
        type_name: "int".into(),
    }));
    runtime.enqueue(Behavior::Fail(ForeignCallError::InvocationRaised(
        "boom".into(),
    )));
    runtime.enqueue(Behavior::Panic("interpreter crashed".into()));

    for _ in 0..100 {
        bridge.invoke();
        assert_eq!(runtime.live_handles(), 0);
    }
    assert!(runtime.acquired_handles() > 0);
    assert_eq!(bridge.stats().failures(), 4);
    assert_eq!(bridge.stats().invocations(), 100);
    assert_eq!(bridge.stats().in_flight(), 0);
}

#[test]
fn test_concurrent_calls_never_overlap() {
    let runtime = MockRuntime::new(Behavior::returns("alice").delayed(Duration::from_millis(5)));
    let bridge = Bridge::new(runtime.clone(), entry());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let bridge = bridge.clone();
            thread::spawn(move || bridge.invoke())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "alice");
    }
    assert_eq!(runtime.call_count(), 16);
    assert_eq!(runtime.peak_concurrency(), 1);
}

#[test]
fn test_timeout_abandons_slow_call() {
    let runtime = MockRuntime::new(Behavior::returns("late").delayed(Duration::from_millis(300)));
    let bridge = Bridge::new(runtime.clone(), entry()).with_timeout(Duration::from_millis(30));

    let err = bridge.call().unwrap_err();
    assert_eq!(err, ForeignCallError::Timeout(Duration::from_millis(30)));
    assert_eq!(err.kind(), FailureKind::Timeout);

    // The abandoned call finishes on its own.
    thread::sleep(Duration::from_millis(500));
    assert_eq!(bridge.stats().in_flight(), 0);
    assert_eq!(runtime.live_handles(), 0);
}

#[test]
fn test_abandoned_call_blocks_overlap() {
    let runtime = MockRuntime::new(Behavior::returns("fast"));
    runtime.enqueue(Behavior::returns("slow").delayed(Duration::from_millis(200)));
    let bridge = Bridge::new(runtime.clone(), entry()).with_timeout(Duration::from_millis(20));

    assert_eq!(bridge.invoke(), "Error");

    let patient = bridge.clone().with_timeout(Duration::from_secs(5));
    assert_eq!(patient.invoke(), "fast");
    assert_eq!(runtime.peak_concurrency(), 1);
}

#[test]
fn test_timed_out_calls_never_reach_the_routine() {
    let runtime = MockRuntime::new(Behavior::returns("late").delayed(Duration::from_millis(300)));
    let bridge = Bridge::new(runtime.clone(), entry()).with_timeout(Duration::from_millis(20));

    for _ in 0..10 {
        assert!(matches!(bridge.call(), Err(ForeignCallError::Timeout(_))));
    }
    assert_eq!(runtime.call_count(), 1);

    // Queued workers gave up at their deadline; only the first ever ran.
    thread::sleep(Duration::from_millis(600));
    assert_eq!(runtime.call_count(), 1);
    assert_eq!(bridge.stats().in_flight(), 0);
    assert_eq!(bridge.stats().failures(), 10);
}

#[test]
fn test_gate_wait_counts_against_deadline() {
    let runtime = MockRuntime::new(Behavior::returns("fast"));
    runtime.enqueue(Behavior::returns("slow").delayed(Duration::from_millis(400)));
    let bridge = Bridge::new(runtime.clone(), entry());

    let holder = {
        let bridge = bridge.clone();
        thread::spawn(move || bridge.invoke())
    };
    thread::sleep(Duration::from_millis(50));

    let hasty = bridge.clone().with_timeout(Duration::from_millis(30));
    assert_eq!(hasty.invoke(), "Error");

    assert_eq!(holder.join().unwrap(), "slow");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(runtime.call_count(), 1);
    assert_eq!(bridge.invoke(), "fast");
}

#[test]
fn test_deadline_met_returns_text() {
    let runtime = MockRuntime::new(Behavior::returns("bob").delayed(Duration::from_millis(5)));
    let bridge = Bridge::new(runtime, entry()).with_timeout(Duration::from_secs(5));
    assert_eq!(bridge.invoke(), "bob");
}

#[test]
fn test_sentinel_text_from_routine_is_ambiguous() {
    let bridge = Bridge::new(MockRuntime::returning("Error"), entry());
    assert_eq!(bridge.call().unwrap(), "Error");
    assert_eq!(bridge.stats().failures(), 0);
}

#[test]
fn test_config_drives_entry_point() {
    let config = BridgeConfig::default()
        .with_module("vision.faces")
        .with_function("identify");
    let runtime = MockRuntime::returning("carol");
    let bridge = Bridge::from_config(runtime.clone(), &config);

    assert_eq!(bridge.invoke(), "carol");
    assert_eq!(
        runtime.history(),
        vec![EntryPoint::new("vision.faces", "identify")]
    );
}

#[test]
fn test_recognize_report() {
    let runtime = MockRuntime::returning(
        r#"{"status": "error", "message": "Face not recognized with sufficient accuracy", "name": null, "emotion": null, "time": null}"#,
    );
    let bridge = Bridge::new(runtime, entry());

    let report = bridge.recognize().unwrap();
    assert!(!report.is_success());
    assert_eq!(
        report.message.as_deref(),
        Some("Face not recognized with sufficient accuracy")
    );
}
