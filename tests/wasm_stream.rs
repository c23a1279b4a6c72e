#![cfg(target_arch = "wasm32")]

use fortune_engine::{format_usd, Clock, SystemClock, WasmTokenStream};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_start_queues_one_snapshot() {
    let mut stream = WasmTokenStream::new(None).unwrap();
    let now = wall_now();
    stream.start(Some(now - 60_000.0));
    let events: Vec<serde_json::Value> =
        serde_wasm_bindgen::from_value(stream.drain_events()).unwrap();
    let kinds: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(kinds, vec!["snapshot", "update"]);
    assert!(serde_wasm_bindgen::from_value::<serde_json::Value>(stream.drain_events())
        .unwrap()
        .as_array()
        .unwrap()
        .is_empty());
}

#[wasm_bindgen_test]
fn test_snapshot_shape() {
    let mut stream = WasmTokenStream::new(None).unwrap();
    stream.start(None);
    let snapshot: serde_json::Value = serde_wasm_bindgen::from_value(stream.snapshot()).unwrap();
    assert_eq!(snapshot["tokenCA"], "0xMockTokenAddressForDemo");
    assert_eq!(snapshot["fortunePool"], 55.0);
    assert_eq!(snapshot["topHolders"].as_array().unwrap().len(), 10);
}

#[wasm_bindgen_test]
fn test_bad_config_is_js_error() {
    let err = WasmTokenStream::new(Some("{ \"TOTAL_SUPPLY\": 0 }".to_string()));
    assert!(err.is_err());
}

#[wasm_bindgen_test]
fn test_clock_status_resyncs() {
    let mut stream = WasmTokenStream::new(None).unwrap();
    let start = wall_now() - 30_000.0;
    let body = format!("{{\"isRunning\":true,\"startTime\":{}}}", start as i64);
    let outcome: serde_json::Value =
        serde_wasm_bindgen::from_value(stream.apply_clock_status(&body)).unwrap();
    assert_eq!(outcome["outcome"], "resynced");
    assert_eq!(stream.anchor_time(), Some((start as i64) as f64));

    let outcome: serde_json::Value =
        serde_wasm_bindgen::from_value(stream.clock_unreachable("offline")).unwrap();
    assert_eq!(outcome["outcome"], "unreachable");
    assert!(stream.stream().is_polling_mode());
}

#[wasm_bindgen_test]
fn test_clock_poll_due_on_mount() {
    let mut stream = WasmTokenStream::new(None).unwrap();
    assert!(stream.next_wake() <= wall_now());
    assert!(stream.clock_poll_due());
    assert!(!stream.clock_poll_due());
    assert!(stream.next_wake() > wall_now());
}

#[wasm_bindgen_test]
fn test_format_exports() {
    assert_eq!(format_usd(1_500.0), "$1.50K");
}

fn wall_now() -> f64 {
    SystemClock::new().now_ms() as f64
}
