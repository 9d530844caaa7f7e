//! Inbound dispatch benchmark suite.
//!
//! Measures:
//! - Raw inbound parsing and validation
//! - Delivery from a host reply to N filtered subscribers
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use webview_bridge::environment::ANY_ORIGIN;
use webview_bridge::{HostEntryPoint, MessageService, MessageServiceConfig, RawMessage, Window};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const SUBSCRIBER_COUNTS: &[usize] = &[1, 16, 64];

// ============================================================================
// Benchmark: Inbound Parsing
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    let text = r#"{"type":"RECEIVED","payload":{"originalType":"PING","n":1},"source":"android","timestamp":1735689600000}"#;
    group.bench_function("serialized", |b| {
        b.iter(|| RawMessage::from(black_box(text)).into_message(false))
    });

    let value = json!({"type": "RECEIVED", "payload": {"n": 1}, "source": "native"});
    group.bench_function("structured", |b| {
        b.iter(|| RawMessage::from(black_box(value.clone())).into_message(false))
    });

    group.bench_function("plain_text_wrapped", |b| {
        b.iter(|| RawMessage::from(black_box("invalid-json")).into_message(true))
    });

    group.finish();
}

// ============================================================================
// Benchmark: Subscriber Fan-out
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("fan_out");

    for &count in SUBSCRIBER_COUNTS {
        let (window, service, subscriptions) = rt.block_on(async {
            let window = Window::builder()
                .android_interface(HostEntryPoint::from_fn(|_| Ok(())))
                .build();
            let service = MessageService::for_window(&window, MessageServiceConfig::new())
                .expect("service");
            let subscriptions: Vec<_> = (0..count)
                .map(|_| service.on_message(Some("RECEIVED")))
                .collect();
            (window, service, Arc::new(Mutex::new(subscriptions)))
        });

        group.bench_with_input(BenchmarkId::new("subscribers", count), &count, |b, _| {
            b.to_async(&rt).iter(|| {
                let window = window.clone();
                let subscriptions = Arc::clone(&subscriptions);
                async move {
                    window.post_message(json!({"type": "RECEIVED", "source": "android"}), ANY_ORIGIN);
                    let mut subscriptions = subscriptions.lock().await;
                    for subscription in subscriptions.iter_mut() {
                        black_box(subscription.recv().await);
                    }
                }
            });
        });

        service.destroy();
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_fan_out);
criterion_main!(benches);
