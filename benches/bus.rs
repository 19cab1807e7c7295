//! Benchmarks for cirkit
//!
//! Run with: cargo bench

use std::rc::Rc;

use cirkit::{Bus, Collection, CollectionBinder, MemoryTree, RenderTarget, Template, set_text};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

// =============================================================================
// BUS BENCHMARKS
// =============================================================================

fn bench_emit_no_subscribers(c: &mut Criterion) {
    let bus = Bus::new();
    c.bench_function("emit_no_subscribers", |b| {
        b.iter(|| bus.emit(black_box("nobody"), Value::Null))
    });
}

fn bench_emit_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_fan_out");

    for slots in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("slots", slots), &slots, |b, &slots| {
            let bus = Bus::new();
            for _ in 0..slots {
                bus.on("tick", |payload, _| {
                    black_box(payload);
                    Ok(())
                });
            }
            b.iter(|| bus.emit("tick", json!(1)))
        });
    }

    group.finish();
}

fn bench_alias_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("alias_chain");

    for depth in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            let bus = Bus::new();
            for i in 0..depth {
                bus.wire(format!("s{i}"), format!("s{}", i + 1));
            }
            b.iter(|| bus.emit("s0", json!({"n": 1})))
        });
    }

    group.finish();
}

// =============================================================================
// BINDER BENCHMARKS
// =============================================================================

fn bench_binder_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("binder_insert");

    for count in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("items", count), &count, |b, &count| {
            b.iter(|| {
                let bus = Bus::new();
                let tree = MemoryTree::new();
                let ul = tree.create_node("ul").unwrap();
                let list: Collection<Value> = Collection::new("list", &bus);
                let template = Rc::new(Template::tag("li").field("text", set_text("")));
                let binder =
                    CollectionBinder::bind(&bus, Rc::new(tree.clone()), ul, template, &list)
                        .unwrap();
                for i in 0..count {
                    list.add(json!({"text": i}), Some(0)).unwrap();
                }
                black_box(binder.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_emit_no_subscribers,
    bench_emit_fan_out,
    bench_alias_chain,
    bench_binder_insert,
);
criterion_main!(benches);
