use std::cell::Cell;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use portal_slots::{
    Document, Logger, NullSink, PortalSlot, Runtime, RuntimeConfig, SlotId, SlotRegistry,
    Subscription, View, portal_slot,
};

fn registry_notify_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_notify_fanout");
    for listeners in [1usize, 16, 256] {
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, &listeners| {
                let registry = SlotRegistry::new();
                let calls = Rc::new(Cell::new(0u64));
                let _subscriptions: Vec<Subscription> = (0..listeners)
                    .map(|_| {
                        let calls = calls.clone();
                        registry.subscribe(move || calls.set(calls.get() + 1))
                    })
                    .collect();
                let id = SlotId::mint("bench");
                let mount = Document::new().create_element("div");
                b.iter(|| {
                    registry.set(&id, black_box(mount)).expect("set");
                    registry.delete(&id);
                });
                black_box(calls.get());
            },
        );
    }
    group.finish();
}

fn handoff_tree(slots: &[PortalSlot], mounted: bool) -> View {
    let mut children = Vec::with_capacity(slots.len() * 2);
    for (idx, pair) in slots.iter().enumerate() {
        children.push(View::from(
            pair.portal
                .view()
                .child(View::element("span").child(format!("content {idx}"))),
        ));
        if mounted {
            children.push(View::from(pair.slot.view()));
        }
    }
    View::provider(children)
}

fn runtime_handoff_commit(c: &mut Criterion) {
    let slots: Vec<PortalSlot> = (0..32).map(|idx| portal_slot(format!("slot-{idx}"))).collect();
    c.bench_function("runtime_handoff_commit", |b| {
        b.iter(|| {
            let config = RuntimeConfig::default().with_logger(Logger::new(NullSink));
            let mut runtime = Runtime::new(config);
            runtime
                .render(handoff_tree(&slots, true))
                .expect("mount slots");
            runtime
                .render(handoff_tree(&slots, false))
                .expect("unmount slots");
            black_box(runtime.markup());
        });
    });
}

criterion_group!(benches, registry_notify_fanout, runtime_handoff_commit);
criterion_main!(benches);
