use std::sync::Arc;

use check_core::{
    CheckContext, CheckSession, Diagnostic, DocumentId, DocumentSnapshot, Producer, ProducerError,
    RegionResolver, ScheduleConfig, TypeKey, TypeRegistry, WillCheck,
};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

/// Producer that synthesizes a deterministic diagnostic spread per cycle.
struct Synthetic {
    name: String,
    count: usize,
    spread: usize,
}

impl Producer for Synthetic {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&mut self, ctx: CheckContext) -> Result<WillCheck, ProducerError> {
        let list = (0..self.count)
            .map(|i| {
                let begin = (i * 37) % self.spread;
                let key = match i % 3 {
                    0 => TypeKey::error(),
                    1 => TypeKey::warning(),
                    _ => TypeKey::note(),
                };
                Diagnostic::new(ctx.document, begin, begin + 3, key, "synthetic finding")
            })
            .collect();
        ctx.sink.finish(list);
        Ok(WillCheck::Yes)
    }
}

fn synthetic_session(producers: usize, per_producer: usize) -> CheckSession {
    let registry = Arc::new(TypeRegistry::with_builtin_types());
    let mut session = CheckSession::new(DocumentId::new(1), registry, ScheduleConfig::default());
    for p in 0..producers {
        session.register_producer(Box::new(Synthetic {
            name: format!("synthetic-{p}"),
            count: per_producer,
            spread: 10_000,
        }));
    }
    session.enable().unwrap();
    session
}

fn bench_check_cycle(c: &mut Criterion) {
    c.bench_function("check_cycle/8_producers_x_250", |b| {
        b.iter_batched(
            || synthetic_session(8, 250),
            |mut session| {
                session.schedule(false);
                session.pump();
                black_box(session.counts());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_merged_view(c: &mut Criterion) {
    let mut session = synthetic_session(8, 250);
    session.schedule(false);
    session.pump();

    c.bench_function("merged_view/2000_diagnostics", |b| {
        b.iter(|| black_box(session.current_diagnostics().count()))
    });
}

fn bench_region_resolution(c: &mut Criterion) {
    let mut text = String::with_capacity(40 * 10_000);
    for i in 0..10_000 {
        text.push_str(&format!("{i:06} let binding_{i} = compute({i});\n"));
    }
    let snapshot = DocumentSnapshot::from_text(&text);
    let resolver = RegionResolver::new();

    c.bench_function("region_resolution/10k_lines", |b| {
        b.iter(|| {
            for line in (1..10_000).step_by(97) {
                black_box(resolver.resolve(&snapshot, line, Some(12)).unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_check_cycle,
    bench_merged_view,
    bench_region_resolution
);
criterion_main!(benches);
