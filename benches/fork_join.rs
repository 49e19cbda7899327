use criterion::{black_box, criterion_group, criterion_main, Criterion};
use revmem::prelude::*;

fn bench_fork_join_roundtrip(c: &mut Criterion) {
    c.bench_function("fork+join empty branch", |b| {
        b.iter(|| {
            let branch = fork(|| {});
            branch.join();
        })
    });

    c.bench_function("fork+join one write", |b| {
        let x = Versioned::new(0);
        b.iter(|| {
            let branch = {
                let x = x.clone();
                fork(move || {
                    x.set(1);
                })
            };
            branch.join();
            black_box(x.get())
        })
    });
}

fn bench_reads(c: &mut Criterion) {
    c.bench_function("Versioned::get after 100 rejoins", |b| {
        // Collapse keeps the chain short, so this should stay flat no
        // matter how many joins happened before.
        let x = Versioned::new(0);
        for i in 0..100 {
            let branch = {
                let x = x.clone();
                fork(move || {
                    x.set(i);
                })
            };
            branch.join();
        }
        b.iter(|| black_box(x.get()))
    });

    c.bench_function("Versioned::get x1000 same branch", |b| {
        let x = Versioned::new(7);
        b.iter(|| {
            let mut sum = 0;
            for _ in 0..1000 {
                sum += x.get();
            }
            black_box(sum)
        })
    });
}

fn bench_adapter_writes(c: &mut Criterion) {
    c.bench_function("VsSet::insert x1000 in branch", |b| {
        b.iter(|| {
            let set = VsSet::new();
            let branch = {
                let set = set.clone();
                fork(move || {
                    for i in 0..1000 {
                        set.insert(i);
                    }
                })
            };
            branch.join();
            black_box(set.len())
        })
    });

    c.bench_function("VsQueue::push x1000 same branch", |b| {
        b.iter(|| {
            let q = VsQueue::new();
            for i in 0..1000 {
                q.push(i);
            }
            black_box(q.len())
        })
    });
}

criterion_group!(
    benches,
    bench_fork_join_roundtrip,
    bench_reads,
    bench_adapter_writes
);
criterion_main!(benches);
