//! Benchmarks for lending and reclaiming instances of `warm_pool`.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::rc::Rc;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use warm_pool::{Host, Pool, PoolRegistry};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

/// A host whose objects are moderately sized buffers, standing in for expensive objects.
#[derive(Debug)]
struct BufferHost;

impl Host for BufferHost {
    type Prototype = usize;
    type Object = Vec<u8>;
    type Container = ();

    fn instantiate(&self, prototype: &usize) -> Vec<u8> {
        vec![0; *prototype]
    }

    fn destroy(&self, object: Vec<u8>) {
        drop(black_box(object));
    }
}

const BUFFER_SIZE: usize = 4096;

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("warm_pool");

    group.bench_function("lend_reclaim_warm", |b| {
        let pool = Pool::new(Rc::new(BufferHost), BUFFER_SIZE, 1);

        b.iter(|| {
            let instance = pool.lend();
            pool.reclaim(black_box(instance));
        });
    });

    group.bench_function("instantiate_destroy_cold", |b| {
        let host = BufferHost;

        b.iter(|| {
            let object = host.instantiate(&BUFFER_SIZE);
            host.destroy(black_box(object));
        });
    });

    group.bench_function("registry_lend_release", |b| {
        let mut registry = PoolRegistry::new(Rc::new(BufferHost));
        _ = registry.register_prototype(BUFFER_SIZE, 1);

        b.iter(|| {
            let instance = registry
                .lend(black_box(&BUFFER_SIZE))
                .expect("prototype is registered");
            instance.release();
        });
    });

    group.bench_function("prewarm_100", |b| {
        b.iter_custom(|iters| {
            let host = Rc::new(BufferHost);
            let start = Instant::now();

            for _ in 0..iters {
                let pool = Pool::new(Rc::clone(&host), BUFFER_SIZE, 100);
                pool.teardown();
            }

            start.elapsed()
        });
    });

    group.finish();
}
