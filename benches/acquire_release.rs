//! Benchmark: checkout/return round trips and contended hand-off

use coropool::{ExecutionContext, ObjectPool, PoolConfiguration};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

fn pool(max: usize) -> ObjectPool<u64> {
    let config = PoolConfiguration::new()
        .with_min_objects(0)
        .with_max_objects(max)
        .with_get_object_timeout(Duration::from_secs(1));
    ObjectPool::new(|| async { Ok::<_, std::io::Error>(7u64) }, config).unwrap()
}

fn benchmark_acquire_release(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let pool = pool(4);

    c.bench_function("acquire_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let obj = pool.acquire(None).await.unwrap().unwrap();
                black_box(*obj);
                pool.release(&obj).await.unwrap();
            })
        });
    });

    c.bench_function("invoke", |b| {
        b.iter(|| {
            rt.block_on(async {
                let next = pool.invoke(None, |n| async move { *n + 1 }).await.unwrap();
                black_box(next)
            })
        });
    });

    c.bench_function("context_borrow", |b| {
        b.iter(|| {
            rt.block_on(ExecutionContext::scope(async {
                let first = pool.defer(None).await.unwrap();
                let second = pool.defer(None).await.unwrap();
                black_box(first.ptr_eq(&second))
            }))
        });
    });
}

fn benchmark_contended(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = pool(4);

    c.bench_function("contended_16_tasks_4_objects", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut handles = Vec::new();
                for _ in 0..16 {
                    let pool = pool.clone();
                    handles.push(tokio::spawn(async move {
                        let obj = pool.acquire(None).await.unwrap().unwrap();
                        tokio::task::yield_now().await;
                        pool.release(&obj).await.unwrap();
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }
            })
        });
    });
}

criterion_group!(benches, benchmark_acquire_release, benchmark_contended);
criterion_main!(benches);
