use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deadline_batch::{partition, work, BatchError, BatchRunner, CancellationToken};
use std::time::Duration;
use tokio::runtime::Runtime;

fn benchmark_partition(c: &mut Criterion) {
    let items: Vec<u64> = (0..10_000).collect();

    for size in [1usize, 10, 100, 1000] {
        c.bench_with_input(BenchmarkId::new("partition", size), &size, |b, &size| {
            b.iter(|| partition(items.iter().copied(), size).count())
        });
    }
}

fn benchmark_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cancel = CancellationToken::new();

    for batch_size in [10usize, 100, 1000] {
        let runner = BatchRunner::new()
            .with_batch_size(batch_size)
            .with_deadline(Duration::from_secs(30));

        c.bench_with_input(
            BenchmarkId::new("fan_out_flat", batch_size),
            &runner,
            |b, runner| {
                b.iter(|| {
                    rt.block_on(async {
                        let results = runner
                            .collect(
                                0..10_000u64,
                                work::flat(|items: Vec<u64>, _token: CancellationToken| async move {
                                    Ok::<_, BatchError>(items.into_iter().map(|n| n * 2).collect())
                                }),
                                &cancel,
                            )
                            .await
                            .unwrap();
                        black_box(results)
                    })
                })
            },
        );
    }
}

fn benchmark_no_result(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cancel = CancellationToken::new();
    let runner = BatchRunner::new().with_batch_size(50);

    c.bench_function("fan_out_unit", |b| {
        b.iter(|| {
            rt.block_on(async {
                runner
                    .run(
                        0..10_000u64,
                        |items, _token| async move {
                            black_box(items.iter().sum::<u64>());
                            Ok(())
                        },
                        &cancel,
                    )
                    .await
                    .unwrap()
            })
        })
    });
}

criterion_group!(
    benches,
    benchmark_partition,
    benchmark_fan_out,
    benchmark_no_result
);
criterion_main!(benches);
