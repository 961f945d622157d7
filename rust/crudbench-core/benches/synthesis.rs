use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crudbench_core::generators::{DefaultGenerator, EntityGenerator};
use crudbench_core::keyspace::KeySpace;
use crudbench_core::synth::rand_string;
use crudbench_core::{KeyValueGenerator, Mix, OperationMix};
use rand::{rngs::StdRng, SeedableRng};

fn keys(c: &mut Criterion) {
    let generator = DefaultGenerator::new(10, 2048).unwrap();
    let keys = KeySpace::new(100_000);
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("existing_key", |b| {
        b.iter(|| generator.existing_key(black_box(&keys), &mut rng))
    });
}

fn values(c: &mut Criterion) {
    let mut group = c.benchmark_group("value");
    let mut rng = StdRng::seed_from_u64(0);

    for size in [256, 2048] {
        let generator = DefaultGenerator::new(10, size).unwrap();
        let mut id = 0u64;
        group.bench_function(format!("default_{size}"), |b| {
            b.iter(|| {
                id += 1;
                let key = generator.new_key(id);
                generator.value(black_box(&key), &mut rng)
            })
        });

        let entity = EntityGenerator::new(size.max(450), None).unwrap();
        group.bench_function(format!("entity_{size}"), |b| {
            b.iter(|| {
                id += 1;
                let key = entity.new_key(id);
                entity.value(black_box(&key), &mut rng)
            })
        });

        group.bench_function(format!("rand_string_{size}"), |b| {
            b.iter(|| rand_string(black_box("000000000001"), size))
        });
    }
    group.finish();
}

fn batches(c: &mut Criterion) {
    let mix = OperationMix::new(&Mix {
        create: 10,
        read: 10,
        update: 10,
        delete: 10,
        query: 60,
    })
    .unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("prepare_batch", |b| b.iter(|| mix.prepare_batch(&mut rng)));
}

criterion_group!(benches, keys, values, batches);
criterion_main!(benches);
