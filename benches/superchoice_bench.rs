// SPDX-License-Identifier: Apache-2.0

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lutsynth::superchoice::{SuperChoiceOptions, superchoice_lut};
use lutsynth::test_utils::random_network;

fn superchoice_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("superchoice_lut");
    for lut_size in [4usize, 6] {
        let options = SuperChoiceOptions {
            lut_size,
            cut_size_max: lut_size + 4,
            ..SuperChoiceOptions::default()
        };
        group.bench_function(BenchmarkId::from_parameter(lut_size), |b| {
            b.iter_batched(
                || random_network(7, 24, 800, 8),
                |mut net| {
                    let stats = superchoice_lut(&mut net, &options).unwrap();
                    black_box(stats);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, superchoice_benchmark);
criterion_main!(benches);
