//! Benchmarks for the per-tick learning loop and the evolutionary operators.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use metis::agent::{AgentBrain, AgentBrainBuilder};
use ndarray::array;

fn brain(replay: Option<usize>) -> AgentBrain {
    let mut builder = AgentBrainBuilder::new()
        .input_size(4)
        .action_count(5)
        .alpha(0.05)
        .gamma(0.9)
        .epsilon(0.1)
        .disc_numbers(vec![8, 8, 8, 8])
        .var_ranges(vec![1.0, 1.0, 1.0, 1.0])
        .seed(42);
    if let Some(max_samples) = replay {
        builder = builder.replay_max_samples(max_samples);
    }
    builder.build().unwrap()
}

fn bench_learn(c: &mut Criterion) {
    c.bench_function("learn_without_replay", |b| {
        let mut agent = brain(None);
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            let x = (tick % 7) as f32 / 7.0;
            agent
                .learn(black_box(0.5), array![x, 0.2, 0.8, x].view(), tick)
                .unwrap();
        });
    });

    c.bench_function("learn_with_replay", |b| {
        let mut agent = brain(Some(50));
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            let x = (tick % 7) as f32 / 7.0;
            agent
                .learn(black_box(0.5), array![x, 0.2, 0.8, x].view(), tick)
                .unwrap();
        });
    });
}

fn bench_choose(c: &mut Criterion) {
    c.bench_function("choose_optimal", |b| {
        let mut agent = brain(None);
        let observation = array![0.1, 0.2, 0.8, 0.4];
        b.iter(|| agent.choose(black_box(observation.view()), true).unwrap());
    });
}

fn bench_mutate(c: &mut Criterion) {
    c.bench_function("mutate_full_surface", |b| {
        let mut agent = brain(None);
        let count = agent.default_mutation_count();
        b.iter(|| agent.mutate(black_box(0.5), count).unwrap());
    });
}

criterion_group!(benches, bench_learn, bench_choose, bench_mutate);
criterion_main!(benches);
