use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rover_compound::{CallbackAction, ParallelAction, ParallelPolicy, SequentialAction};
use rover_core::{ActionNode, EnvState, TickContext, WorldMut, WorldView};

#[derive(Default)]
struct World {
    polls: u64,
}

impl WorldView for World {
    type Robot = u64;
}

impl WorldMut for World {}

fn instant(name: &str) -> CallbackAction<World> {
    CallbackAction::new(name, |_ctx: &TickContext, _robot: u64, world: &mut World| {
        world.polls += 1;
        true
    })
}

fn bench_sequential(c: &mut Criterion) {
    let mut sequence = SequentialAction::new();
    for i in 0..32 {
        sequence.add(instant(&format!("step-{i}")));
    }
    let mut node = ActionNode::new(sequence);
    let mut state = EnvState::new();
    let mut world = World::default();
    let mut ctx = TickContext::new(0, 0.05, 0);

    c.bench_function("rover-compound/sequential(children=32)", |b| {
        b.iter(|| {
            let status = node.update(&ctx, 1, &mut world, &mut state.env());
            black_box(status);
            node.reset();
            ctx = ctx.next();
        })
    });
}

fn bench_parallel(c: &mut Criterion) {
    let mut parallel = ParallelAction::new(ParallelPolicy::AllDone);
    for i in 0..32 {
        parallel.add(instant(&format!("branch-{i}")));
    }
    let mut node = ActionNode::new(parallel);
    let mut state = EnvState::new();
    let mut world = World::default();
    let mut ctx = TickContext::new(0, 0.05, 0);

    c.bench_function("rover-compound/parallel(children=32)", |b| {
        b.iter(|| {
            let status = node.update(&ctx, 1, &mut world, &mut state.env());
            black_box(status);
            node.reset();
            ctx = ctx.next();
        })
    });
}

criterion_group!(benches, bench_sequential, bench_parallel);
criterion_main!(benches);
