use flow_agent::{CommandNode, FollowPath, StickToPathWithTarget};
use flow_core::{FlowConfig, Gate, NodeId, PipeEvent, SubjectId, TickContext};
use flow_sim::SimWorld;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const TRUCK: SubjectId = SubjectId(10);

fn wired(id: NodeId, leaf: impl Into<flow_agent::CommandKind>) -> CommandNode {
    let mut node = CommandNode::new(id, FlowConfig::default(), leaf);
    node.on_gate_connected(Gate::Exec);
    node.on_gate_connected(Gate::Sink);
    node
}

fn bench_follow_path_cycle(c: &mut Criterion) {
    let mut world = SimWorld::new().with_vehicle(TRUCK, &["Driver"]);
    let mut node = wired(NodeId(1), FollowPath::new("canyon"));

    let mut tick: u64 = 0;
    c.bench_function("flow-agent/follow-path(trigger+finish)", |b| {
        b.iter(|| {
            let ctx = TickContext::new(tick);
            node.on_subject_bound(&ctx, &mut world, Some(TRUCK));
            node.on_sink_trigger(&ctx, &mut world);
            node.on_tick(&ctx, &mut world);
            if let Some(binding) = node.pipes().live() {
                node.on_pipe_event(&ctx, &mut world, binding.subject, binding.pipe, PipeEvent::Finished);
            }
            world.clear_records();
            black_box(node.latch_state());
            tick = tick.wrapping_add(1);
        })
    });
}

fn bench_running_watch_tick(c: &mut Criterion) {
    let mut world = SimWorld::new().with_vehicle(TRUCK, &["Driver"]);
    let mut node = wired(NodeId(2), StickToPathWithTarget::new("coast"));
    let ctx = TickContext::new(0);
    node.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    node.on_sink_trigger(&ctx, &mut world);
    node.on_tick(&ctx, &mut world);
    world.take_notifications();

    let mut tick: u64 = 1;
    c.bench_function("flow-agent/stick-path(running tick)", |b| {
        b.iter(|| {
            node.on_tick(&TickContext::new(tick), &mut world);
            black_box(node.in_flight());
            tick = tick.wrapping_add(1);
        })
    });
}

criterion_group!(benches, bench_follow_path_cycle, bench_running_watch_tick);
criterion_main!(benches);
