//! Leaf actions and conditions.

use rand::Rng;
use tilewalk_core::{Event, GridPosition, NodeStatus};
use tracing::{debug, info};

use crate::BehaviourContext;

pub(crate) fn in_range(ctx: &BehaviourContext<'_>, radius: f32) -> NodeStatus {
    if within(ctx, radius) {
        NodeStatus::Success
    } else {
        NodeStatus::Failure
    }
}

pub(crate) fn attack(ctx: &mut BehaviourContext<'_>, range: f32) -> NodeStatus {
    if !within(ctx, range) {
        return NodeStatus::Failure;
    }

    info!(
        attacker = ctx.agent.id().get(),
        target = ctx.target.id().get(),
        "agent attacks"
    );
    ctx.out.push(Event::AgentAttacked {
        attacker: ctx.agent.id(),
        target: ctx.target.id(),
    });
    NodeStatus::Success
}

pub(crate) fn chase(ctx: &mut BehaviourContext<'_>) -> NodeStatus {
    let start = ctx.agent.grid_position(ctx.projection);
    let goal = ctx.target.grid_position(ctx.projection);
    request_path(ctx, start, goal);
    NodeStatus::Running
}

pub(crate) fn wander(ctx: &mut BehaviourContext<'_>, radius: i32, attempts: u32) -> NodeStatus {
    if ctx.agent.has_path() {
        return NodeStatus::Running;
    }

    let start = ctx.agent.grid_position(ctx.projection);
    let radius = radius.max(0);
    for _ in 0..attempts {
        let candidate = start.offset(
            ctx.rng.gen_range(-radius..=radius),
            ctx.rng.gen_range(-radius..=radius),
        );
        if ctx.grid.is_walkable(candidate) {
            request_path(ctx, start, candidate);
            return NodeStatus::Running;
        }
    }

    debug!(agent = ctx.agent.id().get(), ?start, "no wander target found");
    NodeStatus::Failure
}

fn within(ctx: &BehaviourContext<'_>, radius: f32) -> bool {
    ctx.agent.position().distance(ctx.target.position()) <= radius
}

fn request_path(ctx: &mut BehaviourContext<'_>, start: GridPosition, goal: GridPosition) {
    let agent = ctx.agent.id();
    if ctx.agent.set_path(ctx.grid, start, goal) {
        ctx.out.push(Event::PathAssigned {
            agent,
            goal,
            waypoints: ctx.agent.path().len(),
        });
    } else {
        ctx.out.push(Event::PathNotFound { agent, goal });
    }
}
