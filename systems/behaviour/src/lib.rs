#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Behaviour trees that pick an enemy's action once per tick.
//!
//! A tree is an immutable [`Node`] value built when the enemy is created.
//! Every tick the tree is evaluated against a [`BehaviourContext`] that lends
//! it the acting agent, its target, the grid, and a random source. Leaves may
//! replace the acting agent's path or report events, and nothing else
//! persists between ticks.

mod leaves;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilewalk_core::{Event, NodeStatus, Projection};
use tilewalk_system_movement::Agent;
use tilewalk_world::Grid;

/// Everything a tree may read or mutate while it is evaluated.
pub struct BehaviourContext<'a> {
    /// Agent whose decisions are being made.
    pub agent: &'a mut Agent,
    /// Agent being pursued or attacked.
    pub target: &'a Agent,
    /// Walkable grid used for path requests.
    pub grid: &'a Grid,
    /// Transform between world positions and grid cells.
    pub projection: &'a Projection,
    /// Random source consumed by wandering.
    pub rng: &'a mut dyn RngCore,
    /// Sink for events raised by the leaves.
    pub out: &'a mut Vec<Event>,
}

/// Single node of a behaviour tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Runs children in order until one fails or keeps running.
    Sequence(Vec<Node>),
    /// Runs children in order until one succeeds or keeps running.
    Selector(Vec<Node>),
    /// Succeeds when the target is within `radius` world units.
    InRange {
        /// Inclusive distance threshold in world units.
        radius: f32,
    },
    /// Attacks the target when it is within `range` world units.
    Attack {
        /// Inclusive attack reach in world units.
        range: f32,
    },
    /// Re-plans a path to the target's current cell and keeps running.
    Chase,
    /// Walks to a random nearby cell when idle.
    Wander {
        /// Maximum per-axis distance in cells of a wander target.
        radius: i32,
        /// Number of random cells tried before giving up for this tick.
        attempts: u32,
    },
}

impl Node {
    /// Evaluates the node for one tick.
    pub fn execute(&self, ctx: &mut BehaviourContext<'_>) -> NodeStatus {
        match self {
            Self::Sequence(children) => {
                for child in children {
                    match child.execute(ctx) {
                        NodeStatus::Success => continue,
                        status => return status,
                    }
                }
                NodeStatus::Success
            }
            Self::Selector(children) => {
                for child in children {
                    match child.execute(ctx) {
                        NodeStatus::Failure => continue,
                        status => return status,
                    }
                }
                NodeStatus::Failure
            }
            Self::InRange { radius } => leaves::in_range(ctx, *radius),
            Self::Attack { range } => leaves::attack(ctx, *range),
            Self::Chase => leaves::chase(ctx),
            Self::Wander { radius, attempts } => leaves::wander(ctx, *radius, *attempts),
        }
    }
}

/// Tuning for the standard enemy tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyBehaviour {
    attack_range: f32,
    chase_range: f32,
    wander_radius: i32,
    wander_attempts: u32,
}

impl EnemyBehaviour {
    /// Creates enemy tuning from attack and chase distances and wander limits.
    #[must_use]
    pub const fn new(
        attack_range: f32,
        chase_range: f32,
        wander_radius: i32,
        wander_attempts: u32,
    ) -> Self {
        Self {
            attack_range,
            chase_range,
            wander_radius,
            wander_attempts,
        }
    }
}

impl Default for EnemyBehaviour {
    fn default() -> Self {
        Self::new(24.0, 150.0, 5, 10)
    }
}

/// Immutable decision tree owned by a single agent.
#[derive(Clone, Debug, PartialEq)]
pub struct BehaviourTree {
    root: Node,
}

impl BehaviourTree {
    /// Wraps an arbitrary root node.
    #[must_use]
    pub const fn new(root: Node) -> Self {
        Self { root }
    }

    /// Builds the enemy tree: attack when close, otherwise chase when near,
    /// otherwise wander.
    #[must_use]
    pub fn enemy(behaviour: EnemyBehaviour) -> Self {
        Self::new(Node::Selector(vec![
            Node::Sequence(vec![
                Node::InRange {
                    radius: behaviour.attack_range,
                },
                Node::Attack {
                    range: behaviour.attack_range,
                },
            ]),
            Node::Sequence(vec![
                Node::InRange {
                    radius: behaviour.chase_range,
                },
                Node::Chase,
            ]),
            Node::Wander {
                radius: behaviour.wander_radius,
                attempts: behaviour.wander_attempts,
            },
        ]))
    }

    /// Root node of the tree.
    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// Evaluates the whole tree for one tick.
    pub fn execute(&self, ctx: &mut BehaviourContext<'_>) -> NodeStatus {
        self.root.execute(ctx)
    }
}

/// Behaviour tree paired with the random source it consumes.
#[derive(Clone, Debug)]
pub struct Brain {
    tree: BehaviourTree,
    rng: ChaCha8Rng,
}

impl Brain {
    /// Creates a brain whose random decisions are derived from `seed`.
    #[must_use]
    pub fn new(tree: BehaviourTree, seed: u64) -> Self {
        Self {
            tree,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Evaluates the tree for `agent` pursuing `target`.
    pub fn think(
        &mut self,
        agent: &mut Agent,
        target: &Agent,
        grid: &Grid,
        projection: &Projection,
        out: &mut Vec<Event>,
    ) -> NodeStatus {
        let mut ctx = BehaviourContext {
            agent,
            target,
            grid,
            projection,
            rng: &mut self.rng,
            out,
        };
        self.tree.execute(&mut ctx)
    }
}
