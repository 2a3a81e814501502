#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilewalk simulation.
//!
//! This crate defines the value types and the message surface that connect
//! the grid, the per-tick systems, and the adapters. Adapters submit
//! [`Command`] values describing desired actions, the simulation executes
//! them through its `apply` entry point, and then reports [`Event`] values in
//! deterministic agent order.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tilewalk.";

/// Commands accepted by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one tick of the provided length.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player walk to the provided grid cell.
    MovePlayer {
        /// Cell the player should path towards.
        goal: GridPosition,
    },
}

/// Events broadcast by the simulation after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent received a fresh path.
    PathAssigned {
        /// Agent that now follows the path.
        agent: AgentId,
        /// Final cell of the path.
        goal: GridPosition,
        /// Number of waypoints left to walk, excluding the start cell.
        waypoints: usize,
    },
    /// Reports that a path request could not be satisfied.
    PathNotFound {
        /// Agent that issued the request.
        agent: AgentId,
        /// Cell the agent attempted to reach.
        goal: GridPosition,
    },
    /// Confirms that an agent arrived at the next waypoint of its path.
    WaypointReached {
        /// Agent that advanced.
        agent: AgentId,
        /// Waypoint that was consumed.
        cell: GridPosition,
    },
    /// Reports that an agent attacked another agent.
    AgentAttacked {
        /// Agent that performed the attack.
        attacker: AgentId,
        /// Agent that was attacked.
        target: AgentId,
    },
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Distinguishes who decides where an agent goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Agent steered by input translated into path requests.
    Player,
    /// Agent steered by its own behaviour tree.
    Enemy,
}

/// Integer tile coordinate on the grid.
///
/// Coordinates are signed so that positions derived from world space or from
/// neighbour offsets can fall outside the grid and still be represented; the
/// grid answers bounds questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    column: i32,
    row: i32,
}

impl GridPosition {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided offsets.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(
            self.column.saturating_add(columns),
            self.row.saturating_add(rows),
        )
    }

    /// Computes the Chebyshev distance between two coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: GridPosition) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Kind of tile stored in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    /// Open ground agents may stand on and path through.
    Floor,
    /// Solid tile that blocks movement.
    Wall,
}

impl TileType {
    /// Reports whether agents may occupy a tile of this kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Floor)
    }
}

/// Outcome of evaluating a behaviour tree node for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// The node achieved its goal this tick.
    Success,
    /// The node could not achieve its goal this tick.
    Failure,
    /// The node is still working towards its goal.
    Running,
}

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    /// Builds a rectangle of the provided size centered on `center`.
    #[must_use]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Corner with the smallest coordinates.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Corner with the largest coordinates.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// The four corners in min/max order.
    #[must_use]
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            Vec2::new(self.min.x, self.max.y),
            self.max,
        ]
    }

    /// Reports whether two rectangles overlap. Touching edges count as overlap.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Closest point of the rectangle to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Convex quadrilateral covering a tile in world units.
///
/// Top-down tiles are rectangles and isometric tiles are diamonds. The
/// outline matches the region that [`Projection::world_to_grid`] rounds to the
/// tile, so a point outside every wall outline never maps onto a wall cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileShape {
    corners: [Vec2; 4],
}

impl TileShape {
    /// Creates an outline from four corners listed in winding order.
    #[must_use]
    pub const fn new(corners: [Vec2; 4]) -> Self {
        Self { corners }
    }

    /// Corners in winding order.
    #[must_use]
    pub const fn corners(&self) -> [Vec2; 4] {
        self.corners
    }

    /// Average of the corners.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.corners.iter().copied().sum::<Vec2>() * 0.25
    }

    /// Smallest axis-aligned rectangle enclosing the outline.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let (min, max) = self.corners[1..].iter().fold(
            (self.corners[0], self.corners[0]),
            |(min, max), corner| (min.min(*corner), max.max(*corner)),
        );
        Aabb { min, max }
    }

    /// Reports whether `point` lies inside the outline or on its boundary.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.edges().all(|edge| edge.signed_distance(point) <= 0.0)
    }

    /// Closest point of the outline to `point`, which is `point` itself when inside.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        if self.contains(point) {
            return point;
        }

        let mut best = self.corners[0];
        let mut best_distance = f32::INFINITY;
        for edge in self.edges() {
            let candidate = edge.closest_point(point);
            let distance = candidate.distance_squared(point);
            if distance < best_distance {
                best = candidate;
                best_distance = distance;
            }
        }
        best
    }

    /// Outward normal of the edge nearest to `point` and `point` projected onto that edge.
    ///
    /// Meant for points inside the outline, where it names the shortest way out.
    #[must_use]
    pub fn nearest_edge(&self, point: Vec2) -> (Vec2, Vec2) {
        let mut edges = self.edges();
        let Some(mut best) = edges.next() else {
            return (Vec2::ZERO, point);
        };
        for edge in edges {
            if edge.signed_distance(point) > best.signed_distance(point) {
                best = edge;
            }
        }
        (
            best.normal,
            point - best.normal * best.signed_distance(point),
        )
    }

    fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let center = self.center();
        (0..4).map(move |index| {
            Edge::new(self.corners[index], self.corners[(index + 1) % 4], center)
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    start: Vec2,
    end: Vec2,
    normal: Vec2,
}

impl Edge {
    fn new(start: Vec2, end: Vec2, center: Vec2) -> Self {
        let direction = end - start;
        let normal = Vec2::new(direction.y, -direction.x).normalize_or_zero();
        let outward = (start + end) * 0.5 - center;
        let normal = if normal.dot(outward) < 0.0 {
            -normal
        } else {
            normal
        };
        Self { start, end, normal }
    }

    /// Positive outside the edge, negative on the inner side.
    fn signed_distance(&self, point: Vec2) -> f32 {
        (point - self.start).dot(self.normal)
    }

    fn closest_point(&self, point: Vec2) -> Vec2 {
        let direction = self.end - self.start;
        let length_squared = direction.length_squared();
        if length_squared == 0.0 {
            return self.start;
        }
        let t = ((point - self.start).dot(direction) / length_squared).clamp(0.0, 1.0);
        self.start + direction * t
    }
}

/// Pure grid/world coordinate transform supplied by the presentation layer.
///
/// `grid_to_world` maps a cell to the world position of its center and
/// `world_to_grid` rounds a world position back to the nearest cell, so the
/// two round-trip for every cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Orthogonal layout where each tile is an axis-aligned rectangle.
    TopDown {
        /// Width of a tile in world units.
        tile_width: f32,
        /// Height of a tile in world units.
        tile_height: f32,
    },
    /// Diamond layout where columns run down-right and rows run down-left.
    Isometric {
        /// Width of a tile diamond in world units.
        tile_width: f32,
        /// Height of a tile diamond in world units.
        tile_height: f32,
    },
}

impl Projection {
    /// Size of a tile in world units.
    #[must_use]
    pub fn tile_size(&self) -> Vec2 {
        match *self {
            Self::TopDown {
                tile_width,
                tile_height,
            }
            | Self::Isometric {
                tile_width,
                tile_height,
            } => Vec2::new(tile_width, tile_height),
        }
    }

    /// World position of the center of `cell`.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridPosition) -> Vec2 {
        let column = cell.column() as f32;
        let row = cell.row() as f32;
        match *self {
            Self::TopDown {
                tile_width,
                tile_height,
            } => Vec2::new(column * tile_width, row * tile_height),
            Self::Isometric {
                tile_width,
                tile_height,
            } => Vec2::new(
                (column - row) * (tile_width * 0.5),
                (column + row) * (tile_height * 0.5),
            ),
        }
    }

    /// Grid cell nearest to the provided world position.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> GridPosition {
        let (column, row) = match *self {
            Self::TopDown {
                tile_width,
                tile_height,
            } => (position.x / tile_width, position.y / tile_height),
            Self::Isometric {
                tile_width,
                tile_height,
            } => {
                let x = position.x / (tile_width * 0.5);
                let y = position.y / (tile_height * 0.5);
                ((x + y) * 0.5, (y - x) * 0.5)
            }
        };
        GridPosition::new(column.round() as i32, row.round() as i32)
    }

    /// World-space outline of the tile at `cell`, used when colliding against walls.
    #[must_use]
    pub fn tile_shape(&self, cell: GridPosition) -> TileShape {
        let center = self.grid_to_world(cell);
        let half = self.tile_size() * 0.5;
        let offsets = match self {
            Self::TopDown { .. } => [
                Vec2::new(-half.x, -half.y),
                Vec2::new(half.x, -half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(-half.x, half.y),
            ],
            Self::Isometric { .. } => [
                Vec2::new(0.0, -half.y),
                Vec2::new(half.x, 0.0),
                Vec2::new(0.0, half.y),
                Vec2::new(-half.x, 0.0),
            ],
        };
        TileShape::new(offsets.map(|offset| center + offset))
    }

    /// World-space rectangle enclosing the tile at `cell`.
    #[must_use]
    pub fn tile_bounds(&self, cell: GridPosition) -> Aabb {
        self.tile_shape(cell).bounds()
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::Isometric {
            tile_width: 64.0,
            tile_height: 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Aabb, GridPosition, Projection, TileType};
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn chebyshev_distance_matches_expectation() {
        let origin = GridPosition::new(1, 1);
        let destination = GridPosition::new(4, 7);
        assert_eq!(origin.chebyshev_distance(destination), 6);
        assert_eq!(destination.chebyshev_distance(origin), 6);
    }

    #[test]
    fn only_floor_is_walkable() {
        assert!(TileType::Floor.is_walkable());
        assert!(!TileType::Wall.is_walkable());
    }

    #[test]
    fn projections_round_trip_every_cell() {
        let projections = [
            Projection::TopDown {
                tile_width: 32.0,
                tile_height: 32.0,
            },
            Projection::default(),
        ];
        for projection in projections {
            for column in -3..12 {
                for row in -3..12 {
                    let cell = GridPosition::new(column, row);
                    let world = projection.grid_to_world(cell);
                    assert_eq!(projection.world_to_grid(world), cell, "{projection:?}");
                }
            }
        }
    }

    #[test]
    fn isometric_projection_matches_diamond_layout() {
        let projection = Projection::default();
        let world = projection.grid_to_world(GridPosition::new(3, 1));
        assert_eq!(world, Vec2::new(64.0, 64.0));
    }

    #[test]
    fn isometric_tile_shape_is_the_diamond() {
        let projection = Projection::default();
        let shape = projection.tile_shape(GridPosition::new(0, 0));
        assert_eq!(
            shape.corners(),
            [
                Vec2::new(0.0, -16.0),
                Vec2::new(32.0, 0.0),
                Vec2::new(0.0, 16.0),
                Vec2::new(-32.0, 0.0),
            ]
        );
        assert_eq!(shape.bounds().min(), Vec2::new(-32.0, -16.0));
        assert_eq!(shape.bounds().max(), Vec2::new(32.0, 16.0));
        assert!(shape.contains(Vec2::new(15.0, 7.0)));
        assert!(!shape.contains(Vec2::new(20.0, 10.0)));
    }

    #[test]
    fn points_inside_a_tile_shape_map_to_that_tile() {
        let projections = [
            Projection::TopDown {
                tile_width: 32.0,
                tile_height: 32.0,
            },
            Projection::default(),
        ];
        let cell = GridPosition::new(4, 3);
        for projection in projections {
            let shape = projection.tile_shape(cell);
            let bounds = shape.bounds();
            for step_x in 0..=20 {
                for step_y in 0..=20 {
                    let point = bounds.min()
                        + (bounds.max() - bounds.min())
                            * Vec2::new(step_x as f32 + 0.5, step_y as f32 + 0.5)
                            / 21.0;
                    let inside = shape.contains(point);
                    assert_eq!(
                        projection.world_to_grid(point) == cell,
                        inside,
                        "{projection:?} {point:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn closest_point_on_a_diamond_lies_on_its_edge() {
        let shape = Projection::default().tile_shape(GridPosition::new(0, 0));
        assert_eq!(shape.closest_point(Vec2::new(40.0, 0.0)), Vec2::new(32.0, 0.0));
        assert_eq!(shape.closest_point(Vec2::new(1.0, 2.0)), Vec2::new(1.0, 2.0));

        let outside = Vec2::new(20.0, 20.0);
        let closest = shape.closest_point(outside);
        assert!((closest.x / 32.0 + closest.y / 16.0 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn nearest_edge_names_the_shortest_way_out() {
        let square = Projection::TopDown {
            tile_width: 32.0,
            tile_height: 32.0,
        }
        .tile_shape(GridPosition::new(2, 2));
        assert_eq!(
            square.nearest_edge(Vec2::new(60.0, 64.0)),
            (Vec2::NEG_X, Vec2::new(48.0, 64.0))
        );
        assert_eq!(
            square.nearest_edge(Vec2::new(64.0, 78.0)),
            (Vec2::Y, Vec2::new(64.0, 80.0))
        );

        let diamond = Projection::default().tile_shape(GridPosition::new(0, 0));
        let (normal, foot) = diamond.nearest_edge(Vec2::new(-10.0, 2.5));
        assert!(normal.x < 0.0 && normal.y > 0.0, "{normal:?}");
        assert!((-foot.x / 32.0 + foot.y / 16.0 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn closest_point_clamps_to_rectangle() {
        let rect = Aabb::from_center_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert_eq!(rect.closest_point(Vec2::new(20.0, 1.0)), Vec2::new(5.0, 1.0));
        assert_eq!(rect.closest_point(Vec2::new(1.0, 2.0)), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn touching_rectangles_intersect() {
        let left = Aabb::from_center_size(Vec2::ZERO, Vec2::new(2.0, 2.0));
        let right = Aabb::from_center_size(Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0));
        let far = Aabb::from_center_size(Vec2::new(2.5, 0.0), Vec2::new(0.5, 0.5));
        assert!(left.intersects(&right));
        assert!(!left.intersects(&far));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_position_round_trips_through_bincode() {
        assert_round_trip(&GridPosition::new(-4, 9));
    }

    #[test]
    fn tile_type_round_trips_through_bincode() {
        assert_round_trip(&TileType::Wall);
    }
}
