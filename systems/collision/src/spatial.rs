//! Uniform spatial hash used as the collision broad phase.

use std::collections::HashMap;

use glam::Vec2;
use thiserror::Error;
use tilewalk_core::Aabb;
use tilewalk_system_movement::Agent;

/// Errors emitted while configuring the spatial index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Integer coordinate of a spatial hash bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    x: i32,
    y: i32,
}

impl CellKey {
    /// Creates a bucket coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal bucket index.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical bucket index.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Buckets agent indices by the cell their center falls into.
///
/// The index stores positions into the agent slice it was rebuilt from and is
/// meant to be cleared and refilled once per collision pass.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    cell_size: f32,
    buckets: HashMap<CellKey, Vec<usize>>,
    entries: usize,
}

impl SpatialIndex {
    /// Creates an empty index with square buckets of `cell_size` world units.
    pub fn new(cell_size: f32) -> Result<Self, IndexError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(IndexError::InvalidConfig("cell_size must be positive"));
        }

        Ok(Self {
            cell_size,
            buckets: HashMap::new(),
            entries: 0,
        })
    }

    /// Edge length of a bucket in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Bucket containing `position`.
    #[must_use]
    pub fn cell_key(&self, position: Vec2) -> CellKey {
        let scaled = (position / self.cell_size).floor();
        CellKey::new(scaled.x as i32, scaled.y as i32)
    }

    /// Records that agent `index` stands at `position`.
    pub fn insert(&mut self, index: usize, position: Vec2) {
        let key = self.cell_key(position);
        self.buckets.entry(key).or_default().push(index);
        self.entries += 1;
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.entries = 0;
    }

    /// Clears the index and inserts every agent at its current position.
    pub fn rebuild(&mut self, agents: &[Agent]) {
        self.clear();
        for (index, agent) in agents.iter().enumerate() {
            self.insert(index, agent.position());
        }
    }

    /// Collects the agents stored in any bucket overlapped by `bounds`.
    ///
    /// The output buffer is cleared first and filled in ascending index order
    /// without duplicates.
    pub fn query_nearby(&self, bounds: &Aabb, out: &mut Vec<usize>) {
        out.clear();
        let min = self.cell_key(bounds.min());
        let max = self.cell_key(bounds.max());
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                if let Some(bucket) = self.buckets.get(&CellKey::new(x, y)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    /// Number of stored entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    /// Reports whether the index holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_cell_size() {
        assert_eq!(
            SpatialIndex::new(0.0).err(),
            Some(IndexError::InvalidConfig("cell_size must be positive"))
        );
        assert!(SpatialIndex::new(-4.0).is_err());
        assert!(SpatialIndex::new(f32::NAN).is_err());
    }

    #[test]
    fn cell_keys_floor_towards_negative_infinity() {
        let index = SpatialIndex::new(64.0).expect("index");
        assert_eq!(index.cell_key(Vec2::new(0.0, 63.9)), CellKey::new(0, 0));
        assert_eq!(index.cell_key(Vec2::new(-1.0, 65.0)), CellKey::new(-1, 1));
        assert_eq!(index.cell_key(Vec2::new(-64.0, -64.5)), CellKey::new(-1, -2));
    }

    #[test]
    fn query_unions_every_overlapped_bucket() {
        let mut index = SpatialIndex::new(10.0).expect("index");
        index.insert(3, Vec2::new(5.0, 5.0));
        index.insert(0, Vec2::new(15.0, 5.0));
        index.insert(1, Vec2::new(35.0, 5.0));
        index.insert(2, Vec2::new(5.0, 15.0));
        assert_eq!(index.len(), 4);

        let mut nearby = vec![99];
        index.query_nearby(
            &Aabb::from_center_size(Vec2::new(10.0, 10.0), Vec2::splat(8.0)),
            &mut nearby,
        );
        assert_eq!(nearby, vec![0, 2, 3]);

        index.clear();
        assert!(index.is_empty());
        index.query_nearby(
            &Aabb::from_center_size(Vec2::new(10.0, 10.0), Vec2::splat(8.0)),
            &mut nearby,
        );
        assert!(nearby.is_empty());
    }
}
