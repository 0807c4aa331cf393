//! Live obstacle set
//!
//! Insertion-ordered (spawn order), unique by id. Obstacles sit at negative Z
//! and the player runs toward -Z, so anything whose Z is now greater than the
//! player's plus a margin has been passed and is dropped.

use super::state::Obstacle;

#[derive(Debug, Clone, Default)]
pub struct ObstacleSet {
    items: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an obstacle. Duplicate ids are rejected.
    pub fn insert(&mut self, obstacle: Obstacle) -> bool {
        if self.items.iter().any(|o| o.id == obstacle.id) {
            log::warn!("Rejected duplicate obstacle id {}", obstacle.id);
            return false;
        }
        self.items.push(obstacle);
        true
    }

    /// Drop every obstacle the player has left more than `margin` behind.
    /// Returns how many were removed.
    pub fn evict_passed(&mut self, player_z: f32, margin: f32) -> usize {
        let before = self.items.len();
        let limit = player_z + margin;
        self.items.retain(|o| o.world_z <= limit);
        before - self.items.len()
    }

    pub fn get(&self, id: u32) -> Option<&Obstacle> {
        self.items.iter().find(|o| o.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Obstacle> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Obstacle] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a ObstacleSet {
    type Item = &'a Obstacle;
    type IntoIter = std::slice::Iter<'a, Obstacle>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
