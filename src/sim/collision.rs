//! Action-aware collision detection
//!
//! Plain AABB overlap decides whether the player and an obstacle share
//! lateral and forward space. Whether that counts as a crash then depends on
//! the obstacle type and on what the player is doing: pits only catch
//! grounded players, wide barriers let rollers through, walls stop everyone.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::{Obstacle, ObstacleType, PlayerAction};
use crate::consts::{COLLISION_WINDOW, PIT_CLEARANCE};

/// Player collision volume, rebuilt every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Hitbox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.max(Vec3::ZERO),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Height of the feet above the track
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y - self.half_extents.y
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y + self.half_extents.y
    }
}

/// Strict interval overlap; touching edges do not collide
#[inline]
fn overlaps(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    a_min < b_max && a_max > b_min
}

/// Does the player crash into this obstacle?
///
/// Pure: the result depends only on the arguments. The action is passed in
/// explicitly and never inferred from the hitbox shape.
pub fn check_collision(
    hitbox: &Hitbox,
    obstacle: &Obstacle,
    action: PlayerAction,
    lane_width: f32,
) -> bool {
    let (p_min, p_max) = (hitbox.min(), hitbox.max());
    let (o_min, o_max) = obstacle.bounds(lane_width);

    if !overlaps(p_min.x, p_max.x, o_min.x, o_max.x)
        || !overlaps(p_min.z, p_max.z, o_min.z, o_max.z)
    {
        return false;
    }

    let overlap_y = overlaps(p_min.y, p_max.y, o_min.y, o_max.y);

    match obstacle.kind {
        // Falling in: only feet near the ground count, box height is irrelevant
        ObstacleType::Pit => hitbox.bottom() < PIT_CLEARANCE,
        ObstacleType::Wide if action == PlayerAction::Roll => false,
        ObstacleType::High | ObstacleType::Wide | ObstacleType::Wall | ObstacleType::Low => {
            overlap_y
        }
    }
}

/// Is the obstacle close enough along Z to be worth testing?
#[inline]
pub fn in_collision_window(obstacle: &Obstacle, player_z: f32) -> bool {
    (obstacle.world_z - player_z).abs() <= COLLISION_WINDOW + obstacle.depth / 2.0
}

/// First obstacle (in set order) the player crashes into
pub fn find_collision<'a>(
    hitbox: &Hitbox,
    action: PlayerAction,
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
    lane_width: f32,
) -> Option<&'a Obstacle> {
    let player_z = hitbox.center.z;
    obstacles
        .into_iter()
        .filter(|o| in_collision_window(o, player_z))
        .find(|o| check_collision(hitbox, o, action, lane_width))
}
