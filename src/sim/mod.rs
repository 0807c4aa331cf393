//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same level, seed, intents and
//! frame deltas, a run replays identically:
//! - Seeded RNG only (the camera shake draws from its own stream)
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies

pub mod autopilot;
pub mod camera;
pub mod collision;
pub mod obstacles;
pub mod player;
pub mod spawner;
pub mod state;
pub mod tick;

pub use autopilot::choose_intent;
pub use camera::{CameraRig, CameraTarget, follow_target};
pub use collision::{Hitbox, check_collision, find_collision, in_collision_window};
pub use obstacles::ObstacleSet;
pub use player::{Intent, Orientation, Player, PlayerPose};
pub use spawner::{Spawner, WeightTable};
pub use state::{
    GameEvent, Obstacle, ObstacleGeometry, ObstacleType, PlayerAction, RunState, RunStatus,
    Snapshot,
};
pub use tick::{TickInput, tick};
