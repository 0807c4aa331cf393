//! Block Runner - A three-lane endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation kernel (kinematics, spawning, collisions, run status)
//! - `game`: Command surface for hosts (start/reset, intents, snapshots, high score)
//! - `level`: Data-driven level configuration
//! - `highscores`: High score persistence backends
//! - `input`: Keyboard and swipe mappings to intents
//! - `settings`: Player preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod game;
pub mod highscores;
pub mod input;
pub mod level;
pub mod settings;
pub mod sim;

pub use game::{Game, Hud};
pub use highscores::{HighScoreStore, MemoryHighScoreStore, StorageError};
pub use level::{ConfigError, LevelConfig};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Lowest and highest lane index
    pub const LANE_MIN: i8 = -1;
    pub const LANE_MAX: i8 = 1;

    /// Player hitbox dimensions (world units)
    pub const PLAYER_WIDTH: f32 = 0.8;
    pub const PLAYER_DEPTH: f32 = 0.8;
    pub const PLAYER_HEIGHT: f32 = 1.8;
    /// Hitbox height while sliding or rolling
    pub const PLAYER_CROUCH_HEIGHT: f32 = 0.8;

    /// Player must be at least this high to cross a pit
    pub const PIT_CLEARANCE: f32 = 0.5;
    /// Obstacles further than this (plus half their depth) from the player are not tested
    pub const COLLISION_WINDOW: f32 = 2.0;

    /// Largest integration step for the lane spring
    pub const SPRING_MAX_STEP: f32 = 1.0 / 120.0;
    /// Shortest touch travel (px) that counts as a swipe
    pub const SWIPE_THRESHOLD: f32 = 30.0;

    /// Longest simulation step; longer frames are sub-stepped
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Furthest the player may travel between two collision checks
    pub const MAX_STEP_DISTANCE: f32 = PLAYER_DEPTH;
    /// Sub-step cap for absurd frame lengths
    pub const MAX_SUBSTEPS: u32 = 1024;

    /// Camera rig offsets relative to the player
    pub const CAMERA_HEIGHT: f32 = 4.5;
    pub const CAMERA_TRAIL: f32 = 7.0;
    pub const CAMERA_LOOK_AHEAD: f32 = 8.0;
    /// Exponential follow rate (1/s)
    pub const CAMERA_FOLLOW_RATE: f32 = 6.0;
    /// Shake decay rate (1/s)
    pub const SHAKE_DECAY_RATE: f32 = 2.0;
}

/// Frame-rate independent exponential approach of `current` toward `target`
#[inline]
pub fn damp(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * (1.0 - (-rate * dt).exp())
}

/// World X of a lane center
#[inline]
pub fn lane_to_x(lane: i8, lane_width: f32) -> f32 {
    f32::from(lane) * lane_width
}

/// Clamp any lane index into the playable range
#[inline]
pub fn clamp_lane(lane: i8) -> i8 {
    lane.clamp(consts::LANE_MIN, consts::LANE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damp_converges() {
        let mut x = 0.0;
        for _ in 0..600 {
            x = damp(x, 10.0, 6.0, 1.0 / 60.0);
        }
        assert!((x - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_damp_zero_dt_is_identity() {
        assert_eq!(damp(3.0, 10.0, 6.0, 0.0), 3.0);
    }

    #[test]
    fn test_lane_helpers() {
        assert_eq!(lane_to_x(-1, 2.0), -2.0);
        assert_eq!(lane_to_x(1, 2.0), 2.0);
        assert_eq!(clamp_lane(5), 1);
        assert_eq!(clamp_lane(-7), -1);
    }
}
