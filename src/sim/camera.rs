//! Follow camera
//!
//! Trails behind and above the player, looking down the track. A crash
//! kicks off a short shake; the jitter comes from its own RNG stream so
//! cosmetic randomness never shifts gameplay draws.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::player::PlayerPose;
use crate::consts::*;

/// Salt for the cosmetic RNG stream
const SHAKE_STREAM: u64 = 0x5348_414b_4521;

/// Where the renderer should put the camera this frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraTarget {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Unsmoothed rig placement for a pose
pub fn follow_target(pose: &PlayerPose) -> CameraTarget {
    let z = pose.world_z();
    CameraTarget {
        position: Vec3::new(0.0, CAMERA_HEIGHT, z + CAMERA_TRAIL),
        look_at: Vec3::new(0.0, 0.0, z - CAMERA_LOOK_AHEAD),
    }
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Smoothed position without shake
    position: Vec3,
    /// Last published target, shake included
    current: CameraTarget,
    /// Shake amplitude, 0..=1
    shake: f32,
    shake_enabled: bool,
    rng: Pcg32,
}

impl CameraRig {
    pub fn new(seed: u64) -> Self {
        let target = follow_target(&PlayerPose::default());
        Self {
            position: target.position,
            current: target,
            shake: 0.0,
            shake_enabled: true,
            rng: Pcg32::seed_from_u64(seed ^ SHAKE_STREAM),
        }
    }

    pub fn set_shake_enabled(&mut self, enabled: bool) {
        self.shake_enabled = enabled;
        if !enabled {
            self.shake = 0.0;
        }
    }

    /// Snap to the player with no smoothing or shake
    pub fn reset(&mut self, pose: &PlayerPose) {
        let target = follow_target(pose);
        self.position = target.position;
        self.current = target;
        self.shake = 0.0;
    }

    pub fn trigger_shake(&mut self) {
        if self.shake_enabled {
            self.shake = self.shake.max(1.0);
        }
    }

    pub fn shake(&self) -> f32 {
        self.shake
    }

    pub fn target(&self) -> CameraTarget {
        self.current
    }

    /// Advance smoothing and shake by one frame
    pub fn resolve(&mut self, pose: &PlayerPose, dt: f32) -> CameraTarget {
        let goal = follow_target(pose);
        let t = 1.0 - (-CAMERA_FOLLOW_RATE * dt).exp();
        self.position = self.position.lerp(goal.position, t);

        let mut position = self.position;
        if self.shake > 0.0 {
            self.shake *= (-SHAKE_DECAY_RATE * dt).exp();
            if self.shake < 0.001 {
                self.shake = 0.0;
            }
            let jitter = Vec3::new(
                self.rng.random::<f32>() - 0.5,
                self.rng.random::<f32>() - 0.5,
                self.rng.random::<f32>() - 0.5,
            );
            position += jitter * self.shake;
        }

        self.current = CameraTarget {
            position,
            look_at: goal.look_at,
        };
        self.current
    }
}
