//! Run state and core simulation types
//!
//! Everything a run mutates lives in [`RunState`]. The host owns exactly one
//! and advances it with [`super::tick()`]; renderers read a [`Snapshot`].

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::{CameraRig, CameraTarget};
use super::collision::Hitbox;
use super::obstacles::ObstacleSet;
use super::player::{Player, PlayerPose};
use super::spawner::Spawner;
use crate::level::{ConfigError, LevelConfig};
use crate::{clamp_lane, lane_to_x};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunStatus {
    /// Waiting for `start`
    #[default]
    Idle,
    /// Active gameplay
    Playing,
    /// Collided; frozen until `reset`
    Ended,
}

/// What the player is currently doing. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerAction {
    #[default]
    Idle,
    Run,
    Jump,
    Slide,
    Roll,
    Hit,
}

impl PlayerAction {
    /// Sliding and rolling shrink the hitbox
    pub fn is_crouched(self) -> bool {
        matches!(self, PlayerAction::Slide | PlayerAction::Roll)
    }
}

/// Obstacle types, each defeated by a different move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleType {
    /// Knee-high block, jump over it
    Low,
    /// Overhead bar, slide or roll under it
    High,
    /// Wide low barrier, roll through it
    Wide,
    /// Hole in the track, be airborne over it
    Pit,
    /// Full-height wall, change lanes
    Wall,
}

/// Fixed per-type obstacle dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleGeometry {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub y_offset: f32,
}

impl ObstacleType {
    pub fn geometry(self) -> ObstacleGeometry {
        let base = ObstacleGeometry {
            width: 1.5,
            height: 1.0,
            depth: 1.0,
            y_offset: 0.0,
        };
        match self {
            ObstacleType::Low => ObstacleGeometry {
                height: 0.8,
                ..base
            },
            ObstacleType::High => ObstacleGeometry {
                height: 0.8,
                y_offset: 1.6,
                ..base
            },
            ObstacleType::Wide => ObstacleGeometry {
                width: 3.0,
                height: 0.8,
                ..base
            },
            ObstacleType::Wall => ObstacleGeometry {
                height: 3.0,
                ..base
            },
            ObstacleType::Pit => ObstacleGeometry {
                height: 0.1,
                depth: 4.0,
                y_offset: -0.1,
                ..base
            },
        }
    }
}

/// An obstacle on the track. Obstacles never move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Stable identity, usable as a render key
    pub id: u32,
    pub kind: ObstacleType,
    pub lane: i8,
    pub world_z: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub y_offset: f32,
}

impl Obstacle {
    /// Build an obstacle with its type's fixed geometry
    pub fn new(id: u32, kind: ObstacleType, lane: i8, world_z: f32) -> Self {
        let g = kind.geometry();
        Self {
            id,
            kind,
            lane: clamp_lane(lane),
            world_z,
            width: g.width,
            height: g.height,
            depth: g.depth,
            y_offset: g.y_offset,
        }
    }

    /// Min/max corners of the obstacle volume
    pub fn bounds(&self, lane_width: f32) -> (Vec3, Vec3) {
        let x = lane_to_x(self.lane, lane_width);
        (
            Vec3::new(
                x - self.width / 2.0,
                self.y_offset,
                self.world_z - self.depth / 2.0,
            ),
            Vec3::new(
                x + self.width / 2.0,
                self.y_offset + self.height,
                self.world_z + self.depth / 2.0,
            ),
        )
    }
}

/// Things that happened during a frame, drained by the host for audio/UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted { seed: u64 },
    Jumped,
    Landed,
    Slid,
    Rolled,
    LaneChanged { lane: i8 },
    ObstacleSpawned { id: u32, kind: ObstacleType, lane: i8 },
    Collision { obstacle_id: u32, kind: ObstacleType },
    RunEnded { score: u64, distance: f32 },
    NewHighScore { score: u64 },
}

/// Immutable per-frame view for renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: RunStatus,
    pub pose: PlayerPose,
    pub action: PlayerAction,
    pub hitbox: Hitbox,
    pub obstacles: Vec<Obstacle>,
    pub camera: CameraTarget,
    pub score: u64,
}

/// Complete simulation context for one player
#[derive(Debug, Clone)]
pub struct RunState {
    /// Seed the RNG streams were derived from
    pub seed: u64,
    pub config: LevelConfig,
    pub status: RunStatus,
    pub player: Player,
    pub obstacles: ObstacleSet,
    pub spawner: Spawner,
    pub camera: CameraRig,
    pub score: u64,
    /// Seconds since the run started
    pub elapsed: f32,
    /// Obstacles created this run (including evicted ones)
    pub spawned_total: u32,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Time banked toward the next score point
    pub(crate) score_clock: f32,
    pub(crate) rng: Pcg32,
}

impl RunState {
    /// Create an idle run. Fails only on an invalid level.
    pub fn new(config: LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let spawner = Spawner::new(&config)?;
        Ok(Self {
            seed,
            player: Player::new(config.player, config.lane_width),
            obstacles: ObstacleSet::new(),
            spawner,
            camera: CameraRig::new(seed),
            status: RunStatus::Idle,
            score: 0,
            elapsed: 0.0,
            spawned_total: 0,
            events: Vec::new(),
            score_clock: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            config,
        })
    }

    /// Idle -> Playing, discarding everything from the previous run
    pub fn start(&mut self) -> bool {
        if self.status != RunStatus::Idle {
            log::debug!("start ignored in {:?}", self.status);
            return false;
        }
        self.clear_run();
        self.player.begin_run();
        self.status = RunStatus::Playing;
        self.events.push(GameEvent::RunStarted { seed: self.seed });
        log::info!("Run started");
        true
    }

    /// Back to Idle. Returns the score of the run being discarded.
    pub fn reset(&mut self) -> Option<u64> {
        if self.status == RunStatus::Idle {
            return None;
        }
        let final_score = self.score;
        self.clear_run();
        self.status = RunStatus::Idle;
        Some(final_score)
    }

    /// Playing -> Ended on collision
    pub(crate) fn end_run(&mut self, obstacle_id: u32, kind: ObstacleType) {
        self.status = RunStatus::Ended;
        self.player.hit();
        self.camera.trigger_shake();
        self.events.push(GameEvent::Collision { obstacle_id, kind });
        self.events.push(GameEvent::RunEnded {
            score: self.score,
            distance: self.player.pose.distance,
        });
        log::info!(
            "Run ended: hit {:?} #{} at distance {:.1}, score {}",
            kind,
            obstacle_id,
            self.player.pose.distance,
            self.score
        );
    }

    fn clear_run(&mut self) {
        self.player.reset();
        self.obstacles.clear();
        self.spawner.reset();
        self.score = 0;
        self.score_clock = 0.0;
        self.elapsed = 0.0;
        self.spawned_total = 0;
        self.camera.reset(&self.player.pose);
    }

    /// Current player hitbox
    pub fn hitbox(&self) -> Hitbox {
        self.player.hitbox()
    }

    /// Copy out everything a renderer needs
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            pose: self.player.pose,
            action: self.player.action,
            hitbox: self.hitbox(),
            obstacles: self.obstacles.as_slice().to_vec(),
            camera: self.camera.target(),
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_table() {
        let pit = ObstacleType::Pit.geometry();
        assert_eq!(pit.depth, 4.0);
        assert!(pit.height < 0.2);

        let high = ObstacleType::High.geometry();
        assert!(high.y_offset > crate::consts::PLAYER_CROUCH_HEIGHT);
        assert!(high.y_offset < crate::consts::PLAYER_HEIGHT);

        let wall = ObstacleType::Wall.geometry();
        assert!(wall.height > 2.4, "wall must be taller than a jump apex");

        assert!(ObstacleType::Wide.geometry().width > ObstacleType::Low.geometry().width);
    }

    #[test]
    fn test_obstacle_lane_clamped() {
        let o = Obstacle::new(1, ObstacleType::Low, 4, -40.0);
        assert_eq!(o.lane, 1);
    }

    #[test]
    fn test_obstacle_bounds() {
        let o = Obstacle::new(1, ObstacleType::High, -1, -10.0);
        let (min, max) = o.bounds(2.0);
        assert_eq!(min, Vec3::new(-2.75, 1.6, -10.5));
        assert!((max.y - 2.4).abs() < 1e-6);
        assert_eq!(max.x, -1.25);
        assert_eq!(max.z, -9.5);
    }

    #[test]
    fn test_start_only_from_idle() {
        let mut state = RunState::new(LevelConfig::default(), 7).unwrap();
        assert_eq!(state.status, RunStatus::Idle);
        assert!(state.start());
        assert_eq!(state.status, RunStatus::Playing);
        assert_eq!(state.player.action, PlayerAction::Run);
        assert!(!state.start());
        assert_eq!(state.events, vec![GameEvent::RunStarted { seed: 7 }]);
    }

    #[test]
    fn test_reset_returns_score_and_clears() {
        let mut state = RunState::new(LevelConfig::default(), 7).unwrap();
        assert_eq!(state.reset(), None);

        state.start();
        state.score = 42;
        state
            .obstacles
            .insert(Obstacle::new(99, ObstacleType::Wall, 0, -20.0));
        state.end_run(99, ObstacleType::Wall);
        assert_eq!(state.status, RunStatus::Ended);
        assert_eq!(state.player.action, PlayerAction::Hit);

        assert_eq!(state.reset(), Some(42));
        assert_eq!(state.status, RunStatus::Idle);
        assert_eq!(state.score, 0);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.player.action, PlayerAction::Idle);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut state = RunState::new(LevelConfig::default(), 7).unwrap();
        state.start();
        state
            .obstacles
            .insert(Obstacle::new(5, ObstacleType::Low, 0, -30.0));
        let snap = state.snapshot();
        state.obstacles.clear();
        assert_eq!(snap.obstacles.len(), 1);
        assert_eq!(snap.obstacles[0].id, 5);
        assert_eq!(snap.status, RunStatus::Playing);
    }
}
