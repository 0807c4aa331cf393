//! Level configuration
//!
//! Data-driven balance: lane layout, run speed, spawn cadence, obstacle
//! weights, scripted waves and player tuning. Loaded from JSON once at
//! startup; a malformed level is a fatal error, never a per-frame condition.

use serde::{Deserialize, Serialize};

use crate::consts::{LANE_MAX, LANE_MIN};
use crate::sim::ObstacleType;

/// The level shipped with the game
const BUILTIN_LEVEL: &str = include_str!("../levels/default.json");

/// How the spawner chooses obstacles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnMode {
    /// Weighted-random draws only
    #[default]
    Weighted,
    /// Scripted waves at time checkpoints, weighted-random in between
    Waves,
}

/// One obstacle in a scripted wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveEntry {
    #[serde(rename = "type")]
    pub kind: ObstacleType,
    pub lane: i8,
}

/// A scripted wave fired once per run when elapsed time reaches `time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Seconds since run start
    pub time: f32,
    pub pattern: Vec<WaveEntry>,
}

/// Relative spawn weights per obstacle type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleWeights {
    pub low: f32,
    pub high: f32,
    pub wide: f32,
    pub pit: f32,
    pub wall: f32,
}

impl Default for ObstacleWeights {
    fn default() -> Self {
        Self {
            low: 0.35,
            high: 0.25,
            wide: 0.15,
            pit: 0.15,
            wall: 0.1,
        }
    }
}

impl ObstacleWeights {
    /// Weights in table order (the order the cumulative table accumulates)
    pub fn entries(&self) -> [(ObstacleType, f32); 5] {
        [
            (ObstacleType::Low, self.low),
            (ObstacleType::High, self.high),
            (ObstacleType::Wide, self.wide),
            (ObstacleType::Pit, self.pit),
            (ObstacleType::Wall, self.wall),
        ]
    }
}

/// Player physics and action timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerTuning {
    /// Vertical acceleration (units/s², negative is down)
    pub gravity: f32,
    /// Vertical velocity applied on jump
    pub jump_impulse: f32,
    pub slide_duration: f32,
    pub roll_duration: f32,
    /// How long an airborne jump press stays buffered
    pub input_buffer: f32,
    /// Lane spring stiffness
    pub spring_tension: f32,
    /// Lane spring damping
    pub spring_friction: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            gravity: -30.0,
            jump_impulse: 12.0,
            slide_duration: 0.7,
            roll_duration: 0.6,
            input_buffer: 0.15,
            spring_tension: 180.0,
            spring_friction: 24.0,
        }
    }
}

/// Complete level description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelConfig {
    /// Distance between lane centers
    pub lane_width: f32,
    /// Forward speed (units/s)
    pub speed: f32,
    /// Seconds of travel between weighted spawns
    pub spawn_interval: f32,
    /// How far ahead of the player obstacles appear
    pub spawn_lookahead: f32,
    /// How far behind the player obstacles survive
    pub cull_margin: f32,
    /// One score point per interval survived
    pub score_tick_interval: f32,
    pub spawn_mode: SpawnMode,
    pub waves: Vec<Wave>,
    pub obstacle_weights: ObstacleWeights,
    pub player: PlayerTuning,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            lane_width: 2.0,
            speed: 8.0,
            spawn_interval: 1.2,
            spawn_lookahead: 40.0,
            cull_margin: 10.0,
            score_tick_interval: 0.1,
            spawn_mode: SpawnMode::Weighted,
            waves: Vec::new(),
            obstacle_weights: ObstacleWeights::default(),
            player: PlayerTuning::default(),
        }
    }
}

impl LevelConfig {
    /// Load the embedded default level
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_LEVEL)
    }

    /// Parse and validate a level. Waves are sorted by time.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: LevelConfig = serde_json::from_str(json)?;
        config
            .waves
            .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
        config.validate()?;
        log::info!(
            "Level loaded: speed={}, spawn_interval={}, {} waves ({:?})",
            config.speed,
            config.spawn_interval,
            config.waves.len(),
            config.spawn_mode
        );
        Ok(config)
    }

    /// Read, parse and validate a level file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// World distance between consecutive weighted spawns
    pub fn spawn_gap(&self) -> f32 {
        self.spawn_interval * self.speed
    }

    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("laneWidth", self.lane_width)?;
        positive("speed", self.speed)?;
        positive("spawnInterval", self.spawn_interval)?;
        positive("spawnLookahead", self.spawn_lookahead)?;
        positive("scoreTickInterval", self.score_tick_interval)?;
        finite("cullMargin", self.cull_margin)?;
        if self.cull_margin < 0.0 {
            return Err(ConfigError::Negative {
                field: "cullMargin",
                value: self.cull_margin,
            });
        }

        let mut total = 0.0;
        for (kind, weight) in self.obstacle_weights.entries() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { kind, weight });
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(ConfigError::EmptyWeights);
        }

        for wave in &self.waves {
            finite("waves.time", wave.time)?;
            if let Some(entry) = wave
                .pattern
                .iter()
                .find(|e| !(LANE_MIN..=LANE_MAX).contains(&e.lane))
            {
                return Err(ConfigError::WaveLane {
                    time: wave.time,
                    lane: entry.lane,
                });
            }
        }

        let p = &self.player;
        finite("player.gravity", p.gravity)?;
        positive("player.jumpImpulse", p.jump_impulse)?;
        positive("player.slideDuration", p.slide_duration)?;
        positive("player.rollDuration", p.roll_duration)?;
        finite("player.inputBuffer", p.input_buffer)?;
        positive("player.springTension", p.spring_tension)?;
        finite("player.springFriction", p.spring_friction)?;
        if p.gravity >= 0.0 {
            return Err(ConfigError::UpwardGravity(p.gravity));
        }
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Fatal level configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Level file could not be read
    Io(std::io::Error),
    Parse(serde_json::Error),
    NonFinite { field: &'static str },
    NonPositive { field: &'static str, value: f32 },
    Negative { field: &'static str, value: f32 },
    InvalidWeight { kind: ObstacleType, weight: f32 },
    EmptyWeights,
    WaveLane { time: f32, lane: i8 },
    UpwardGravity(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Level read error: {e}"),
            ConfigError::Parse(e) => write!(f, "Level parse error: {e}"),
            ConfigError::NonFinite { field } => write!(f, "{field} must be finite"),
            ConfigError::NonPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            ConfigError::InvalidWeight { kind, weight } => {
                write!(f, "Invalid weight for {kind:?}: {weight}")
            }
            ConfigError::EmptyWeights => write!(f, "Obstacle weights must sum to a positive total"),
            ConfigError::WaveLane { time, lane } => {
                write!(f, "Wave at {time}s uses lane {lane}, expected -1..=1")
            }
            ConfigError::UpwardGravity(g) => write!(f, "Gravity must pull down, got {g}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
