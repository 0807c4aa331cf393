//! Obstacle spawning
//!
//! Obstacles appear a fixed lookahead in front of the player. The default
//! cadence is distance-gated: one weighted-random obstacle every
//! `spawn_interval * speed` units. In wave mode, scripted patterns fire at
//! elapsed-time checkpoints and the random cadence fills the gaps.

use rand::Rng;

use super::state::{Obstacle, ObstacleType};
use crate::consts::{LANE_MAX, LANE_MIN};
use crate::level::{ConfigError, LevelConfig, ObstacleWeights, SpawnMode, Wave};

/// Cumulative distribution over obstacle types, built once per level
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    cumulative: Vec<(ObstacleType, f32)>,
}

impl WeightTable {
    /// Normalize the weights into a CDF. The last type with a positive
    /// weight is pinned to 1.0 so rounding can never fall off the end.
    pub fn new(weights: &ObstacleWeights) -> Result<Self, ConfigError> {
        let entries = weights.entries();
        let mut total = 0.0;
        for &(kind, weight) in &entries {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { kind, weight });
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(ConfigError::EmptyWeights);
        }

        let mut acc = 0.0;
        let mut cumulative: Vec<(ObstacleType, f32)> = entries
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|&(kind, w)| {
                acc += w / total;
                (kind, acc)
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            last.1 = 1.0;
        }
        Ok(Self { cumulative })
    }

    /// Map one uniform sample in [0, 1) to a type
    pub fn sample(&self, u: f32) -> ObstacleType {
        self.cumulative
            .iter()
            .find(|(_, c)| u < *c)
            .or(self.cumulative.last())
            .map(|(kind, _)| *kind)
            .unwrap_or(ObstacleType::Low)
    }

    /// Draw a type using one value from the generator
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> ObstacleType {
        self.sample(rng.random::<f32>())
    }
}

/// Decides when and what to spawn
#[derive(Debug, Clone)]
pub struct Spawner {
    table: WeightTable,
    mode: SpawnMode,
    waves: Vec<Wave>,
    /// Index of the next unfired wave
    next_wave: usize,
    /// Distance of the last cadence point; None until the first spawn
    anchor: Option<f32>,
    /// Distance between cadence points
    gap: f32,
    lookahead: f32,
    /// Ids keep counting across runs so render keys never repeat
    next_id: u32,
}

impl Spawner {
    pub fn new(config: &LevelConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            table: WeightTable::new(&config.obstacle_weights)?,
            mode: config.spawn_mode,
            waves: config.waves.clone(),
            next_wave: 0,
            anchor: None,
            gap: config.spawn_gap(),
            lookahead: config.spawn_lookahead,
            next_id: 1,
        })
    }

    /// Forget run progress (cadence and fired waves)
    pub fn reset(&mut self) {
        self.next_wave = 0;
        self.anchor = None;
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn make(&mut self, kind: ObstacleType, lane: i8, world_z: f32) -> Obstacle {
        let id = self.allocate_id();
        Obstacle::new(id, kind, lane, world_z)
    }

    /// Spawn whatever is due at this distance and time. Empty means nothing.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &mut self,
        distance: f32,
        elapsed: f32,
        rng: &mut R,
    ) -> Vec<Obstacle> {
        let spawn_z = -distance - self.lookahead;

        if self.mode == SpawnMode::Waves {
            let due = self
                .waves
                .get(self.next_wave)
                .filter(|w| elapsed >= w.time)
                .map(|w| w.pattern.clone());
            if let Some(pattern) = due {
                log::debug!(
                    "Wave {} at {:.1}s: {} obstacles",
                    self.next_wave,
                    elapsed,
                    pattern.len()
                );
                self.next_wave += 1;
                self.anchor = Some(distance);
                return pattern
                    .into_iter()
                    .map(|e| self.make(e.kind, e.lane, spawn_z))
                    .collect();
            }
        }

        let due = match self.anchor {
            None => true,
            Some(anchor) => distance - anchor >= self.gap,
        };
        if !due {
            return Vec::new();
        }

        // Step the cadence by one gap so spawns don't drift with frame timing;
        // after a long stall, restart it from here instead of bursting
        self.anchor = Some(match self.anchor {
            Some(anchor) if distance - anchor < 2.0 * self.gap => anchor + self.gap,
            _ => distance,
        });

        let kind = self.table.draw(rng);
        let lane = rng.random_range(LANE_MIN..=LANE_MAX);
        let obstacle = self.make(kind, lane, spawn_z);
        log::debug!(
            "Spawned {:?} #{} in lane {} at z={:.1}",
            kind,
            obstacle.id,
            lane,
            spawn_z
        );
        vec![obstacle]
    }
}
