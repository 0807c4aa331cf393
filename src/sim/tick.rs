//! Per-frame simulation step
//!
//! Advances a run by one variable-length frame. The order within a frame is
//! fixed: input, then per sub-step forward motion, score, physics, culling,
//! spawning and collision, then the camera.

use super::autopilot::choose_intent;
use super::collision::find_collision;
use super::player::Intent;
use super::state::{GameEvent, RunState, RunStatus};
use crate::consts::{MAX_FRAME_DT, MAX_STEP_DISTANCE, MAX_SUBSTEPS};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intents queued since the last frame, applied in order
    pub intents: Vec<Intent>,
    /// Demo mode - the autopilot adds its own intent
    pub autopilot: bool,
}

impl TickInput {
    pub fn with_intents(intents: impl IntoIterator<Item = Intent>) -> Self {
        Self {
            intents: intents.into_iter().collect(),
            autopilot: false,
        }
    }
}

/// Advance the run by `dt` seconds
///
/// Long frames are split into equal sub-steps so the player never moves
/// further than its own depth between collision checks.
pub fn tick(state: &mut RunState, input: &TickInput, dt: f32) {
    if !dt.is_finite() || dt <= 0.0 {
        log::trace!("Skipping frame with dt={dt}");
        return;
    }

    match state.status {
        RunStatus::Idle => return,
        // Frozen; only the shake keeps settling
        RunStatus::Ended => {
            state.camera.resolve(&state.player.pose, dt);
            return;
        }
        RunStatus::Playing => {}
    }

    for &intent in &input.intents {
        state.player.apply_intent(intent, &mut state.events);
    }

    let steps = step_count(dt, state.config.speed);
    let h = dt / steps as f32;
    for _ in 0..steps {
        step(state, input.autopilot, h);
        if state.status != RunStatus::Playing {
            break;
        }
    }

    state.camera.resolve(&state.player.pose, dt);
}

/// Sub-steps needed to keep each one under both the time and distance limits
fn step_count(dt: f32, speed: f32) -> u32 {
    let by_time = (dt / MAX_FRAME_DT).ceil();
    let by_distance = (speed * dt / MAX_STEP_DISTANCE).ceil();
    (by_time.max(by_distance).max(1.0) as u32).min(MAX_SUBSTEPS)
}

fn step(state: &mut RunState, autopilot: bool, dt: f32) {
    if autopilot {
        if let Some(intent) = choose_intent(state) {
            state.player.apply_intent(intent, &mut state.events);
        }
    }

    state.elapsed += dt;
    state.player.advance(state.config.speed * dt);

    state.score_clock += dt;
    let interval = state.config.score_tick_interval;
    if state.score_clock >= interval {
        let points = (state.score_clock / interval).floor();
        state.score += points as u64;
        state.score_clock -= points * interval;
    }

    state.player.update(dt, &mut state.events);

    let player_z = state.player.pose.world_z();
    let culled = state
        .obstacles
        .evict_passed(player_z, state.config.cull_margin);
    if culled > 0 {
        log::trace!("Culled {culled} obstacles behind z={player_z:.1}");
    }

    let spawned = state.spawner.maybe_spawn(
        state.player.pose.distance,
        state.elapsed,
        &mut state.rng,
    );
    for obstacle in spawned {
        let (id, kind, lane) = (obstacle.id, obstacle.kind, obstacle.lane);
        if state.obstacles.insert(obstacle) {
            state.spawned_total += 1;
            state
                .events
                .push(GameEvent::ObstacleSpawned { id, kind, lane });
        }
    }

    let hitbox = state.player.hitbox();
    let hit = find_collision(
        &hitbox,
        state.player.action,
        &state.obstacles,
        state.config.lane_width,
    )
    .map(|o| (o.id, o.kind));
    if let Some((id, kind)) = hit {
        state.end_run(id, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelConfig, ObstacleWeights};
    use crate::sim::{Obstacle, ObstacleType, PlayerAction};

    const DT: f32 = 1.0 / 60.0;

    fn playing(seed: u64) -> RunState {
        let mut state = RunState::new(LevelConfig::default(), seed).unwrap();
        state.start();
        state
    }

    /// Weighted level that only ever spawns one obstacle type
    fn only(kind: ObstacleType) -> LevelConfig {
        let mut weights = ObstacleWeights {
            low: 0.0,
            high: 0.0,
            wide: 0.0,
            pit: 0.0,
            wall: 0.0,
        };
        match kind {
            ObstacleType::Low => weights.low = 1.0,
            ObstacleType::High => weights.high = 1.0,
            ObstacleType::Wide => weights.wide = 1.0,
            ObstacleType::Pit => weights.pit = 1.0,
            ObstacleType::Wall => weights.wall = 1.0,
        }
        LevelConfig {
            obstacle_weights: weights,
            ..LevelConfig::default()
        }
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut state = RunState::new(LevelConfig::default(), 1).unwrap();
        tick(&mut state, &TickInput::with_intents([Intent::Jump]), DT);
        assert_eq!(state.status, RunStatus::Idle);
        assert_eq!(state.player.pose.distance, 0.0);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let mut state = playing(1);
        for dt in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            tick(&mut state, &TickInput::default(), dt);
        }
        assert_eq!(state.player.pose.distance, 0.0);
        assert_eq!(state.elapsed, 0.0);
    }

    #[test]
    fn test_first_frame_moves_and_spawns() {
        let mut state = playing(1);
        tick(&mut state, &TickInput::default(), DT);
        assert!((state.player.pose.distance - 8.0 * DT).abs() < 1e-6);
        assert_eq!(state.obstacles.len(), 1);
        let o = &state.obstacles.as_slice()[0];
        assert!((o.world_z - (-state.player.pose.distance - 40.0)).abs() < 1e-4);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::ObstacleSpawned { id, .. } if *id == o.id
        )));
    }

    #[test]
    fn test_score_ten_points_per_second() {
        let mut state = playing(1);
        // Half a second with no collision possible yet (first obstacle is 40 ahead)
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.status, RunStatus::Playing);
        assert!((4..=5).contains(&state.score), "score = {}", state.score);

        // Long frames bank several points at once
        let mut state = playing(1);
        tick(&mut state, &TickInput::default(), 0.35);
        assert_eq!(state.score, 3);
    }

    #[test]
    fn test_distance_and_score_monotonic() {
        let mut state = playing(9);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let (mut distance, mut score) = (0.0, 0);
        for _ in 0..600 {
            tick(&mut state, &input, DT);
            assert!(state.player.pose.distance >= distance);
            assert!(state.score >= score);
            distance = state.player.pose.distance;
            score = state.score;
        }
    }

    #[test]
    fn test_injected_wall_ends_run() {
        let mut state = playing(1);
        state
            .obstacles
            .insert(Obstacle::new(500, ObstacleType::Wall, 0, -1.0));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.status, RunStatus::Ended);
        assert_eq!(state.player.action, PlayerAction::Hit);
        assert!(state.events.contains(&GameEvent::Collision {
            obstacle_id: 500,
            kind: ObstacleType::Wall,
        }));
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::RunEnded { .. }))
        );
    }

    /// Wall three units ahead, no input, frames of `dt` for one second
    fn run_into_wall(dt: f32) -> RunState {
        let mut state = playing(1);
        state
            .obstacles
            .insert(Obstacle::new(500, ObstacleType::Wall, 0, -3.0));
        let frames = (1.0 / dt).round() as usize;
        for _ in 0..frames {
            tick(&mut state, &TickInput::default(), dt);
        }
        state
    }

    #[test]
    fn test_long_frames_cannot_pass_through_walls() {
        let smooth = run_into_wall(DT);
        assert_eq!(smooth.status, RunStatus::Ended);

        let choppy = run_into_wall(0.5);
        assert_eq!(choppy.status, RunStatus::Ended);
        assert!(choppy.player.pose.distance < 4.0);
        assert!(choppy.events.contains(&GameEvent::Collision {
            obstacle_id: 500,
            kind: ObstacleType::Wall,
        }));
    }

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(DT, 8.0), 1);
        assert_eq!(step_count(0.1, 8.0), 1);
        assert_eq!(step_count(0.5, 8.0), 5);
        // Fast levels are limited by distance, not time
        assert_eq!(step_count(0.1, 40.0), 5);
        assert_eq!(step_count(1.0e9, 8.0), MAX_SUBSTEPS);
    }

    #[test]
    fn test_rejected_spawn_is_not_announced() {
        let mut state = playing(1);
        // Take the id the spawner hands out first
        state
            .obstacles
            .insert(Obstacle::new(1, ObstacleType::Low, 1, -100.0));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.spawned_total, 0);
        assert!(
            !state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ObstacleSpawned { .. }))
        );
    }

    #[test]
    fn test_ended_run_is_frozen() {
        let mut state = playing(1);
        state
            .obstacles
            .insert(Obstacle::new(500, ObstacleType::Wall, 0, -1.0));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.status, RunStatus::Ended);

        let distance = state.player.pose.distance;
        let score = state.score;
        let count = state.obstacles.len();
        let shake = state.camera.shake();
        for _ in 0..30 {
            tick(
                &mut state,
                &TickInput::with_intents([Intent::Jump, Intent::MoveLeft]),
                DT,
            );
        }
        assert_eq!(state.player.pose.distance, distance);
        assert_eq!(state.score, score);
        assert_eq!(state.obstacles.len(), count);
        assert_eq!(state.player.pose.lane, 0);
        assert!(state.camera.shake() < shake, "shake settles after the crash");
    }

    #[test]
    fn test_lane_change_dodges_wall() {
        let mut state = playing(1);
        state
            .obstacles
            .insert(Obstacle::new(500, ObstacleType::Wall, 0, -4.0));
        tick(&mut state, &TickInput::with_intents([Intent::MoveLeft]), DT);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.status, RunStatus::Playing);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let script = |frame: usize| match frame % 90 {
            10 => vec![Intent::MoveLeft],
            40 => vec![Intent::Jump],
            70 => vec![Intent::MoveRight, Intent::Slide],
            _ => Vec::new(),
        };
        let mut a = playing(4242);
        let mut b = playing(4242);
        for frame in 0..900 {
            let input = TickInput {
                intents: script(frame),
                autopilot: true,
            };
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.events, b.events);
        assert_eq!(a.spawned_total, b.spawned_total);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = playing(1);
        let mut b = playing(2);
        for _ in 0..600 {
            tick(&mut a, &TickInput::default(), DT);
            tick(&mut b, &TickInput::default(), DT);
            if a.status != RunStatus::Playing || b.status != RunStatus::Playing {
                break;
            }
        }
        let kinds = |s: &RunState| -> Vec<(ObstacleType, i8)> {
            s.obstacles.iter().map(|o| (o.kind, o.lane)).collect()
        };
        assert_ne!(kinds(&a), kinds(&b));
    }

    #[test]
    fn test_culling_bounds_live_set() {
        let mut state = playing(3);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..1200 {
            tick(&mut state, &input, DT);
            // Lookahead 40 + margin 10 over a 9.6 gap
            assert!(state.obstacles.len() <= 7);
            if state.status != RunStatus::Playing {
                break;
            }
        }
    }

    fn survives(kind: ObstacleType, seconds: f32) {
        let mut state = RunState::new(only(kind), 11).unwrap();
        state.start();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let frames = (seconds / DT) as usize;
        for _ in 0..frames {
            tick(&mut state, &input, DT);
        }
        assert_eq!(
            state.status,
            RunStatus::Playing,
            "autopilot crashed into {kind:?} after {:.1}s",
            state.elapsed
        );
        assert!(state.spawned_total > 10);
    }

    #[test]
    fn test_autopilot_clears_each_type() {
        for kind in [
            ObstacleType::Low,
            ObstacleType::High,
            ObstacleType::Wide,
            ObstacleType::Pit,
            ObstacleType::Wall,
        ] {
            survives(kind, 20.0);
        }
    }

    #[test]
    fn test_without_input_the_runner_eventually_crashes() {
        let mut state = RunState::new(only(ObstacleType::Wall), 5).unwrap();
        state.start();
        for _ in 0..(60 * 60) {
            tick(&mut state, &TickInput::default(), DT);
            if state.status == RunStatus::Ended {
                break;
            }
        }
        assert_eq!(state.status, RunStatus::Ended);
    }
}
