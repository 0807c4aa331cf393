//! Demo-mode autopilot
//!
//! Looks at the nearest obstacle in the player's lane and picks the move
//! that defeats it. Used by attract mode and the headless runner.

use super::player::Intent;
use super::state::{Obstacle, ObstacleType, PlayerAction, RunState, RunStatus};
use crate::consts::{LANE_MAX, LANE_MIN, PLAYER_DEPTH};

/// React to low bars, bars and wide barriers this close (world units)
const REACT_GAP: f32 = 2.0;
/// Pits are long, so jump later to stay airborne over the whole hole
const PIT_REACT_GAP: f32 = 1.0;
/// Start moving out of a wall's lane this far ahead
const DODGE_GAP: f32 = 8.0;
/// A lane is unsafe if something sits within this distance ahead
const LANE_CLEAR_AHEAD: f32 = 10.0;

/// Distance from the player's front face to the obstacle's near face.
/// Negative once the two overlap along the track.
fn gap_to(player_z: f32, obstacle: &Obstacle) -> f32 {
    (player_z - PLAYER_DEPTH / 2.0) - (obstacle.world_z + obstacle.depth / 2.0)
}

/// Is the obstacle still ahead of, or level with, the player?
fn not_yet_passed(player_z: f32, obstacle: &Obstacle) -> bool {
    gap_to(player_z, obstacle) > -(PLAYER_DEPTH + obstacle.depth)
}

/// Obstacles in `lane` that are still relevant, nearest first
fn threats_in_lane(state: &RunState, lane: i8) -> Vec<(f32, &Obstacle)> {
    let player_z = state.player.pose.world_z();
    let mut threats: Vec<(f32, &Obstacle)> = state
        .obstacles
        .iter()
        .filter(|o| o.lane == lane && not_yet_passed(player_z, o))
        .map(|o| (gap_to(player_z, o), o))
        .collect();
    threats.sort_by(|a, b| a.0.total_cmp(&b.0));
    threats
}

/// Pick a neighbouring lane to escape into. Empty lanes win; otherwise any
/// lane whose next obstacle can be jumped, slid or rolled.
fn escape_lane(state: &RunState) -> Option<Intent> {
    let lane = state.player.pose.lane;
    let candidates = [(lane - 1, Intent::MoveLeft), (lane + 1, Intent::MoveRight)];
    let in_range = |l: i8| (LANE_MIN..=LANE_MAX).contains(&l);

    // Still overlapping for at least a unit more, or coming up soon
    let blocking = |l: i8| -> Vec<ObstacleType> {
        threats_in_lane(state, l)
            .into_iter()
            .filter(|(gap, o)| *gap > -(PLAYER_DEPTH + o.depth) + 1.0 && *gap < LANE_CLEAR_AHEAD)
            .map(|(_, o)| o.kind)
            .collect()
    };

    let clear = candidates
        .iter()
        .filter(|(l, _)| in_range(*l))
        .find(|(l, _)| blocking(*l).is_empty());
    let passable = || {
        candidates
            .iter()
            .filter(|(l, _)| in_range(*l))
            .find(|(l, _)| !blocking(*l).contains(&ObstacleType::Wall))
    };

    clear.or_else(passable).map(|(_, intent)| *intent)
}

/// Choose at most one intent for this frame
pub fn choose_intent(state: &RunState) -> Option<Intent> {
    if state.status != RunStatus::Playing {
        return None;
    }
    let player = &state.player;
    let (gap, obstacle) = threats_in_lane(state, player.pose.lane)
        .into_iter()
        .next()?;

    // Time until the player's back clears the obstacle's far face
    let clear_time = (gap + PLAYER_DEPTH + obstacle.depth) / state.config.speed;

    match obstacle.kind {
        ObstacleType::Wall if gap <= DODGE_GAP => escape_lane(state),
        ObstacleType::Low if gap <= REACT_GAP && player.is_grounded() => Some(Intent::Jump),
        ObstacleType::Pit if gap <= PIT_REACT_GAP && player.is_grounded() => Some(Intent::Jump),
        ObstacleType::High if gap <= REACT_GAP && player.is_grounded() => {
            let covered = player.action.is_crouched() && player.action_timer() >= clear_time;
            (!covered).then_some(Intent::Slide)
        }
        ObstacleType::Wide if gap <= REACT_GAP && player.is_grounded() => {
            let covered =
                player.action == PlayerAction::Roll && player.action_timer() >= clear_time;
            (!covered).then_some(Intent::Roll)
        }
        _ => None,
    }
}
