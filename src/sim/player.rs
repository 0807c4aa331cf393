//! Player kinematics and action state machine
//!
//! Vertical motion is a simple ballistic integrator with a hard floor at
//! y = 0. Lateral motion follows a damped spring toward the center of the
//! current lane, so lane switches are discrete while the rendered position
//! glides. Action timers and the jump buffer decay by the real frame delta.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::state::{GameEvent, PlayerAction};
use crate::consts::*;
use crate::level::PlayerTuning;
use crate::{damp, lane_to_x};

/// Abstract player input, one per key press or swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Jump,
    Slide,
    Roll,
}

/// Cosmetic body orientation for the renderer (radians)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    /// Forward spin, driven while rolling
    pub pitch: f32,
    /// Turn toward the direction of lateral travel
    pub yaw: f32,
    /// Bank into lane changes
    pub roll: f32,
}

/// Where the player is and how it is moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerPose {
    /// Target lane (-1, 0, 1)
    pub lane: i8,
    /// Interpolated lateral position
    pub x: f32,
    /// Lateral velocity of the lane spring
    pub vx: f32,
    /// Height of the feet above the track, never negative
    pub y: f32,
    pub vy: f32,
    /// Distance covered this run; the player's world Z is `-distance`
    pub distance: f32,
    pub grounded: bool,
    pub orientation: Orientation,
    /// Vertical body scale (squashes while sliding)
    pub scale_y: f32,
}

impl Default for PlayerPose {
    fn default() -> Self {
        Self {
            lane: 0,
            x: 0.0,
            vx: 0.0,
            y: 0.0,
            vy: 0.0,
            distance: 0.0,
            grounded: true,
            orientation: Orientation::default(),
            scale_y: 1.0,
        }
    }
}

impl PlayerPose {
    /// Position along the track (forward is negative Z)
    #[inline]
    pub fn world_z(&self) -> f32 {
        -self.distance
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.world_z())
    }
}

/// The avatar: pose, current action and the timers behind it
#[derive(Debug, Clone)]
pub struct Player {
    pub pose: PlayerPose,
    pub action: PlayerAction,
    /// Remaining slide/roll time
    action_timer: f32,
    /// Remaining lifetime of a buffered jump press
    jump_buffer: f32,
    tuning: PlayerTuning,
    lane_width: f32,
}

impl Player {
    pub fn new(tuning: PlayerTuning, lane_width: f32) -> Self {
        Self {
            pose: PlayerPose::default(),
            action: PlayerAction::Idle,
            action_timer: 0.0,
            jump_buffer: 0.0,
            tuning,
            lane_width,
        }
    }

    /// Back to the starting line
    pub fn reset(&mut self) {
        self.pose = PlayerPose::default();
        self.action = PlayerAction::Idle;
        self.action_timer = 0.0;
        self.jump_buffer = 0.0;
    }

    /// Idle -> Run when a run starts
    pub fn begin_run(&mut self) {
        if self.action == PlayerAction::Idle {
            self.action = PlayerAction::Run;
        }
    }

    /// Terminal for the run
    pub fn hit(&mut self) {
        self.action = PlayerAction::Hit;
        self.action_timer = 0.0;
        self.jump_buffer = 0.0;
    }

    pub fn is_grounded(&self) -> bool {
        self.pose.grounded
    }

    pub fn jump_buffered(&self) -> bool {
        self.jump_buffer > 0.0
    }

    pub fn action_timer(&self) -> f32 {
        self.action_timer
    }

    /// Apply one intent. Intents that make no sense right now are dropped.
    pub fn apply_intent(&mut self, intent: Intent, events: &mut Vec<GameEvent>) {
        if matches!(self.action, PlayerAction::Idle | PlayerAction::Hit) {
            return;
        }

        match intent {
            Intent::MoveLeft | Intent::MoveRight => {
                let step = if intent == Intent::MoveLeft { -1 } else { 1 };
                let lane = (self.pose.lane + step).clamp(LANE_MIN, LANE_MAX);
                if lane != self.pose.lane {
                    self.pose.lane = lane;
                    events.push(GameEvent::LaneChanged { lane });
                }
            }
            Intent::Jump => {
                if self.pose.grounded {
                    self.launch(events);
                } else {
                    self.jump_buffer = self.tuning.input_buffer;
                }
            }
            Intent::Slide | Intent::Roll => {
                if !self.pose.grounded {
                    return;
                }
                if intent == Intent::Slide {
                    self.action = PlayerAction::Slide;
                    self.action_timer = self.tuning.slide_duration;
                    events.push(GameEvent::Slid);
                } else {
                    self.action = PlayerAction::Roll;
                    self.action_timer = self.tuning.roll_duration;
                    events.push(GameEvent::Rolled);
                }
                log::debug!("{:?} for {:.2}s", self.action, self.action_timer);
            }
        }
    }

    fn launch(&mut self, events: &mut Vec<GameEvent>) {
        self.pose.vy = self.tuning.jump_impulse;
        self.pose.grounded = false;
        self.action = PlayerAction::Jump;
        self.action_timer = 0.0;
        self.jump_buffer = 0.0;
        events.push(GameEvent::Jumped);
    }

    /// Move forward along the track
    pub fn advance(&mut self, distance: f32) {
        if distance > 0.0 {
            self.pose.distance += distance;
        }
    }

    /// Integrate one frame of motion and tick the action timers
    pub fn update(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        if self.action == PlayerAction::Hit {
            return;
        }

        self.update_vertical(dt, events);

        if self.jump_buffer > 0.0 {
            self.jump_buffer = (self.jump_buffer - dt).max(0.0);
        }

        if self.action.is_crouched() {
            self.action_timer -= dt;
            if self.action_timer <= 0.0 {
                self.action_timer = 0.0;
                self.action = PlayerAction::Run;
            }
        }

        self.update_lateral(dt);
        self.update_orientation(dt);
    }

    fn update_vertical(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let pose = &mut self.pose;
        pose.vy += self.tuning.gravity * dt;
        pose.y += pose.vy * dt;

        if pose.y > 0.0 {
            pose.grounded = false;
            return;
        }

        pose.y = 0.0;
        pose.vy = 0.0;
        if pose.grounded {
            return;
        }

        pose.grounded = true;
        events.push(GameEvent::Landed);
        if self.jump_buffer > 0.0 {
            self.launch(events);
        } else if self.action == PlayerAction::Jump {
            self.action = PlayerAction::Run;
        }
    }

    /// Damped spring toward the lane center, sub-stepped for stability
    fn update_lateral(&mut self, dt: f32) {
        let target = lane_to_x(self.pose.lane, self.lane_width);
        let steps = (dt / SPRING_MAX_STEP).ceil().max(1.0) as u32;
        let h = dt / steps as f32;
        for _ in 0..steps {
            let accel = self.tuning.spring_tension * (target - self.pose.x)
                - self.tuning.spring_friction * self.pose.vx;
            self.pose.vx += accel * h;
            self.pose.x += self.pose.vx * h;
        }
    }

    fn update_orientation(&mut self, dt: f32) {
        let vx = self.pose.vx;
        let o = &mut self.pose.orientation;
        if self.action == PlayerAction::Roll {
            o.pitch -= 15.0 * dt;
            o.yaw = 0.0;
            o.roll = 0.0;
        } else {
            o.pitch = damp(o.pitch, 0.0, 13.0, dt);
            o.yaw = damp(o.yaw, -(vx * 0.1).clamp(-0.5, 0.5), 6.0, dt);
            o.roll = damp(o.roll, -(vx * 0.15).clamp(-0.5, 0.5), 6.0, dt);
        }

        let scale_target = if self.action == PlayerAction::Slide {
            0.5
        } else {
            1.0
        };
        self.pose.scale_y = damp(self.pose.scale_y, scale_target, 13.0, dt);
    }

    /// Collision box for the current pose and action
    pub fn hitbox(&self) -> Hitbox {
        let height = if self.action.is_crouched() {
            PLAYER_CROUCH_HEIGHT
        } else {
            PLAYER_HEIGHT
        };
        Hitbox::new(
            Vec3::new(self.pose.x, self.pose.y + height / 2.0, self.pose.world_z()),
            Vec3::new(PLAYER_WIDTH / 2.0, height / 2.0, PLAYER_DEPTH / 2.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn running() -> Player {
        let mut p = Player::new(PlayerTuning::default(), 2.0);
        p.begin_run();
        p
    }

    fn step(p: &mut Player, frames: usize) {
        let mut events = Vec::new();
        for _ in 0..frames {
            p.update(DT, &mut events);
        }
    }

    #[test]
    fn test_lane_clamped() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::MoveLeft, &mut events);
        assert_eq!(p.pose.lane, -1);
        p.apply_intent(Intent::MoveLeft, &mut events);
        assert_eq!(p.pose.lane, -1);
        assert_eq!(events, vec![GameEvent::LaneChanged { lane: -1 }]);

        p.apply_intent(Intent::MoveRight, &mut events);
        p.apply_intent(Intent::MoveRight, &mut events);
        p.apply_intent(Intent::MoveRight, &mut events);
        assert_eq!(p.pose.lane, 1);
    }

    #[test]
    fn test_lateral_position_settles_on_lane() {
        let mut p = running();
        p.apply_intent(Intent::MoveRight, &mut Vec::new());
        step(&mut p, 120);
        assert!((p.pose.x - 2.0).abs() < 0.01, "x = {}", p.pose.x);
        assert!(p.pose.vx.abs() < 0.05);
    }

    #[test]
    fn test_lateral_spring_stable_with_long_frames() {
        let mut p = running();
        p.apply_intent(Intent::MoveLeft, &mut Vec::new());
        for _ in 0..30 {
            p.update(0.1, &mut Vec::new());
        }
        assert!((p.pose.x + 2.0).abs() < 0.01);
    }

    #[test]
    fn test_jump_arc_and_landing() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        assert_eq!(p.action, PlayerAction::Jump);
        assert!(!p.is_grounded());

        let mut peak: f32 = 0.0;
        for _ in 0..120 {
            p.update(DT, &mut events);
            assert!(p.pose.y >= 0.0);
            peak = peak.max(p.pose.y);
        }
        // v²/2g = 144/60
        assert!((peak - 2.4).abs() < 0.15, "peak = {peak}");
        assert!(p.is_grounded());
        assert_eq!(p.action, PlayerAction::Run);
        assert!(events.contains(&GameEvent::Landed));
    }

    #[test]
    fn test_airborne_jump_is_buffered_not_applied() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        step(&mut p, 10);
        let vy_before = p.pose.vy;
        p.apply_intent(Intent::Jump, &mut events);
        assert_eq!(p.pose.vy, vy_before, "no double jump");
        assert!(p.jump_buffered());
    }

    #[test]
    fn test_buffered_jump_fires_on_landing() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        // Airtime is 0.8s; press again 0.1s before landing
        let frames_to_press = ((0.8 - 0.1) / DT) as usize;
        for _ in 0..frames_to_press {
            p.update(DT, &mut events);
        }
        assert!(!p.is_grounded());
        p.apply_intent(Intent::Jump, &mut events);
        events.clear();

        for _ in 0..12 {
            p.update(DT, &mut events);
        }
        assert_eq!(
            events.iter().filter(|e| **e == GameEvent::Jumped).count(),
            1
        );
        assert_eq!(p.action, PlayerAction::Jump);
        assert!(p.pose.y > 0.0);
    }

    #[test]
    fn test_stale_buffer_expires() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        step(&mut p, 5);
        // Pressed far too early: 0.15s window runs out mid-air
        p.apply_intent(Intent::Jump, &mut events);
        step(&mut p, 120);
        assert!(p.is_grounded());
        assert_eq!(p.action, PlayerAction::Run);
        assert!(!p.jump_buffered());
    }

    #[test]
    fn test_slide_times_out() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Slide, &mut events);
        assert_eq!(p.action, PlayerAction::Slide);
        assert_eq!(p.hitbox().half_extents.y, PLAYER_CROUCH_HEIGHT / 2.0);

        step(&mut p, 36); // 0.6s
        assert_eq!(p.action, PlayerAction::Slide);
        step(&mut p, 9); // 0.75s total
        assert_eq!(p.action, PlayerAction::Run);
        assert_eq!(p.hitbox().half_extents.y, PLAYER_HEIGHT / 2.0);
    }

    #[test]
    fn test_roll_times_out_independent_of_frame_rate() {
        let mut a = running();
        let mut b = running();
        a.apply_intent(Intent::Roll, &mut Vec::new());
        b.apply_intent(Intent::Roll, &mut Vec::new());
        for _ in 0..33 {
            a.update(1.0 / 60.0, &mut Vec::new());
        }
        for _ in 0..16 {
            b.update(1.0 / 30.0, &mut Vec::new());
        }
        assert_eq!(a.action, PlayerAction::Roll);
        assert_eq!(b.action, PlayerAction::Roll);
        for _ in 0..6 {
            a.update(1.0 / 60.0, &mut Vec::new());
        }
        for _ in 0..3 {
            b.update(1.0 / 30.0, &mut Vec::new());
        }
        assert_eq!(a.action, PlayerAction::Run);
        assert_eq!(b.action, PlayerAction::Run);
    }

    #[test]
    fn test_slide_requires_ground() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        step(&mut p, 3);
        p.apply_intent(Intent::Slide, &mut events);
        p.apply_intent(Intent::Roll, &mut events);
        assert_eq!(p.action, PlayerAction::Jump);
    }

    #[test]
    fn test_jump_cancels_slide() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Slide, &mut events);
        p.apply_intent(Intent::Jump, &mut events);
        assert_eq!(p.action, PlayerAction::Jump);
        assert_eq!(p.action_timer(), 0.0);
    }

    #[test]
    fn test_lane_change_allowed_mid_air_and_mid_roll() {
        let mut p = running();
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        p.apply_intent(Intent::MoveLeft, &mut events);
        assert_eq!(p.pose.lane, -1);

        let mut p = running();
        p.apply_intent(Intent::Roll, &mut events);
        p.apply_intent(Intent::MoveRight, &mut events);
        assert_eq!(p.pose.lane, 1);
        assert_eq!(p.action, PlayerAction::Roll);
    }

    #[test]
    fn test_intents_ignored_when_idle_or_hit() {
        let mut p = Player::new(PlayerTuning::default(), 2.0);
        let mut events = Vec::new();
        p.apply_intent(Intent::Jump, &mut events);
        p.apply_intent(Intent::MoveLeft, &mut events);
        assert_eq!(p.action, PlayerAction::Idle);
        assert_eq!(p.pose.lane, 0);

        p.begin_run();
        p.hit();
        p.apply_intent(Intent::Slide, &mut events);
        p.apply_intent(Intent::MoveRight, &mut events);
        assert_eq!(p.action, PlayerAction::Hit);
        assert_eq!(p.pose.lane, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_hitbox_tracks_pose() {
        let mut p = running();
        p.advance(12.0);
        let hb = p.hitbox();
        assert_eq!(hb.center.z, -12.0);
        assert_eq!(hb.bottom(), 0.0);
        assert!((hb.top() - PLAYER_HEIGHT).abs() < 1e-6);
    }

    #[test]
    fn test_roll_spins_and_bank_follows_lateral_velocity() {
        let mut p = running();
        p.apply_intent(Intent::MoveRight, &mut Vec::new());
        step(&mut p, 6);
        assert!(p.pose.vx > 0.0);
        assert!(p.pose.orientation.roll < 0.0, "lean right into the turn");

        let mut p = running();
        p.apply_intent(Intent::Roll, &mut Vec::new());
        step(&mut p, 10);
        assert!(p.pose.orientation.pitch < -2.0);
    }
}
