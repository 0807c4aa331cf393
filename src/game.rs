//! Host-facing command surface
//!
//! Wraps a [`RunState`] with the pieces that live outside the simulation:
//! the persisted high score, queued input and attract-mode flag.

use serde::Serialize;

use crate::highscores::{self, HighScoreStore};
use crate::level::{ConfigError, LevelConfig};
use crate::sim::{self, GameEvent, Intent, RunState, RunStatus, Snapshot, TickInput};

/// Numbers shown over the game view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub high_score: u64,
    pub status: RunStatus,
    /// Forward speed, 0 unless a run is in progress
    pub speed: f32,
}

impl Hud {
    /// Score as shown on screen, zero-padded to six digits
    pub fn formatted_score(&self) -> String {
        format!("{:06}", self.score)
    }

    pub fn formatted_high_score(&self) -> String {
        format!("{:06}", self.high_score)
    }
}

pub struct Game {
    state: RunState,
    high_score: u64,
    store: Box<dyn HighScoreStore>,
    /// Intents waiting for the next frame
    pending: Vec<Intent>,
    autopilot: bool,
}

impl Game {
    /// Build an idle game and load the stored high score
    pub fn new(
        config: LevelConfig,
        seed: u64,
        mut store: Box<dyn HighScoreStore>,
    ) -> Result<Self, ConfigError> {
        let state = RunState::new(config, seed)?;
        let high_score = highscores::load_or_default(store.as_mut());
        Ok(Self {
            state,
            high_score,
            store,
            pending: Vec::new(),
            autopilot: false,
        })
    }

    /// Begin a run. Only valid from Idle.
    pub fn start(&mut self) -> bool {
        self.pending.clear();
        self.state.start()
    }

    /// Abandon or finish the current run and go back to Idle. The final
    /// score is folded into the high score, which is saved if it improved.
    pub fn reset(&mut self) {
        self.pending.clear();
        let Some(final_score) = self.state.reset() else {
            return;
        };
        if final_score <= self.high_score {
            return;
        }

        self.high_score = final_score;
        self.state
            .events
            .push(GameEvent::NewHighScore { score: final_score });
        log::info!("New high score: {final_score}");
        if let Err(e) = self.store.save(final_score) {
            log::warn!("Could not save high score: {e}");
        }
    }

    /// Queue an intent for the next frame. Dropped unless a run is active.
    pub fn queue_intent(&mut self, intent: Intent) {
        if self.state.status == RunStatus::Playing {
            self.pending.push(intent);
        }
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    pub fn set_camera_shake(&mut self, enabled: bool) {
        self.state.camera.set_shake_enabled(enabled);
    }

    /// Run one frame of `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        let input = TickInput {
            intents: std::mem::take(&mut self.pending),
            autopilot: self.autopilot,
        };
        sim::tick(&mut self.state, &input, dt);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.state.score,
            high_score: self.high_score,
            status: self.state.status,
            speed: if self.state.status == RunStatus::Playing {
                self.state.config.speed
            } else {
                0.0
            },
        }
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn status(&self) -> RunStatus {
        self.state.status
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }
}
