//! Raw device input to intents
//!
//! Pure mappings shared by the browser host: keyboard keys and touch swipes.

use crate::consts::SWIPE_THRESHOLD;
use crate::sim::Intent;

/// Intent bound to a `KeyboardEvent.key` value
pub fn intent_for_key(key: &str) -> Option<Intent> {
    match key {
        "ArrowLeft" | "a" | "A" => Some(Intent::MoveLeft),
        "ArrowRight" | "d" | "D" => Some(Intent::MoveRight),
        " " | "ArrowUp" | "w" | "W" => Some(Intent::Jump),
        "ArrowDown" | "s" | "S" => Some(Intent::Slide),
        "Shift" => Some(Intent::Roll),
        _ => None,
    }
}

/// Intent for a swipe from `start` to `end` in screen pixels (y grows down).
///
/// The dominant axis decides; a tie counts as vertical. Swipes no longer
/// than [`SWIPE_THRESHOLD`] along that axis are taps and map to nothing.
pub fn swipe_intent(start: (f32, f32), end: (f32, f32)) -> Option<Intent> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;

    if dx.abs() > dy.abs() {
        if dx.abs() <= SWIPE_THRESHOLD {
            return None;
        }
        Some(if dx < 0.0 {
            Intent::MoveLeft
        } else {
            Intent::MoveRight
        })
    } else {
        if dy.abs() <= SWIPE_THRESHOLD {
            return None;
        }
        Some(if dy < 0.0 { Intent::Jump } else { Intent::Slide })
    }
}

/// Tracks one touch from `touchstart` to `touchend`
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeTracker {
    start: Option<(f32, f32)>,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f32, y: f32) {
        self.start = Some((x, y));
    }

    /// Finish the gesture. Without a matching `begin` nothing happens.
    pub fn end(&mut self, x: f32, y: f32) -> Option<Intent> {
        let start = self.start.take()?;
        swipe_intent(start, (x, y))
    }
}
