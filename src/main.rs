//! Block Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent, TouchEvent};

    use block_runner::audio::AudioManager;
    use block_runner::consts::MAX_FRAME_DT;
    use block_runner::highscores::LocalStorageHighScoreStore;
    use block_runner::input::{SwipeTracker, intent_for_key};
    use block_runner::sim::RunStatus;
    use block_runner::{Game, LevelConfig, Settings};

    /// Browser-side state around the game
    struct App {
        game: Game,
        audio: AudioManager,
        settings: Settings,
        swipe: SwipeTracker,
        last_time: f64,
    }

    impl App {
        /// Enter starts a run, or retries after a crash
        fn start_or_retry(&mut self) {
            self.audio.resume();
            match self.game.status() {
                RunStatus::Idle => {
                    self.game.start();
                }
                RunStatus::Ended => {
                    self.game.reset();
                    self.game.start();
                }
                RunStatus::Playing => {}
            }
        }

        /// Persist changed preferences and apply them right away
        fn apply_settings(&mut self) {
            self.audio.apply_settings(&self.settings);
            self.game
                .set_camera_shake(self.settings.effective_camera_shake());
            self.settings.save();
        }

        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (((time - self.last_time) / 1000.0) as f32).min(MAX_FRAME_DT)
            } else {
                0.0
            };
            self.last_time = time;

            self.game.advance(dt);
            let events = self.game.drain_events();
            self.audio.play_events(&events);
            self.publish_snapshot();
        }

        /// Hand the frame to the JS renderer as `window.blockRunnerSnapshot`
        fn publish_snapshot(&self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            match serde_json::to_string(&self.game.snapshot()) {
                Ok(json) => {
                    let _ = js_sys::Reflect::set(
                        &window,
                        &JsValue::from_str("blockRunnerSnapshot"),
                        &JsValue::from_str(&json),
                    );
                }
                Err(e) => log::warn!("Snapshot serialization failed: {e}"),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.game.hud();

            if let Some(el) = document.get_element_by_id("hud-score") {
                el.set_text_content(Some(&hud.formatted_score()));
            }
            if let Some(el) = document.get_element_by_id("hud-high-score") {
                el.set_text_content(Some(&hud.formatted_high_score()));
            }

            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };
            show("start-prompt", hud.status == RunStatus::Idle);
            show("game-over", hud.status == RunStatus::Ended);

            if hud.status == RunStatus::Ended {
                if let Some(el) = document.get_element_by_id("final-score") {
                    el.set_text_content(Some(&hud.formatted_score()));
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Block Runner starting...");

        let config = match LevelConfig::builtin() {
            Ok(config) => config,
            Err(e) => {
                log::error!("Built-in level is invalid: {e}");
                return;
            }
        };

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let mut game = match Game::new(config, seed, Box::new(LocalStorageHighScoreStore)) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Could not create game: {e}");
                return;
            }
        };
        game.set_camera_shake(settings.effective_camera_shake());

        let mut audio = AudioManager::new();
        audio.apply_settings(&settings);

        log::info!("Game initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App {
            game,
            audio,
            settings,
            swipe: SwipeTracker::default(),
            last_time: 0.0,
        }));
        app.borrow().update_hud();

        setup_input_handlers(app.clone());
        setup_start_button(app.clone());

        // Start game loop
        request_animation_frame(app);

        log::info!("Block Runner running!");
    }

    fn setup_input_handlers(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        // Keyboard
        let keys = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.repeat() {
                return;
            }
            let mut a = keys.borrow_mut();
            let key = event.key();
            if let Some(intent) = intent_for_key(&key) {
                event.prevent_default();
                a.game.queue_intent(intent);
                return;
            }
            match key.as_str() {
                "Enter" => a.start_or_retry(),
                "i" | "I" => {
                    let enabled = !a.game.autopilot();
                    a.game.set_autopilot(enabled);
                    log::info!("Autopilot: {}", enabled);
                }
                "m" | "M" => {
                    let muted = a.settings.toggle_muted();
                    a.apply_settings();
                    log::info!("Muted: {}", muted);
                }
                "c" | "C" => {
                    let shake = a.settings.toggle_camera_shake();
                    a.apply_settings();
                    log::info!("Camera shake: {}", shake);
                }
                _ => {}
            }
        });
        let _ =
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();

        // Touch start
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    app.borrow_mut()
                        .swipe
                        .begin(touch.client_x() as f32, touch.client_y() as f32);
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end (swipe)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let mut a = app.borrow_mut();
                let x = touch.client_x() as f32;
                let y = touch.client_y() as f32;
                if let Some(intent) = a.swipe.end(x, y) {
                    a.game.queue_intent(intent);
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_start_button(app: Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    app.borrow_mut().start_or_retry();
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            a.update(time);
            a.update_hud();
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use block_runner::highscores::FileHighScoreStore;
    use block_runner::sim::{GameEvent, RunStatus};
    use block_runner::{ConfigError, Game, LevelConfig};

    const FRAME_DT: f32 = 1.0 / 60.0;
    const MAX_SECONDS: f32 = 120.0;
    const SAVE_FILE: &str = "block-runner-save.json";

    /// Level from the first argument, or the built-in one
    fn load_level() -> Result<LevelConfig, ConfigError> {
        match std::env::args().nth(1) {
            Some(path) => {
                log::info!("Loading level from {path}");
                LevelConfig::from_file(path)
            }
            None => LevelConfig::builtin(),
        }
    }

    /// Play one autopilot run without a window and report how it went
    pub fn run() -> Result<(), ConfigError> {
        let config = load_level()?;
        let seed: u64 = rand::random();
        let store = FileHighScoreStore::new(SAVE_FILE);
        let mut game = Game::new(config, seed, Box::new(store))?;
        game.set_autopilot(true);
        game.start();

        let mut frames = 0u32;
        while game.status() == RunStatus::Playing && frames as f32 * FRAME_DT < MAX_SECONDS {
            game.advance(FRAME_DT);
            frames += 1;
            for event in game.drain_events() {
                match event {
                    GameEvent::ObstacleSpawned { .. } | GameEvent::LaneChanged { .. } => {
                        log::trace!("{event:?}")
                    }
                    _ => log::debug!("{event:?}"),
                }
            }
        }

        let state = game.state();
        let distance = state.player.pose.distance;
        let outcome = match state.status {
            RunStatus::Ended => "crashed",
            _ => "survived",
        };
        let score = game.hud().score;
        println!(
            "seed {seed}: {outcome} after {:.1}s, distance {distance:.1}, score {score}",
            state.elapsed
        );
        println!("{} obstacles spawned", state.spawned_total);

        game.reset();
        println!("high score {}", game.hud().formatted_high_score());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Block Runner (native, headless autopilot) starting...");

    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
