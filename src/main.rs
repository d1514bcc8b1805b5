//! Stack Tower entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use stack_tower::audio::{AudioManager, SoundEffect};
    use stack_tower::consts::*;
    use stack_tower::renderer::{RenderState, shapes, view_projection};
    use stack_tower::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use stack_tower::ui::Dom;
    use stack_tower::{HighScores, Settings};

    /// Delay between the final miss and the restart dialog, so the piece can fall
    const GAME_OVER_DIALOG_DELAY_MS: f64 = 1200.0;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<RenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        settings: Settings,
        highscores: HighScores,
        audio: AudioManager,
        dom: Dom,
        /// When the last run ended; cleared once the dialog is shown
        game_over_at: Option<f64>,
    }

    impl Game {
        fn new(seed: u64, dom: Dom) -> Self {
            let settings = Settings::load();
            let highscores = HighScores::load();
            let audio = AudioManager::new(&settings);
            Self {
                state: GameState::new(seed, settings.tuning()),
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                settings,
                highscores,
                audio,
                dom,
                game_over_at: None,
            }
        }

        /// Begin a fresh player run
        fn start_run(&mut self) {
            let seed = js_sys::Date::now() as u64;
            self.state.tuning = self.settings.tuning();
            self.state.reset(seed, GamePhase::Playing);
            self.accumulator = 0.0;
            self.input = TickInput {
                autopilot: self.input.autopilot,
                ..Default::default()
            };
            self.game_over_at = None;
            self.audio.resume();
            self.audio.start_music();
            log::info!("Run started with seed: {} ({})", seed, self.settings.preset.as_str());
        }

        /// Go back to the self-playing menu
        fn return_to_menu(&mut self) {
            let seed = self.state.next_seed();
            self.state.reset(seed, GamePhase::Menu);
            self.accumulator = 0.0;
            self.game_over_at = None;
        }

        /// Click, tap or space
        fn primary_action(&mut self) {
            match self.state.phase {
                GamePhase::Menu | GamePhase::Won => self.start_run(),
                GamePhase::Playing => self.input.place = true,
                GamePhase::Paused | GamePhase::GameOver => {}
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.place = false;
                self.input.pause = false;
            }
        }

        /// React to what happened during the last ticks
        fn handle_events(&mut self, time: f64) {
            for event in self.state.drain_events() {
                match event {
                    GameEvent::Started => self.audio.play(SoundEffect::Start),
                    GameEvent::Placed { perfect, score } => {
                        log::debug!("Placed layer {} (perfect: {})", score, perfect);
                        self.audio.play(if perfect {
                            SoundEffect::Perfect
                        } else {
                            SoundEffect::Cut
                        });
                    }
                    GameEvent::AutoMiss => self.audio.play(SoundEffect::AutoMiss),
                    GameEvent::GameOver { score } => {
                        log::info!("Game over at {} layers", score);
                        self.audio.play(SoundEffect::GameOver);
                        self.record_score(score, false);
                        self.game_over_at = Some(time);
                    }
                    GameEvent::Won { score } => {
                        log::info!("Won with {} layers", score);
                        self.audio.play(SoundEffect::Win);
                        self.record_score(score, true);
                    }
                }
            }
        }

        fn record_score(&mut self, score: u32, won: bool) {
            let preset = self.settings.preset;
            if let Some(rank) =
                self.highscores
                    .add_score(score, preset, won, js_sys::Date::now())
            {
                log::info!("New high score #{}: {}", rank, score);
                self.highscores.save();
            }
        }

        /// Restart prompt, once the missed piece had time to fall
        fn due_game_over_prompt(&mut self, time: f64) -> Option<String> {
            let ended = self.game_over_at?;
            if self.state.phase != GamePhase::GameOver {
                self.game_over_at = None;
                return None;
            }
            if time - ended < GAME_OVER_DIALOG_DELAY_MS {
                return None;
            }
            self.game_over_at = None;
            Some(format!(
                "Game over! Your tower reached {} layers.\nPlay again?",
                self.state.score
            ))
        }

        /// Apply the player's answer to the restart prompt
        fn resolve_game_over(&mut self, play_again: bool) {
            if play_again {
                self.start_run();
            } else {
                self.return_to_menu();
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };

            let mut rig = self.state.camera;
            if self.settings.reduced_motion {
                rig.orbit = 0.0;
            }
            let view_proj = view_projection(&rig, render_state.aspect());
            let vertices = shapes::scene(&self.state);

            match render_state.render(&vertices, view_proj) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let phase = self.state.phase;
            let dom = &self.dom;

            dom.set_text("score", &self.state.display_score().to_string());
            if let Some(best) = self.highscores.top_score() {
                dom.set_text("best-score", &best.to_string());
            }

            dom.set_visible("main-menu", phase == GamePhase::Menu);
            dom.set_visible("ending-image", phase == GamePhase::Won);
            dom.set_visible("restart-btn", phase != GamePhase::Menu);
            dom.set_visible("pause-btn", matches!(phase, GamePhase::Playing | GamePhase::Paused));
            dom.set_text(
                "pause-btn",
                if phase == GamePhase::Paused { "Resume" } else { "Pause" },
            );
            dom.set_text(
                "volume-btn",
                if self.settings.muted { "Unmute" } else { "Mute" },
            );
            dom.set_class(
                "starry-sky",
                "animated",
                self.settings.starry_sky && phase == GamePhase::Playing,
            );
        }
    }

    /// Backing-store size of the canvas in device pixels
    fn canvas_pixel_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        (width.max(1), height.max(1))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Stack Tower starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window; cannot start");
            return;
        };
        let Some(dom) = Dom::new() else {
            log::error!("No document; cannot start");
            return;
        };

        let Some(canvas) = dom
            .element("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element; cannot start");
            return;
        };

        // Set canvas size
        let (width, height) = canvas_pixel_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, dom)));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU (WebGL2 when WebGPU is unavailable)
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => {
                log::error!("Failed to get device: {}", e);
                return;
            }
        }

        // Set up input handlers
        setup_input_handlers(game.clone());

        // Set up buttons
        setup_buttons(game.clone());

        // Keep the surface matched to the canvas
        setup_resize(&canvas, game.clone());

        // Set up auto-pause on visibility change
        setup_auto_pause(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Stack Tower running!");
    }

    /// Presses on these belong to their own click handlers
    const CONTROLS: &str =
        "button, #start-btn, #pause-btn, #restart-btn, #volume-btn, #info-icon, #info-modal";

    /// True when the event started on a button or panel, not the play area
    fn targets_control(event: &web_sys::Event) -> bool {
        event
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .and_then(|el| el.closest(CONTROLS).ok().flatten())
            .is_some()
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Mouse press anywhere on the page - place or start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if targets_control(&event) {
                    return;
                }
                game.borrow_mut().primary_action();
            });
            let _ = window
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch anywhere on the page - place or start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if targets_control(&event) {
                    return;
                }
                event.prevent_default();
                game.borrow_mut().primary_action();
            });
            let _ = window
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " => {
                        event.prevent_default();
                        g.primary_action();
                    }
                    "p" | "P" | "Escape" => g.input.pause = true,
                    "a" | "A" => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Attach a click handler to a button, if the page has it
    fn on_click(game: &Rc<RefCell<Game>>, id: &str, handler: impl Fn(&mut Game) + 'static) {
        let Some(btn) = game.borrow().dom.element(id) else {
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            event.stop_propagation();
            handler(&mut game.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        on_click(&game, "start-btn", |g| {
            if g.state.phase == GamePhase::Menu {
                g.start_run();
            }
        });

        on_click(&game, "pause-btn", |g| {
            if matches!(g.state.phase, GamePhase::Playing | GamePhase::Paused) {
                g.input.pause = true;
            }
        });

        on_click(&game, "restart-btn", |g| g.start_run());

        on_click(&game, "volume-btn", |g| {
            let muted = g.settings.toggle_mute();
            g.settings.save();
            g.audio.apply_settings(&g.settings);
            log::info!("Muted: {}", muted);
        });

        on_click(&game, "info-icon", |g| {
            let shown = g.dom.toggle_visible("info-modal");
            if shown && g.state.phase == GamePhase::Playing {
                g.input.pause = true;
            }
        });

        on_click(&game, "info-modal", |g| {
            g.dom.set_visible("info-modal", false);
        });
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let win = window.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = canvas_pixel_size(&win, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(render_state) = game.borrow_mut().render_state.as_mut() {
                render_state.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let prompt = {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.handle_events(time);
            g.render();
            g.update_hud();
            g.due_game_over_prompt(time)
        };

        // The dialog blocks; keep the game unborrowed while it is open
        if let Some(message) = prompt {
            let play_again = game.borrow().dom.confirm(&message);
            game.borrow_mut().resolve_game_over(play_again);
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let document = game.borrow().dom.document().clone();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state.phase == GamePhase::Playing {
                        g.input.pause = true;
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Playing {
                    g.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
                if g.settings.mute_on_blur {
                    g.audio.suspend_music();
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window focus
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let g = game.borrow();
                if g.settings.mute_on_blur {
                    g.audio.resume_music();
                }
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use stack_tower::consts::SIM_DT;
    use stack_tower::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use stack_tower::{Settings, Tuning, TuningPreset};

    env_logger::init();
    log::info!("Stack Tower (native) starting...");
    log::info!("Rendering needs a browser - run with `trunk serve` for the web version");

    // Headless autopilot run: `stack-tower [classic|summit|<tuning.json>] [seed]`
    let mut args = std::env::args().skip(1);
    let (label, tuning) = match args.next() {
        Some(arg) => match TuningPreset::parse(&arg) {
            Some(preset) => (preset.as_str().to_string(), preset.tuning()),
            None => match Tuning::from_file(&arg) {
                Ok(tuning) => (arg, tuning),
                Err(e) => {
                    log::error!("{}: {}", arg, e);
                    std::process::exit(1);
                }
            },
        },
        None => {
            let preset = Settings::default().preset;
            (preset.as_str().to_string(), preset.tuning())
        }
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    log::info!("Tuning ({}): {:?}", label, tuning);

    let mut state = GameState::new(seed, tuning);
    state.reset(seed, GamePhase::Playing);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    // Ten simulated minutes at most
    let max_ticks = (600.0 / SIM_DT) as u64;
    for _ in 0..max_ticks {
        tick(&mut state, &input, SIM_DT);
        for event in state.drain_events() {
            match event {
                GameEvent::Placed { perfect: true, score } => {
                    log::debug!("Perfect placement at layer {}", score)
                }
                GameEvent::GameOver { score } | GameEvent::Won { score } => {
                    log::info!("Run ended ({:?}) at {} layers", state.phase, score)
                }
                _ => {}
            }
        }
        if matches!(state.phase, GamePhase::GameOver | GamePhase::Won) {
            break;
        }
    }

    println!(
        "{}, seed {}: {:?} with {} layers, {} overhangs",
        label,
        seed,
        state.phase,
        state.score,
        state.overhangs.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
