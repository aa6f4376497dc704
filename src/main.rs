//! Neon Breach entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use neon_breach::Settings;
    use neon_breach::audio::{AudioManager, SoundCue};
    use neon_breach::consts::{ARENA_HEIGHT, ARENA_WIDTH, TICK_DT_MS};
    use neon_breach::render::Renderer;
    use neon_breach::sim::{
        GameEvent, InputState, KernelPatch, PowerUp, World, advance, fallback_patches,
    };

    /// Touch drag distance (css px) that maps to full joystick deflection
    const JOYSTICK_RADIUS: f32 = 60.0;

    /// Game instance holding all state
    struct Game {
        world: World,
        renderer: Option<Renderer>,
        audio: AudioManager,
        input: InputState,
        settings: Settings,
        /// Patch choices shown by the open level-up menu
        choices: Vec<KernelPatch>,
        menu_open: bool,
        touch_origin: Option<Vec2>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.master_volume);
            audio.set_effects_volume(settings.effects_volume);
            audio.set_muted(settings.muted);
            Self {
                world: World::new(seed),
                renderer: None,
                audio,
                input: InputState::default(),
                settings,
                choices: Vec::new(),
                menu_open: false,
                touch_origin: None,
            }
        }

        /// Run one fixed simulation tick
        fn step(&mut self) {
            advance(&mut self.world, &self.input, TICK_DT_MS);
        }

        /// Drain tick events into sound cues and overlay changes
        fn handle_events(&mut self) {
            for event in self.world.take_events() {
                match event {
                    GameEvent::Fired => self.audio.play(SoundCue::Shoot),
                    GameEvent::Hit => self.audio.play(SoundCue::Hit),
                    GameEvent::Collected => self.audio.play(SoundCue::Collect),
                    GameEvent::LevelUp(level) => {
                        log::info!("reached level {level}, offering patches");
                        self.audio.play(SoundCue::LevelUp);
                        self.open_patch_menu();
                    }
                    GameEvent::GameOver => self.show_game_over(),
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.draw(&self.world, &self.settings);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let document = web_sys::window().unwrap().document().unwrap();
            let stats = &self.world.stats;

            set_text(&document, "hud-score", &stats.score.to_string());
            set_text(&document, "hud-kills", &stats.kills.to_string());
            set_text(&document, "hud-level", &stats.level.to_string());
            set_text(&document, "hud-breach", &self.world.breach_level.to_string());
            set_text(&document, "hud-time", &clock(stats.elapsed_ms));
            set_bar_width(&document, "health-bar-fill", stats.health / stats.max_health);
            set_bar_width(&document, "xp-bar-fill", stats.experience / stats.next_level_exp);

            // Power-up badge with its remaining seconds
            if let Some(el) = document.get_element_by_id("power-up") {
                match self.world.power_up {
                    Some(active) => {
                        let label = match active.kind {
                            PowerUp::FireRate => "FIRE RATE",
                            PowerUp::Damage => "DAMAGE",
                        };
                        let secs = (active.remaining_ms / 1000.0).ceil();
                        el.set_text_content(Some(&format!("{label} {secs:.0}s")));
                        let _ = el.set_attribute("class", "");
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }

            if let Some(el) = document.get_element_by_id("boss-warning") {
                let class = if self.world.boss_active { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }

            // Manual pause overlay; the patch menu and game over screens own
            // their paused states
            if let Some(el) = document.get_element_by_id("pause-overlay") {
                let manual = self.world.paused && !self.menu_open && !stats.game_over;
                let _ = el.set_attribute("class", if manual { "" } else { "hidden" });
            }
        }

        /// Pause the run and present the level-up patch choices
        fn open_patch_menu(&mut self) {
            self.choices = fallback_patches();
            self.menu_open = true;
            self.world.set_paused(true);

            let document = web_sys::window().unwrap().document().unwrap();
            for (index, patch) in self.choices.iter().enumerate() {
                if let Some(el) = document
                    .query_selector(&format!("#patch-{index} .patch-name"))
                    .ok()
                    .flatten()
                {
                    el.set_text_content(Some(&patch.name));
                }
                if let Some(el) = document
                    .query_selector(&format!("#patch-{index} .patch-desc"))
                    .ok()
                    .flatten()
                {
                    el.set_text_content(Some(&patch.description));
                }
            }
            if let Some(el) = document.get_element_by_id("patch-menu") {
                let _ = el.set_attribute("class", "");
            }
        }

        /// Apply the clicked patch and resume the run
        fn choose_patch(&mut self, index: usize) {
            if !self.menu_open {
                return;
            }
            if let Some(patch) = self.choices.get(index).cloned() {
                self.world.apply_patch(&patch);
            }
            self.menu_open = false;
            self.world.set_paused(false);

            let document = web_sys::window().unwrap().document().unwrap();
            if let Some(el) = document.get_element_by_id("patch-menu") {
                let _ = el.set_attribute("class", "hidden");
            }
        }

        fn show_game_over(&self) {
            let document = web_sys::window().unwrap().document().unwrap();
            let stats = &self.world.stats;
            set_text(&document, "final-score", &stats.score.to_string());
            set_text(&document, "final-kills", &stats.kills.to_string());
            set_text(&document, "final-time", &clock(stats.elapsed_ms));
            if let Some(el) = document.get_element_by_id("game-over") {
                let _ = el.set_attribute("class", "");
            }
        }

        /// Reset game state for restart
        fn restart(&mut self, seed: u64) {
            self.world = World::new(seed);
            self.input = InputState::default();
            self.choices.clear();
            self.menu_open = false;
            self.touch_origin = None;

            let document = web_sys::window().unwrap().document().unwrap();
            for id in ["game-over", "patch-menu", "pause-overlay"] {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
            log::info!("Game restarted with seed: {seed}");
        }

        fn toggle_pause(&mut self) {
            if self.menu_open || self.world.stats.game_over {
                return;
            }
            let paused = !self.world.paused;
            self.world.set_paused(paused);
        }

        fn toggle_mute(&mut self) {
            let muted = !self.audio.muted();
            self.audio.set_muted(muted);
            self.settings.muted = muted;
            self.settings.save();
            log::info!("audio {}", if muted { "muted" } else { "unmuted" });
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_bar_width(document: &Document, id: &str, frac: f32) {
        if let Some(el) = document.get_element_by_id(id) {
            if let Some(el) = el.dyn_ref::<web_sys::HtmlElement>() {
                let pct = (frac.clamp(0.0, 1.0) * 100.0) as f64;
                let _ = el.style().set_property("width", &format!("{pct:.1}%"));
            }
        }
    }

    /// Elapsed sim time as mm:ss
    fn clock(elapsed_ms: f32) -> String {
        let total = (elapsed_ms / 1000.0) as u32;
        format!("{:02}:{:02}", total / 60, total % 60)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Neon Breach starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Fixed logical resolution; CSS scales the element
        canvas.set_width(ARENA_WIDTH as u32);
        canvas.set_height(ARENA_HEIGHT as u32);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        {
            let mut g = game.borrow_mut();
            // Decorrelate the cosmetic stream from the sim stream
            g.renderer = Renderer::new(&canvas, seed ^ 0x9e37_79b9_7f4a_7c15);
            if g.renderer.is_none() {
                log::error!("2d canvas context unavailable");
            }
        }

        log::info!("Game initialized with seed: {seed}");

        setup_input_handlers(&canvas, game.clone());
        setup_patch_menu(game.clone());
        setup_restart_button(game.clone());
        setup_resume_button(game.clone());
        setup_auto_pause(game.clone());

        // Show HUD
        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Neon Breach running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Keyboard down: movement plus mute and pause toggles
        {
            let game = game.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                // Any keypress counts as the user gesture audio needs
                g.audio.resume();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => {
                        event.prevent_default();
                        g.input.up = true;
                    }
                    "s" | "S" | "ArrowDown" => {
                        event.prevent_default();
                        g.input.down = true;
                    }
                    "a" | "A" | "ArrowLeft" => {
                        event.prevent_default();
                        g.input.left = true;
                    }
                    "d" | "D" | "ArrowRight" => {
                        event.prevent_default();
                        g.input.right = true;
                    }
                    "m" | "M" => g.toggle_mute(),
                    "Escape" => g.toggle_pause(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.input.up = false,
                    "s" | "S" | "ArrowDown" => g.input.down = false,
                    "a" | "A" | "ArrowLeft" => g.input.left = false,
                    "d" | "D" | "ArrowRight" => g.input.right = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down unlocks audio
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().audio.resume();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start anchors the virtual joystick
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.audio.resume();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    g.touch_origin = Some(Vec2::new(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                    ));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move deflects the joystick relative to its anchor
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let pos = Vec2::new(
                        touch.client_x() as f32 - rect.left() as f32,
                        touch.client_y() as f32 - rect.top() as f32,
                    );
                    let mut g = game.borrow_mut();
                    if let Some(origin) = g.touch_origin {
                        g.input.joystick =
                            ((pos - origin) / JOYSTICK_RADIUS).clamp_length_max(1.0);
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end releases the joystick
        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.touch_origin = None;
                g.input.joystick = Vec2::ZERO;
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_patch_menu(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        for index in 0..3 {
            if let Some(btn) = document.get_element_by_id(&format!("patch-{index}")) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    game.borrow_mut().choose_patch(index);
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resume_button(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().toggle_pause();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    g.world.set_paused(true);
                    if g.settings.mute_on_blur {
                        g.audio.set_muted(true);
                    }
                    log::info!("Auto-paused (tab hidden)");
                } else if g.settings.mute_on_blur {
                    g.audio.set_muted(g.settings.muted);
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
                g.world.set_paused(true);
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
                log::info!("Auto-paused (window blur)");
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window focus restores the configured mute state
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.settings.mute_on_blur {
                    let muted = g.settings.muted;
                    g.audio.set_muted(muted);
                }
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, _time: f64) {
        {
            let mut g = game.borrow_mut();
            g.step();
            g.handle_events();
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Breach (native) starting...");
    log::info!("Headless mode runs the sim only - use `trunk serve` for the playable build");

    // One simulated minute, then the same seed again to confirm replay
    let first = smoke_run(0xC0FFEE, 3_750);
    println!(
        "\n60s smoke run: score {} kills {} breach {} level {} health {:.0}",
        first.stats.score,
        first.stats.kills,
        first.breach_level,
        first.stats.level,
        first.stats.health
    );

    let second = smoke_run(0xC0FFEE, 3_750);
    assert_eq!(first.stats.score, second.stats.score);
    assert_eq!(first.stats.kills, second.stats.kills);
    println!("✓ Seeded replay matches!");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn smoke_run(seed: u64, ticks: u32) -> neon_breach::sim::World {
    use neon_breach::consts::TICK_DT_MS;
    use neon_breach::sim::{InputState, World, advance};

    let input = InputState {
        right: true,
        ..InputState::default()
    };
    let mut world = World::new(seed);
    for _ in 0..ticks {
        advance(&mut world, &input, TICK_DT_MS);
        world.take_events();
    }
    world
}
