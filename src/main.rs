//! Starfolio entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use starfolio::net::MemoryStore;
    use starfolio::sim::ArcadePhase;
    use starfolio::{Session, SessionEvent, Settings, Tuning};

    /// Touch travel (CSS px) for full joystick deflection
    const JOYSTICK_RADIUS: f32 = 60.0;

    /// Active virtual joystick: touch id and its start point
    #[derive(Clone, Copy)]
    struct Stick {
        id: i32,
        origin: (f32, f32),
    }

    struct Game {
        session: Session<MemoryStore>,
        last_time: f64,
        look_stick: Option<Stick>,
        move_stick: Option<Stick>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let store = MemoryStore::new();
            let settings = load_settings();
            Self {
                session: Session::new(store, Tuning::default(), settings, seed),
                last_time: 0.0,
                look_stick: None,
                move_stick: None,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        fn update(&mut self, dt: f32, time: f64) {
            let now = js_sys::Date::now();
            self.session.frame(now, dt);

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 && time > oldest {
                self.fps = (60000.0 / (time - oldest)).round() as u32;
            }
        }

        fn handle_events(&mut self, document: &Document) {
            for event in self.session.drain_events() {
                match &event {
                    SessionEvent::NearbyChanged { nearby } => match nearby {
                        Some(n) => {
                            set_text(document, "nearby-name", n.name);
                            show(document, "nearby", true);
                        }
                        None => show(document, "nearby", false),
                    },
                    SessionEvent::Arrived { .. } => show(document, "content-panel", true),
                    SessionEvent::ReturnedHome => show(document, "content-panel", false),
                    SessionEvent::Destroyed { .. } => show(document, "death-screen", true),
                    SessionEvent::Respawned { .. } => show(document, "death-screen", false),
                    SessionEvent::ArcadeStarted => show(document, "arcade", true),
                    SessionEvent::ArcadeExited => show(document, "arcade", false),
                    SessionEvent::NeverPlanetCaught { catches, .. } => {
                        set_text(document, "never-planet-catches", &catches.to_string());
                        show(document, "never-planet-victory", true);
                    }
                    _ => {}
                }
                // Effects (explosions, sounds, panels) are drawn by the page script
                if let Ok(json) = serde_json::to_string(&event) {
                    dispatch(document, "starfolio-event", &json);
                }
            }
        }

        fn update_hud(&self, document: &Document) {
            let view = self.session.view(js_sys::Date::now());

            set_text(document, "hud-speed", &format!("{:.0}", view.speed));
            set_text(document, "hud-fps", &self.fps.to_string());
            set_text(
                document,
                "hud-room",
                view.room.as_deref().unwrap_or("solo"),
            );
            set_text(document, "hud-peers", &view.peers.len().to_string());
            let cooldown = (view.laser_cooldown_ms / 1000.0).ceil();
            if cooldown > 0.0 {
                set_text(document, "hud-laser", &format!("{cooldown:.0}s"));
            } else {
                set_text(document, "hud-laser", "READY");
            }

            if let Some(arcade) = &view.arcade {
                set_text(document, "arcade-score", &arcade.score.to_string());
                set_text(document, "arcade-lives", &arcade.lives.to_string());
                set_text(document, "arcade-wave", &arcade.wave.to_string());
                show(document, "arcade-game-over", arcade.phase == ArcadePhase::GameOver);
            }

            // Full frame for the page's scene graph
            if let Ok(json) = serde_json::to_string(&view) {
                dispatch(document, "starfolio-frame", &json);
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Hand a JSON payload to the page through a `CustomEvent`
    fn dispatch(document: &Document, name: &str, json: &str) {
        let init = web_sys::CustomEventInit::new();
        init.set_detail(&JsValue::from_str(json));
        if let Ok(event) = web_sys::CustomEvent::new_with_event_init_dict(name, &init) {
            let _ = document.dispatch_event(&event);
        }
    }

    /// Settings handed in by the page as `<script id="settings" type="application/json">`
    fn load_settings() -> Settings {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("settings"))
            .and_then(|el| el.text_content())
            .map(|json| Settings::from_json(&json))
            .unwrap_or_default()
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Starfolio starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow_mut().session.connect(js_sys::Date::now());
        log::info!("Session initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_unload(game.clone());

        request_animation_frame(game);
        log::info!("Starfolio running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Pointer lock change
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let locked = web_sys::window()
                    .and_then(|w| w.document())
                    .is_some_and(|d| d.pointer_lock_element().is_some());
                log::debug!("Pointer lock: {}", locked);
                game.borrow_mut().session.set_pointer_locked(locked);
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockchange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Mouse move (deltas only count while captured)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut()
                    .session
                    .mouse_move(event.movement_x() as f32, event.movement_y() as f32);
            });
            let _ = document
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click captures the pointer, clicks while captured fire
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let locked = web_sys::window()
                    .and_then(|w| w.document())
                    .is_some_and(|d| d.pointer_lock_element().is_some());
                if locked {
                    game.borrow_mut().session.request_fire();
                } else {
                    canvas_clone.request_pointer_lock();
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.code() == "Space" {
                    event.prevent_default();
                }
                game.borrow_mut().session.key_down(&event.code(), event.repeat());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().session.key_up(&event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch joysticks: left half looks, right half thrusts
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let half = canvas_clone.client_width() as f32 / 2.0;
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else {
                        continue;
                    };
                    let stick = Stick {
                        id: touch.identifier(),
                        origin: (touch.client_x() as f32, touch.client_y() as f32),
                    };
                    if stick.origin.0 < half {
                        g.look_stick.get_or_insert(stick);
                    } else {
                        g.move_stick.get_or_insert(stick);
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else {
                        continue;
                    };
                    let (x, y) = (touch.client_x() as f32, touch.client_y() as f32);
                    if let Some(stick) = g.look_stick
                        && stick.id == touch.identifier()
                    {
                        let dx = (x - stick.origin.0) / JOYSTICK_RADIUS;
                        let dy = (y - stick.origin.1) / JOYSTICK_RADIUS;
                        g.session.set_look_joystick(dx, dy);
                    }
                    if let Some(stick) = g.move_stick
                        && stick.id == touch.identifier()
                    {
                        // Screen y grows downward; pushing up thrusts
                        let dy = (stick.origin.1 - y) / JOYSTICK_RADIUS;
                        g.session.set_move_joystick(dy);
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else {
                        continue;
                    };
                    let id = touch.identifier();
                    if g.look_stick.is_some_and(|s| s.id == id) {
                        g.look_stick = None;
                        g.session.set_look_joystick(0.0, 0.0);
                    }
                    if g.move_stick.is_some_and(|s| s.id == id) {
                        g.move_stick = None;
                        g.session.set_move_joystick(0.0);
                    }
                }
            });
            for name in ["touchend", "touchcancel"] {
                let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(MouseEvent)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_touch_hold(document: &Document, id: &str, handler: impl FnMut(bool) + Clone + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            return;
        };
        for (name, pressed) in [("touchstart", true), ("touchend", false)] {
            let mut handler = handler.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                handler(pressed);
            });
            let _ = btn.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        {
            let game = game.clone();
            on_click(&document, "home-btn", move |_| game.borrow_mut().session.go_home(js_sys::Date::now()));
        }
        {
            let game = game.clone();
            on_click(&document, "fire-btn", move |_| game.borrow_mut().session.request_fire());
        }
        {
            let game = game.clone();
            on_touch_hold(&document, "boost-btn", move |active| {
                game.borrow_mut().session.set_boost(active)
            });
        }
        {
            let game = game.clone();
            on_click(&document, "arcade-exit-btn", move |_| {
                game.borrow_mut().session.exit_arcade()
            });
        }
        {
            let game = game.clone();
            on_click(&document, "arcade-restart-btn", move |_| {
                game.borrow_mut()
                    .session
                    .restart_arcade(js_sys::Date::now())
            });
        }
        {
            let game = game.clone();
            on_click(&document, "never-planet-close-btn", move |_| {
                game.borrow_mut().session.dismiss_never_planet();
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    show(&document, "never-planet-victory", false);
                }
            });
        }

        // Planet clicks arrive from the page's picking as `data-destination` buttons
        if let Ok(nodes) = document.query_selector_all("[data-destination]") {
            for i in 0..nodes.length() {
                let Some(el) = nodes
                    .get(i)
                    .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
                else {
                    continue;
                };
                let Some(id) = el.get_attribute("data-destination") else {
                    continue;
                };
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    game.borrow_mut().session.navigate_to(&id, js_sys::Date::now());
                });
                let _ =
                    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_unload(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().session.shutdown();
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
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
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.handle_events(&document);
            g.update_hud(&document);
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
    log::info!("Starfolio (native) starting...");
    log::info!("Native mode runs a scripted headless flight; serve the wasm build for the browser version");

    headless_flight();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Two clients on one in-memory store: fly, shoot, warp and come home
#[cfg(not(target_arch = "wasm32"))]
fn headless_flight() {
    use starfolio::consts::HOME_POINT;
    use starfolio::net::MemoryStore;
    use starfolio::{Session, Settings, Tuning};

    const DT: f32 = 1.0 / 60.0;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    let store = MemoryStore::new();
    let start = starfolio::platform::now_ms();
    let mut pilot = Session::new(store.clone(), Tuning::default(), Settings::default(), 1);
    let mut target = Session::new(store.connect_client(), Tuning::default(), Settings::default(), 2);
    pilot.connect(start);
    target.connect(start);

    let step = |pilot: &mut Session<MemoryStore>,
                target: &mut Session<MemoryStore>,
                mut now: f64,
                frames: usize| {
        for _ in 0..frames {
            now += FRAME_MS;
            pilot.frame(now, DT);
            target.frame(now, DT);
            for event in pilot.drain_events() {
                println!("pilot:  {event:?}");
            }
            for event in target.drain_events() {
                println!("target: {event:?}");
            }
        }
        now
    };

    // Target drifts ahead of the pilot, then the pilot shoots
    target.set_move_joystick(1.0);
    let mut now = step(&mut pilot, &mut target, start, 30);
    target.set_move_joystick(0.0);
    now = step(&mut pilot, &mut target, now, 60);
    pilot.request_fire();
    now = step(&mut pilot, &mut target, now, 180);

    // Warp to a destination and back
    pilot.navigate_to("projects", now);
    now = step(&mut pilot, &mut target, now, 90);
    pilot.go_home(now);
    now = step(&mut pilot, &mut target, now, 1);

    let ship = pilot.ship();
    println!(
        "pilot at {:?}, {} peer(s) visible",
        ship.position,
        pilot.view(now).peers.len()
    );
    assert!(ship.position.distance(HOME_POINT) < 1.0);

    pilot.shutdown();
    target.shutdown();
    println!("✓ Headless flight finished");
}
