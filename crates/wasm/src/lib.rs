#![deny(unsafe_code)]
//! Browser bindings for the lava-lamp engine.
//!
//! [`LavaLamp`] owns a [`Lamp`] and a [`CanvasSurface`] and drives them from
//! `requestAnimationFrame`. Resizes requested from JavaScript are queued and
//! applied between frames, never during one.

mod surface;

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, Window};

use lava_lamp_core::{Engine, LampConfig, Surface};
use lava_lamp_metaball::Lamp;

pub use surface::CanvasSurface;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second module instance on the same page already owns the logger.
    let _ = console_log::init_with_level(log::Level::Info);
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

struct Host {
    lamp: Lamp,
    surface: CanvasSurface,
    pixel_ratio: f64,
    running: bool,
    frame_request: Option<i32>,
    /// Latest requested size in CSS pixels; older requests are superseded.
    pending_resize: Option<(f64, f64)>,
}

impl Host {
    fn apply_pending_resize(&mut self) {
        let Some((css_w, css_h)) = self.pending_resize.take() else {
            return;
        };
        let width = (css_w * self.pixel_ratio).floor();
        let height = (css_h * self.pixel_ratio).floor();
        if let Err(e) = self.lamp.resize(width, height) {
            warn!("ignoring resize to {css_w}x{css_h}: {e}");
            return;
        }
        self.surface.resize(width, height);
        let canvas = self.surface.canvas();
        let style = canvas.style();
        let _ = style.set_property("width", &format!("{css_w}px"));
        let _ = style.set_property("height", &format!("{css_h}px"));
    }

    fn step(&mut self) {
        self.apply_pending_resize();
        self.lamp.render_frame(&mut self.surface);
    }
}

fn request_frame(host: Rc<RefCell<Host>>) -> Result<(), JsValue> {
    let next = host.clone();
    let callback = Closure::once_into_js(move |_time: f64| {
        {
            let mut h = next.borrow_mut();
            h.frame_request = None;
            if !h.running {
                return;
            }
            h.step();
        }
        if let Err(e) = request_frame(next) {
            warn!("animation stopped: {e:?}");
        }
    });
    let id = window()?.request_animation_frame(callback.unchecked_ref())?;
    host.borrow_mut().frame_request = Some(id);
    Ok(())
}

/// A lava lamp bound to one `<canvas>` element.
#[wasm_bindgen]
pub struct LavaLamp {
    host: Rc<RefCell<Host>>,
}

#[wasm_bindgen]
impl LavaLamp {
    /// Binds to `canvas`. `config_json` is a full lamp config; without one
    /// the preset layers are used with a random seed.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        config_json: Option<String>,
    ) -> Result<LavaLamp, JsValue> {
        let mut config = match config_json {
            Some(json) => LampConfig::from_json_str(&json).map_err(js_error)?,
            None => LampConfig {
                seed: (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64,
                ..LampConfig::default()
            },
        };
        config.pixel_ratio = window()?.device_pixel_ratio();
        if canvas.client_width() > 0 && canvas.client_height() > 0 {
            config.width = canvas.client_width() as usize;
            config.height = canvas.client_height() as usize;
        }
        config.validate().map_err(js_error)?;

        let (width, height) = config.device_size();
        let mut surface = CanvasSurface::new(canvas)?;
        surface.resize(width, height);
        let pixel_ratio = config.pixel_ratio;
        let lamp = Lamp::for_surface(config, &surface).map_err(js_error)?;
        info!("lava lamp bound to a {width}x{height} canvas");

        Ok(LavaLamp {
            host: Rc::new(RefCell::new(Host {
                lamp,
                surface,
                pixel_ratio,
                running: false,
                frame_request: None,
                pending_resize: None,
            })),
        })
    }

    /// Starts the animation loop. Does nothing if it is already running.
    pub fn start(&self) -> Result<(), JsValue> {
        {
            let mut host = self.host.borrow_mut();
            if host.running {
                return Ok(());
            }
            host.running = true;
        }
        request_frame(self.host.clone())
    }

    /// Stops the loop after the current frame; no further frame is drawn.
    pub fn stop(&self) -> Result<(), JsValue> {
        let mut host = self.host.borrow_mut();
        host.running = false;
        if let Some(id) = host.frame_request.take() {
            window()?.cancel_animation_frame(id)?;
        }
        Ok(())
    }

    /// Queues a resize to `width` x `height` CSS pixels. It takes effect
    /// before the next frame, or immediately when the loop is stopped.
    pub fn resize(&self, width: f64, height: f64) {
        let mut host = self.host.borrow_mut();
        host.pending_resize = Some((width, height));
        if !host.running {
            host.apply_pending_resize();
        }
    }

    /// Renders one frame outside the loop.
    #[wasm_bindgen(js_name = renderFrame)]
    pub fn render_frame(&self) {
        self.host.borrow_mut().step();
    }

    pub fn frame(&self) -> f64 {
        self.host.borrow().lamp.frame() as f64
    }

    /// Current parameters as a JSON string.
    pub fn params(&self) -> String {
        self.host.borrow().lamp.params().to_string()
    }

    #[wasm_bindgen(js_name = paramSchema)]
    pub fn param_schema(&self) -> String {
        self.host.borrow().lamp.param_schema().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.host.borrow().running
    }

    /// Follows the window size: every window `resize` event queues a resize
    /// to the window's inner size.
    #[wasm_bindgen(js_name = followWindow)]
    pub fn follow_window(&self) -> Result<(), JsValue> {
        let window = window()?;
        let host = self.host.clone();
        let target = window.clone();
        let listener = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (Some(w), Some(h)) = (
                target.inner_width().ok().and_then(|v| v.as_f64()),
                target.inner_height().ok().and_then(|v| v.as_f64()),
            ) else {
                return;
            };
            let mut host = host.borrow_mut();
            host.pending_resize = Some((w, h));
            if !host.running {
                host.apply_pending_resize();
            }
        });
        window.add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())?;
        // Lives as long as the page.
        listener.forget();
        Ok(())
    }
}
