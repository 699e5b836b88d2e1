//! `Surface` over a browser `CanvasRenderingContext2d`.

use glam::DVec2;
use log::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

use lava_lamp_core::{CompositeOp, RadialGradient, Shadow, Surface};

const NO_SHADOW: &str = "rgba(0, 0, 0, 0)";

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// The last gradient handed to the context; layers reuse theirs every
    /// frame so this avoids rebuilding it per fill.
    gradient: Option<(RadialGradient, CanvasGradient)>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            gradient: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn build_gradient(&self, gradient: &RadialGradient) -> Result<CanvasGradient, JsValue> {
        let c = gradient.center();
        let native = self
            .ctx
            .create_radial_gradient(c.x, c.y, 0.0, c.x, c.y, gradient.radius())?;
        for stop in gradient.stops() {
            native.add_color_stop(stop.offset as f32, &stop.color.to_css(1.0))?;
        }
        Ok(native)
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
        // Resizing a canvas resets its context state.
        self.gradient = None;
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
    }

    fn set_composite(&mut self, op: CompositeOp) {
        if let Err(e) = self.ctx.set_global_composite_operation(op.as_canvas_str()) {
            warn!("composite {}: {e:?}", op.as_canvas_str());
        }
    }

    fn set_fill(&mut self, gradient: &RadialGradient) {
        if let Some((cached, native)) = &self.gradient {
            if cached == gradient {
                self.ctx.set_fill_style_canvas_gradient(native);
                return;
            }
        }
        match self.build_gradient(gradient) {
            Ok(native) => {
                self.ctx.set_fill_style_canvas_gradient(&native);
                self.gradient = Some((gradient.clone(), native));
            }
            Err(e) => warn!("gradient: {e:?}"),
        }
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        match shadow {
            Some(s) => {
                self.ctx.set_shadow_blur(s.blur);
                self.ctx.set_shadow_offset_x(s.offset.x);
                self.ctx.set_shadow_offset_y(s.offset.y);
                self.ctx.set_shadow_color(&s.color.to_css(s.alpha));
            }
            None => {
                self.ctx.set_shadow_blur(0.0);
                self.ctx.set_shadow_offset_x(0.0);
                self.ctx.set_shadow_offset_y(0.0);
                self.ctx.set_shadow_color(NO_SHADOW);
            }
        }
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, p: DVec2) {
        self.ctx.move_to(p.x, p.y);
    }

    fn line_to(&mut self, p: DVec2) {
        self.ctx.line_to(p.x, p.y);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }
}
