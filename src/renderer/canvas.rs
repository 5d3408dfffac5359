//! Canvas 2D backend
//!
//! Replays a [`DrawList`] onto an `HtmlCanvasElement`. The backing buffer is
//! resized to `displayed size * devicePixelRatio` whenever it drifts, and the
//! context transform maps logical game pixels onto it.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::draw_list::{DrawCommand, DrawList};
use super::surface::SurfaceMetrics;
use super::{FrameView, Paint, RenderError, Renderer};
use crate::sim::GameState;

const HUD_COLOR: &str = "#eceff1";
const HUD_FONT: &str = "16px monospace";
const BANNER_FONT: &str = "bold 28px monospace";

pub struct Canvas2dRenderer {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    metrics: SurfaceMetrics,
}

fn css_color(color: u32) -> String {
    format!("#{:06x}", color & 0xff_ffff)
}

fn js_err(e: wasm_bindgen::JsValue) -> RenderError {
    RenderError::Backend(format!("{:?}", e))
}

impl Canvas2dRenderer {
    pub fn new(canvas: HtmlCanvasElement, metrics: SurfaceMetrics) -> Self {
        Self {
            canvas,
            ctx: None,
            metrics,
        }
    }

    pub fn set_metrics(&mut self, metrics: SurfaceMetrics) {
        self.metrics = metrics;
    }

    pub fn metrics(&self) -> &SurfaceMetrics {
        &self.metrics
    }

    /// The 2d context, fetched on first use. A canvas already claimed by
    /// another context type reports `SurfaceUnavailable`.
    fn context(&mut self) -> Result<CanvasRenderingContext2d, RenderError> {
        if let Some(ctx) = &self.ctx {
            return Ok(ctx.clone());
        }
        let ctx = self
            .canvas
            .get_context("2d")
            .map_err(js_err)?
            .ok_or(RenderError::SurfaceUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Backend("context is not CanvasRenderingContext2d".into()))?;
        self.ctx = Some(ctx.clone());
        Ok(ctx)
    }

    fn sync_size(&self) {
        let current = (self.canvas.width(), self.canvas.height());
        if let Some((w, h)) = self.metrics.needs_resize(current) {
            log::debug!("canvas backing {}x{} -> {}x{}", current.0, current.1, w, h);
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d, list: &DrawList) -> Result<(), RenderError> {
        let logical = self.metrics.logical;
        for command in &list.commands {
            match *command {
                DrawCommand::Clear { color } => {
                    ctx.set_global_alpha(1.0);
                    ctx.set_fill_style_str(&css_color(color));
                    ctx.fill_rect(0.0, 0.0, f64::from(logical.x), f64::from(logical.y));
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    color,
                    alpha,
                } => {
                    ctx.set_global_alpha(f64::from(alpha));
                    ctx.set_fill_style_str(&css_color(color));
                    ctx.begin_path();
                    ctx.arc(
                        f64::from(center.x),
                        f64::from(center.y),
                        f64::from(radius.max(0.0)),
                        0.0,
                        TAU,
                    )
                    .map_err(js_err)?;
                    ctx.fill();
                }
                DrawCommand::Rect {
                    pos,
                    size,
                    color,
                    alpha,
                } => {
                    ctx.set_global_alpha(f64::from(alpha));
                    ctx.set_fill_style_str(&css_color(color));
                    ctx.fill_rect(
                        f64::from(pos.x),
                        f64::from(pos.y),
                        f64::from(size.x),
                        f64::from(size.y),
                    );
                }
            }
        }
        ctx.set_global_alpha(1.0);
        Ok(())
    }

    fn draw_hud<T>(
        &self,
        ctx: &CanvasRenderingContext2d,
        view: &FrameView<'_, T>,
    ) -> Result<(), RenderError> {
        let logical = self.metrics.logical;
        ctx.set_fill_style_str(HUD_COLOR);
        ctx.set_font(HUD_FONT);
        ctx.set_text_align("left");
        ctx.fill_text(&format!("SCORE {}", view.score), 12.0, 24.0).map_err(js_err)?;
        ctx.set_text_align("right");
        ctx.fill_text(&format!("LIVES {}", view.lives), f64::from(logical.x) - 12.0, 24.0)
            .map_err(js_err)?;

        let banner = match view.state {
            GameState::Running => return Ok(()),
            GameState::Idle => "PRESS START",
            GameState::Paused => "PAUSED",
            GameState::GameOver => "GAME OVER",
        };
        ctx.set_font(BANNER_FONT);
        ctx.set_text_align("center");
        ctx.fill_text(banner, f64::from(logical.x) * 0.5, f64::from(logical.y) * 0.5)
            .map_err(js_err)
    }
}

impl<T: Paint> Renderer<T> for Canvas2dRenderer {
    fn render(&mut self, view: &FrameView<'_, T>) -> Result<(), RenderError> {
        let ctx = self.context()?;
        self.sync_size();

        let scale = self.metrics.logical_to_backing_scale();
        ctx.set_transform(f64::from(scale.x), 0.0, 0.0, f64::from(scale.y), 0.0, 0.0)
            .map_err(js_err)?;

        self.draw(&ctx, &DrawList::build(view))?;
        self.draw_hud(&ctx, view)
    }
}
