//! A single expanding, fading outline
//!
//! A pulse is created at a timestamp with a fixed lifetime. Its path never
//! changes after construction; each update only recomputes the scale
//! (applied about the shape's center at draw time) and the stroke opacity,
//! both as pure functions of the elapsed fraction of its life.

use pulse_core::{Color, DrawContext, LineCap, LineJoin, Path, Point, Rect, Stroke, Transform};
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

const MAX_ALPHA: f32 = 255.0;
const CORNER_RADIUS: f32 = 10.0;

/// Outline drawn by each pulse
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseShape {
    /// Circle inscribed in the target bounds
    #[default]
    Circle,
    /// The target's rectangular outline
    Outline,
}

/// Default stroke width for a target of the given width
///
/// 6.5% of the width, never thinner than 5px.
pub fn default_stroke_width(target_width: f32) -> f32 {
    (target_width.abs() * 0.065).max(5.0)
}

/// One animated pulse
#[derive(Clone, Debug)]
pub struct Pulse {
    bounds: Rect,
    shape: PulseShape,
    path: Path,
    center: Point,
    stroke: Stroke,
    color: Color,
    created_at_ms: u64,
    lifetime_ms: u64,
    max_scale: f32,
    alpha_easing: Easing,
    scale_easing: Easing,
    scale: f32,
    opacity: u8,
}

impl Pulse {
    /// Create a pulse over `bounds` born at `created_at_ms`
    ///
    /// Starts at scale 1.0 and full opacity with a 1s lifetime; use the
    /// `with_*` builders to configure it before the first update.
    pub fn new(bounds: Rect, shape: PulseShape, created_at_ms: u64) -> Self {
        let center = bounds.center();
        let path = match shape {
            PulseShape::Circle => {
                let radius = bounds.width().min(bounds.height().abs()) / 2.0;
                Path::circle(center, radius)
            }
            PulseShape::Outline => Path::rect(bounds),
        };

        Self {
            bounds,
            shape,
            path,
            center,
            stroke: Stroke::new(default_stroke_width(bounds.width()))
                .with_cap(LineCap::Round)
                .with_join(LineJoin::Round)
                .with_corner_radius(CORNER_RADIUS),
            color: Color::WHITE,
            created_at_ms,
            lifetime_ms: 1000,
            max_scale: 10.0,
            alpha_easing: Easing::Linear,
            scale_easing: Easing::Linear,
            scale: 1.0,
            opacity: u8::MAX,
        }
    }

    pub fn with_lifetime(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    pub fn with_max_scale(mut self, max_scale: f32) -> Self {
        self.max_scale = max_scale;
        self
    }

    /// Stroke color; its alpha is replaced by the animated opacity
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke.width = width;
        self
    }

    pub fn with_alpha_easing(mut self, easing: Easing) -> Self {
        self.alpha_easing = easing;
        self
    }

    pub fn with_scale_easing(mut self, easing: Easing) -> Self {
        self.scale_easing = easing;
        self
    }

    /// Fraction of the lifetime elapsed at `now_ms`, clamped to 0.0..=1.0
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.lifetime_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.created_at_ms);
        (elapsed as f64 / self.lifetime_ms as f64).min(1.0) as f32
    }

    /// Recompute scale and opacity for `now_ms`
    pub fn update(&mut self, now_ms: u64) {
        let progress = self.progress(now_ms);

        // Float-to-int casts saturate, so curves that overshoot stay in range
        self.opacity = (MAX_ALPHA - self.alpha_easing.apply(progress) * MAX_ALPHA) as u8;
        self.scale = 1.0 + (self.max_scale - 1.0) * self.scale_easing.apply(progress);
    }

    /// True until the full lifetime has elapsed
    pub fn is_alive(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) < self.lifetime_ms
    }

    /// Stroke the path scaled about its center at the current opacity
    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        ctx.push_transform(Transform::scale_centered(
            self.scale,
            self.scale,
            self.center.x,
            self.center.y,
        ));
        ctx.stroke_path(
            &self.path,
            &self.stroke,
            self.color.with_alpha_u8(self.opacity),
        );
        ctx.pop_transform();
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn shape(&self) -> PulseShape {
        self.shape
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current opacity, 0 (transparent) to 255 (opaque)
    pub fn opacity(&self) -> u8 {
        self.opacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{DrawCommand, RecordingContext};

    fn bounds() -> Rect {
        Rect::new(100.0, 200.0, 80.0, 40.0)
    }

    fn pulse(created_at_ms: u64) -> Pulse {
        Pulse::new(bounds(), PulseShape::Circle, created_at_ms)
            .with_lifetime(900)
            .with_max_scale(3.0)
            .with_alpha_easing(Easing::EaseIn)
            .with_scale_easing(Easing::Linear)
    }

    #[test]
    fn test_default_stroke_width() {
        assert_eq!(default_stroke_width(40.0), 5.0);
        assert!((default_stroke_width(200.0) - 13.0).abs() < 1e-4);
        let width = Pulse::new(bounds(), PulseShape::Circle, 0).stroke().width;
        assert!((width - 5.2).abs() < 1e-4);
    }

    #[test]
    fn test_circle_geometry() {
        let p = pulse(0);
        assert_eq!(p.center(), Point::new(140.0, 220.0));
        // Radius is half the shorter side
        assert_eq!(p.path().bounds(), Rect::new(120.0, 200.0, 40.0, 40.0));
    }

    #[test]
    fn test_outline_geometry() {
        let p = Pulse::new(bounds(), PulseShape::Outline, 0);
        assert_eq!(p.shape(), PulseShape::Outline);
        assert_eq!(p.path().bounds(), bounds());
        assert_eq!(p.path().commands().len(), 5);
    }

    #[test]
    fn test_update_curves() {
        let mut p = pulse(1000);

        p.update(1000);
        assert_eq!(p.scale(), 1.0);
        assert_eq!(p.opacity(), 255);

        // Halfway: linear scale 1 + 2 * 0.5, alpha 255 - 255 * 0.25
        p.update(1450);
        assert!((p.scale() - 2.0).abs() < 1e-6);
        assert_eq!(p.opacity(), 191);

        p.update(1900);
        assert!((p.scale() - 3.0).abs() < 1e-6);
        assert_eq!(p.opacity(), 0);
    }

    #[test]
    fn test_update_is_pure() {
        let mut a = pulse(0);
        let mut b = pulse(0);

        a.update(300);
        a.update(300);
        b.update(700);
        b.update(300);

        assert_eq!(a.scale(), b.scale());
        assert_eq!(a.opacity(), b.opacity());
    }

    #[test]
    fn test_progress_clamped() {
        let mut p = pulse(0);
        assert_eq!(p.progress(5000), 1.0);
        p.update(5000);
        assert!((p.scale() - 3.0).abs() < 1e-6);
        assert_eq!(p.opacity(), 0);

        // Timestamps before creation count as no time elapsed
        let mut early = pulse(500);
        early.update(100);
        assert_eq!(early.progress(100), 0.0);
        assert_eq!(early.scale(), 1.0);
    }

    #[test]
    fn test_is_alive_monotone() {
        let p = pulse(100);
        let mut was_alive = true;
        for now in (0..2000).step_by(15) {
            let alive = p.is_alive(now);
            assert!(!(alive && !was_alive), "revived at {}", now);
            was_alive = alive;
        }
        assert!(p.is_alive(999));
        assert!(!p.is_alive(1000));
    }

    #[test]
    fn test_draw_commands() {
        let mut p = pulse(0).with_color(Color::from_argb(0xFF22FF22));
        p.update(450);

        let mut ctx = RecordingContext::new();
        p.draw(&mut ctx);

        let commands = ctx.commands();
        assert_eq!(commands.len(), 3);
        match &commands[0] {
            DrawCommand::PushTransform(t) => {
                // The center stays put under the scale
                assert_eq!(t.transform_point(p.center()), p.center());
            }
            other => panic!("unexpected command {:?}", other),
        }
        match &commands[1] {
            DrawCommand::StrokePath { stroke, color, .. } => {
                assert_eq!(stroke.cap, LineCap::Round);
                assert_eq!(stroke.corner_radius, 10.0);
                assert!((color.a - 191.0 / 255.0).abs() < 1e-6);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(commands[2], DrawCommand::PopTransform);
        assert_eq!(ctx.transform_depth(), 0);
    }
}
