//! Geometry and color types
//!
//! Rectangles are stored as origin + size, with edge accessors for code that
//! thinks in left/top/right/bottom terms (which is how host bounds usually
//! arrive).

// ─────────────────────────────────────────────────────────────────────────────
// Points and Sizes
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rect
// ─────────────────────────────────────────────────────────────────────────────

/// 2D rectangle in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Build a rect from its four edges
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// True when the rect has no positive, finite area
    pub fn is_empty(&self) -> bool {
        !(self.size.width.is_finite()
            && self.size.height.is_finite()
            && self.size.width > 0.0
            && self.size.height > 0.0)
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }

    /// Express this rect in the local space of `parent`
    ///
    /// Both rects must share a coordinate space (usually window space).
    pub fn relative_to(&self, parent: &Rect) -> Self {
        self.offset(-parent.origin.x, -parent.origin.y)
    }
}

/// Bounds of a view from its window location and size
///
/// `top_inset` is the height of any chrome above the content area (status
/// bar, title bar) that window locations include but drawing coordinates
/// do not.
pub fn window_rect(location: Point, size: Size, top_inset: f32) -> Rect {
    Rect::from_origin_size(Point::new(location.x, location.y - top_inset), size)
}

/// Locate a target inside its drawing parent
///
/// Both inputs are window-space bounds as produced by [`window_rect`].
pub fn bounds_in_parent(target_window: Rect, parent_window: Rect) -> Rect {
    target_window.relative_to(&parent_window)
}

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color with components in 0.0..=1.0
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAARRGGBB` color
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
        Self::rgba(channel(16), channel(8), channel(0), channel(24))
    }

    /// Pack into `0xAARRGGBB`
    pub fn to_argb(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Replace alpha with an 8-bit opacity (0 = transparent, 255 = opaque)
    pub fn with_alpha_u8(self, alpha: u8) -> Self {
        self.with_alpha(alpha as f32 / 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::from_ltrb(10.0, 20.0, 110.0, 70.0);
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert_eq!(rect.center(), Point::new(60.0, 45.0));
    }

    #[test]
    fn test_rect_is_empty() {
        assert!(Rect::ZERO.is_empty());
        assert!(Rect::new(0.0, 0.0, 10.0, -1.0).is_empty());
        assert!(Rect::new(0.0, 0.0, f32::NAN, 10.0).is_empty());
        assert!(!Rect::new(-5.0, -5.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_bounds_in_parent() {
        // Parent sits below a 24px status bar, target is 40px further in
        let parent = window_rect(Point::new(0.0, 80.0), Size::new(400.0, 600.0), 24.0);
        let target = window_rect(Point::new(40.0, 180.0), Size::new(96.0, 48.0), 24.0);

        let local = bounds_in_parent(target, parent);
        assert_eq!(local, Rect::new(40.0, 100.0, 96.0, 48.0));
    }

    #[test]
    fn test_color_argb() {
        let color = Color::from_argb(0x8022FF00);
        assert!((color.a - 128.0 / 255.0).abs() < 1e-6);
        assert!((color.r - 34.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.g, 1.0);
        assert_eq!(color.b, 0.0);
        assert_eq!(color.to_argb(), 0x8022FF00);

        let faded = color.with_alpha_u8(0);
        assert_eq!(faded.a, 0.0);
        assert_eq!(faded.r, color.r);
    }
}
