//! Geometry primitives for the pointer surface.
//!
//! All values are in host-panel logical units. The panel is the only
//! coordinate space this crate deals in, so unlike a full rendering
//! pipeline there is no space-tagging here.

/// A 2D position in panel logical units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert to an f32 pair for handoff to drawing APIs.
    pub fn as_f32(&self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

/// Panel dimensions in logical units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert to swap-chain pixel dimensions.
    ///
    /// Swap-chain buffers must be at least 1x1 even when the panel reports
    /// a zero or fractional size during layout.
    pub fn to_buffer_extent(&self) -> (u32, u32) {
        ((self.width as u32).max(1), (self.height as u32).max(1))
    }
}

/// An axis-aligned rectangle in panel logical units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A square of the given side length centered on `center`.
    pub fn centered_square(center: Point, side: f64) -> Self {
        let half = side / 2.0;
        Self {
            left: center.x - half,
            top: center.y - half,
            right: center.x + half,
            bottom: center.y + half,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_square() {
        let rect = Rect::centered_square(Point::new(50.0, 30.0), 40.0);
        assert_eq!(rect, Rect::new(30.0, 10.0, 70.0, 50.0));
        assert_eq!(rect.center(), Point::new(50.0, 30.0));
        assert_eq!(rect.width(), 40.0);
        assert_eq!(rect.height(), 40.0);
    }

    #[test]
    fn test_buffer_extent_clamps_to_one() {
        assert_eq!(Size::new(0.0, 0.0).to_buffer_extent(), (1, 1));
        assert_eq!(Size::new(0.4, 768.0).to_buffer_extent(), (1, 768));
        assert_eq!(Size::new(1024.0, 768.0).to_buffer_extent(), (1024, 768));
    }
}
