/// Geometric primitives for the reorder engine.
///
/// Coordinates are in the host's visual space (CSS pixels in a browser
/// host). Everything here is pure math so the hit-testing and tie-break
/// rules stay testable without a rendering surface.

/// A point in visual space (pointer or touch position).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle: position of the top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Vertical midpoint, the sole tie-break line for placeholder
    /// insertion: a pointer above it inserts before the item, at or
    /// below it inserts after.
    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Whether the point lies inside this rectangle.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// The same rectangle shifted by a translation delta.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_y() {
        // top=100, height=40 puts the tie-break line at 120
        let rect = Rect::new(0.0, 100.0, 80.0, 40.0);
        assert_eq!(rect.mid_y(), 120.0);
        assert!(119.0 < rect.mid_y());
        assert!(!(120.0 < rect.mid_y()));
    }

    #[test]
    fn test_contains() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(29.9, 29.9)));
        assert!(!rect.contains(Point::new(30.0, 15.0)));
        assert!(!rect.contains(Point::new(9.9, 15.0)));
    }

    #[test]
    fn test_translated() {
        let rect = Rect::new(5.0, 5.0, 10.0, 10.0);
        let moved = rect.translated(3.0, -2.0);
        assert_eq!(moved, Rect::new(8.0, 3.0, 10.0, 10.0));
    }
}
