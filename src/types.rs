#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vector2D { x, y }
    }

    pub fn add(&self, other: Vector2D) -> Self {
        Vector2D::new(self.x + other.x, self.y + other.y)
    }

    /// Unit vector the game's sprites treat as "forward" for a heading in
    /// degrees: heading 0 points up the screen, positive headings turn
    /// counter-clockwise.
    pub fn from_heading(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        Vector2D::new(-radians.sin(), -radians.cos())
    }
}

/// Integer pixel rectangle, `left`/`top` inclusive, `right`/`bottom` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Rect { left, top, width, height }
    }

    /// Rectangle of the given size whose centre is closest to `center`.
    pub fn centered_at(center: Vector2D, width: i32, height: i32) -> Self {
        let left = (center.x - width as f64 / 2.0).round() as i32;
        let top = (center.y - height as f64 / 2.0).round() as i32;
        Rect { left, top, width, height }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn center(&self) -> Vector2D {
        Vector2D::new(
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }

    /// Strict overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }
}

pub fn wrap_coordinate(value: f64, max: f64) -> f64 {
    let wrapped = value % max;
    if wrapped < 0.0 {
        // -0.0 and tiny negatives can round up to `max` itself
        let shifted = wrapped + max;
        if shifted >= max { 0.0 } else { shifted }
    } else {
        wrapped
    }
}

/// Heading in degrees reduced to `[0, 360)`.
pub fn wrap_degrees(degrees: f64) -> f64 {
    wrap_coordinate(degrees, 360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_coordinate_stays_in_range() {
        for value in [-1250.5, -1200.0, -0.25, -0.0, 0.0, 17.0, 1199.9, 1200.0, 2401.0] {
            let wrapped = wrap_coordinate(value, 1200.0);
            assert!((0.0..1200.0).contains(&wrapped), "{value} wrapped to {wrapped}");
        }
        assert_eq!(wrap_coordinate(-10.0, 100.0), 90.0);
        assert_eq!(wrap_coordinate(110.0, 100.0), 10.0);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(382.5), 22.5);
        assert_eq!(wrap_degrees(-22.5), 337.5);
        assert_eq!(wrap_degrees(360.0), 0.0);
    }

    #[test]
    fn test_rect_intersects_excludes_touching_edges() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(!a.intersects(&Rect::new(0, 10, 5, 5)));
        assert!(Rect::new(2, 2, 3, 3).intersects(&a));
    }

    #[test]
    fn test_rect_centered_at() {
        let r = Rect::centered_at(Vector2D::new(50.0, 40.0), 20, 10);
        assert_eq!(r, Rect::new(40, 35, 20, 10));
        assert_eq!(r.center(), Vector2D::new(50.0, 40.0));
    }

    #[test]
    fn test_from_heading_points_up_at_zero() {
        let v = Vector2D::from_heading(0.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y + 1.0).abs() < 1e-12);
        let left = Vector2D::from_heading(90.0);
        assert!((left.x + 1.0).abs() < 1e-12);
    }
}
