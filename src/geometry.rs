//! Page-space rectangles
//!
//! All coordinates use a top-left origin with y growing downward, so a
//! well-formed rectangle always has `left <= right` and `top <= bottom`.

use crate::PaychequeError;
use std::fmt;

/// One side of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

/// An axis-aligned rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn edge(&self, edge: Edge) -> f32 {
        match edge {
            Edge::Left => self.left,
            Edge::Top => self.top,
            Edge::Right => self.right,
            Edge::Bottom => self.bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Whether a point lies inside the rectangle (edges inclusive)
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Whether the centre of `other` lies inside this rectangle
    pub fn contains_center_of(&self, other: &Rect) -> bool {
        let (x, y) = other.center();
        self.contains_point(x, y)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// Check the edge ordering of a derived rectangle.
    ///
    /// An inverted rectangle means an anchor was found somewhere the template
    /// does not put it.
    pub fn validated(self, context: impl Into<String>) -> Result<Rect, PaychequeError> {
        if self.is_ordered() {
            Ok(self)
        } else {
            Err(PaychequeError::InvertedRect {
                context: context.into(),
                rect: self,
            })
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x1 = {:.2}; y1 = {:.2}; x2 = {:.2}; y2 = {:.2}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let r = Rect::new(10.0, 20.0, 30.0, 60.0);
        assert_eq!(r.edge(Edge::Left), 10.0);
        assert_eq!(r.edge(Edge::Bottom), 60.0);
        assert_eq!(r.center(), (20.0, 40.0));
        assert_eq!(r.width(), 20.0);
        assert_eq!(r.height(), 40.0);
    }

    #[test]
    fn test_contains_center_of() {
        let clip = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(clip.contains_center_of(&Rect::new(90.0, 90.0, 108.0, 108.0)));
        assert!(!clip.contains_center_of(&Rect::new(95.0, 95.0, 115.0, 115.0)));
    }

    #[test]
    fn test_validated_rejects_inverted() {
        let ok = Rect::new(1.0, 1.0, 2.0, 2.0).validated("ok");
        assert!(ok.is_ok());

        let err = Rect::new(5.0, 1.0, 2.0, 2.0).validated("Taxes row region");
        match err {
            Err(PaychequeError::InvertedRect { context, .. }) => {
                assert_eq!(context, "Taxes row region")
            }
            other => panic!("expected InvertedRect, got {:?}", other),
        }
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 5.0, 10.0, 15.0);
        let b = Rect::new(8.0, 4.0, 20.0, 12.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 4.0, 20.0, 15.0));
    }
}
