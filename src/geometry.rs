use std::fmt;
use std::ops::{Add, Sub};

/// Scalar usable as a rectangle coordinate.
///
/// Layout runs in continuous `f64` space; rendering uses whole terminal
/// cells (`i32`).
pub trait Coord:
    Copy + PartialOrd + Default + fmt::Debug + Add<Output = Self> + Sub<Output = Self>
{
    fn to_f64(self) -> f64;
}

impl Coord for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

impl Coord for i32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Closed-open span `[lo, hi)` on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Interval<T> {
    pub lo: T,
    pub hi: T,
}

impl<T: Coord> Interval<T> {
    pub fn new(lo: T, hi: T) -> Self {
        Self { lo, hi }
    }

    pub fn from_point(pt: T) -> Self {
        Self { lo: pt, hi: pt }
    }

    pub fn length(&self) -> T {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains(&self, x: T) -> bool {
        self.lo <= x && x < self.hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point<i32> {
    pub fn to_r2(self) -> Point<f64> {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Axis-aligned rectangle built from one interval per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect<T> {
    pub x: Interval<T>,
    pub y: Interval<T>,
}

/// Continuous layout space.
pub type R2Rect = Rect<f64>;
/// Terminal cell space.
pub type Z2Rect = Rect<i32>;

impl<T: Coord> Rect<T> {
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x: Interval::new(x, x + width),
            y: Interval::new(y, y + height),
        }
    }

    pub fn from_points(lo: Point<T>, hi: Point<T>) -> Self {
        Self {
            x: Interval::new(lo.x, hi.x),
            y: Interval::new(lo.y, hi.y),
        }
    }

    /// Degenerate rectangle sitting on a single point.
    pub fn from_point(pt: Point<T>) -> Self {
        Self {
            x: Interval::from_point(pt.x),
            y: Interval::from_point(pt.y),
        }
    }

    pub fn lo(&self) -> Point<T> {
        Point::new(self.x.lo, self.y.lo)
    }

    pub fn hi(&self) -> Point<T> {
        Point::new(self.x.hi, self.y.hi)
    }

    pub fn width(&self) -> T {
        self.x.length()
    }

    pub fn height(&self) -> T {
        self.y.length()
    }

    pub fn size(&self) -> Point<T> {
        Point::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }

    pub fn has_area(&self) -> bool {
        self.width() > T::default() && self.height() > T::default()
    }

    pub fn contains_point(&self, x: T, y: T) -> bool {
        self.x.contains(x) && self.y.contains(y)
    }
}

impl R2Rect {
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn approx_eq(&self, other: &R2Rect) -> bool {
        const EPSILON: f64 = 1e-9;
        (self.x.lo - other.x.lo).abs() < EPSILON
            && (self.x.hi - other.x.hi).abs() < EPSILON
            && (self.y.lo - other.y.lo).abs() < EPSILON
            && (self.y.hi - other.y.hi).abs() < EPSILON
    }

    /// Rounds both corners down onto the cell grid.
    pub fn snap_round(&self) -> Z2Rect {
        Z2Rect {
            x: Interval::new(self.x.lo.floor() as i32, self.x.hi.floor() as i32),
            y: Interval::new(self.y.lo.floor() as i32, self.y.hi.floor() as i32),
        }
    }
}

impl<T: Coord + fmt::Display> fmt::Display for Rect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Lo({}, {}), Hi({}, {})]",
            self.x.lo, self.y.lo, self.x.hi, self.y.hi
        )
    }
}
