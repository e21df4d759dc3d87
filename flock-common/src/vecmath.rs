use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A 2D vector in world space. All operations return new values.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    /// Creates a new Vector2.
    pub const fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    /// Creates a zero vector.
    pub const fn zero() -> Self {
        Vector2 { x: 0.0, y: 0.0 }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Calculates the squared length (magnitude) of the vector.
    pub fn len_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Calculates the length (magnitude) of the vector.
    pub fn len(&self) -> f64 {
        self.len_squared().sqrt()
    }

    /// Returns the unit vector pointing the same way, or `None` for the zero vector.
    pub fn unit(&self) -> Option<Self> {
        let len = self.len();
        if len > 0.0 {
            Some(self.scaled(1.0 / len))
        } else {
            None
        }
    }

    /// Rescales the vector to `len`. `None` if there is no direction to keep.
    pub fn with_len(&self, len: f64) -> Option<Self> {
        self.unit().map(|u| u.scaled(len))
    }

    /// Limits the magnitude to `max`, leaving shorter vectors untouched.
    pub fn limit(&self, max: f64) -> Self {
        if self.len() > max {
            self.with_len(max).unwrap_or(*self)
        } else {
            *self
        }
    }

    /// Scales the vector by a scalar value.
    pub fn scaled(&self, scalar: f64) -> Self {
        Vector2 { x: self.x * scalar, y: self.y * scalar }
    }

    /// Adds another vector to this vector.
    pub fn add(&self, other: Vector2) -> Self {
        Vector2 { x: self.x + other.x, y: self.y + other.y }
    }

    /// Subtracts another vector from this vector.
    pub fn sub(&self, other: Vector2) -> Self {
        Vector2 { x: self.x - other.x, y: self.y - other.y }
    }

    /// Calculates the dot product with another vector.
    pub fn dot(&self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Calculates the distance to another vector (point).
    pub fn distance(&self, other: Vector2) -> f64 {
        self.sub(other).len()
    }

    /// Heading in radians, via atan2. Only meaningful for rendering orientation.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

// Implement standard operators for convenience
impl Add for Vector2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self { x: self.x * scalar, y: self.y * scalar }
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self { x: self.x / scalar, y: self.y / scalar }
    }
}

impl Neg for Vector2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

/// Axis-aligned rectangle agents are spawned into.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vector2,
    pub max: Vector2,
}

impl WorldBounds {
    pub fn new(min: Vector2, max: Vector2) -> Self {
        WorldBounds { min, max }
    }

    /// A `width` x `height` viewport centered on the origin.
    pub fn centered(width: f64, height: f64) -> Self {
        WorldBounds {
            min: Vector2::new(-width / 2.0, -height / 2.0),
            max: Vector2::new(width / 2.0, height / 2.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
