//! Three-dimensional points and per-axis point ranges
//!
//! A [`Point3Range`] is three independent real ranges, one per axis. Containment,
//! rescaling and distance are always evaluated axis by axis in the fixed order
//! x, y, z; axes are never mixed diagonally.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parameters::parse;
use crate::parameters::range::ValueRange;

/// Coordinate axis of a [`Point3`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in flattening order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of the axis in a flattened point.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(label)
    }
}

/// A point in three-dimensional space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_components(components: [f64; 3]) -> Self {
        Self::new(components[0], components[1], components[2])
    }

    /// Coordinates in x, y, z order.
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Parse `x,y,z`, optionally wrapped in `()`, `[]` or `{}`.
    pub fn parse(text: &str) -> Result<Self> {
        parse::parse_point(text)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Axis-aligned box of allowed points, built from three independent ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3Range {
    x: ValueRange<f64>,
    y: ValueRange<f64>,
    z: ValueRange<f64>,
}

impl Point3Range {
    /// Create a range spanning two corner points
    ///
    /// Each axis is validated on its own; any axis with `min > max` fails with
    /// `InvalidRange`.
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::point::{Point3, Point3Range};
    ///
    /// let range = Point3Range::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0)).unwrap();
    /// assert!(range.contains(&Point3::new(0.5, 1.5, 3.0)));
    /// assert!(!range.contains(&Point3::new(0.5, 2.5, 3.0)));
    /// ```
    pub fn new(min: Point3, max: Point3) -> Result<Self> {
        Ok(Self {
            x: ValueRange::new(min.x, max.x)?,
            y: ValueRange::new(min.y, max.y)?,
            z: ValueRange::new(min.z, max.z)?,
        })
    }

    pub fn from_axes(x: ValueRange<f64>, y: ValueRange<f64>, z: ValueRange<f64>) -> Self {
        Self { x, y, z }
    }

    /// Same range `[min, max]` on every axis.
    pub fn uniform(min: f64, max: f64) -> Result<Self> {
        let range = ValueRange::new(min, max)?;
        Ok(Self::from_axes(range, range, range))
    }

    pub fn axis(&self, axis: Axis) -> &ValueRange<f64> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// The three axis ranges in x, y, z order.
    pub fn axes(&self) -> [ValueRange<f64>; 3] {
        [self.x, self.y, self.z]
    }

    pub fn min_point(&self) -> Point3 {
        Point3::new(self.x.min(), self.y.min(), self.z.min())
    }

    pub fn max_point(&self) -> Point3 {
        Point3::new(self.x.max(), self.y.max(), self.z.max())
    }

    pub fn mid_point(&self) -> Point3 {
        Point3::new(self.x.mid(), self.y.mid(), self.z.mid())
    }

    /// A point is inside when every coordinate lies inside its axis range.
    pub fn contains(&self, point: &Point3) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.axis(axis).contains(point.get(axis)))
    }

    /// Rescale a point into another point range, axis by axis.
    pub fn scale(&self, point: &Point3, to: &Point3Range) -> Result<Point3> {
        Ok(Point3::new(
            self.x.scale(point.x, &to.x)?,
            self.y.scale(point.y, &to.y)?,
            self.z.scale(point.z, &to.z)?,
        ))
    }

    /// Rescale a single coordinate of the given axis into `to`.
    pub fn scale_axis(&self, axis: Axis, value: f64, to: &ValueRange<f64>) -> Result<f64> {
        self.axis(axis).scale(value, to)
    }

    /// Per-axis distance from the point to the box.
    ///
    /// Each coordinate of the result is the distance of that coordinate to its own
    /// axis range, so axes that are inside contribute zero.
    pub fn distance_outside(&self, point: &Point3) -> Result<Point3> {
        Ok(Point3::new(
            self.x.distance_outside(point.x)?,
            self.y.distance_outside(point.y)?,
            self.z.distance_outside(point.z)?,
        ))
    }

    /// Replace the minimum corner.
    pub fn with_min(&self, min: Point3) -> Result<Self> {
        Self::new(min, self.max_point())
    }

    /// Replace the maximum corner.
    pub fn with_max(&self, max: Point3) -> Result<Self> {
        Self::new(self.min_point(), max)
    }

    pub fn with_min_str(&self, text: &str) -> Result<Self> {
        self.with_min(Point3::parse(text)?)
    }

    pub fn with_max_str(&self, text: &str) -> Result<Self> {
        self.with_max(Point3::parse(text)?)
    }

    pub fn from_strs(min: &str, max: &str) -> Result<Self> {
        Self::new(Point3::parse(min)?, Point3::parse(max)?)
    }
}

impl fmt::Display for Point3Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[({}), ({})]", self.min_point(), self.max_point())
    }
}
