//! Pixel-to-meter calibration and the measurements derived from it.

use crate::geometry::{distance, polygon_area, polyline_length};
use crate::shapes::{Geometry, MapObject};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("real-world distance must be positive, got {0}")]
    NonPositiveDistance(f64),
    #[error("calibration points coincide")]
    ZeroLength,
    #[error("shape is not a line segment")]
    NotALine,
    #[error("no shape with id {0}")]
    UnknownShape(crate::shapes::ShapeId),
    #[error("no calibration line is waiting for a distance")]
    NothingPending,
}

/// Active calibration of a project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub start: Point,
    pub end: Point,
    pub real_world_meters: f64,
    pub pixels_per_meter: f64,
}

impl Calibration {
    /// Derive a calibration from two points and the distance between them in meters.
    pub fn new(start: Point, end: Point, meters: f64) -> Result<Self, CalibrationError> {
        if !(meters > 0.0) || !meters.is_finite() {
            return Err(CalibrationError::NonPositiveDistance(meters));
        }
        let pixels = distance(start, end);
        if pixels <= f64::EPSILON {
            return Err(CalibrationError::ZeroLength);
        }
        Ok(Self {
            start,
            end,
            real_world_meters: meters,
            pixels_per_meter: pixels / meters,
        })
    }

    /// Calibrate from an existing line-segment shape.
    pub fn from_line(object: &MapObject, meters: f64) -> Result<Self, CalibrationError> {
        match object.geometry {
            Geometry::Threshold { start, end } => Self::new(start, end, meters),
            _ => Err(CalibrationError::NotALine),
        }
    }

    pub fn pixel_distance(&self) -> f64 {
        distance(self.start, self.end)
    }
}

/// A measured calibration line waiting for its real-world distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCalibration {
    pub start: Point,
    pub end: Point,
    pub pixel_distance: f64,
}

impl PendingCalibration {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            pixel_distance: distance(start, end),
        }
    }

    pub fn confirm(&self, meters: f64) -> Result<Calibration, CalibrationError> {
        Calibration::new(self.start, self.end, meters)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementUnit {
    Meters,
    SquareMeters,
    Pixels,
}

/// The size of a shape: area for closed shapes, length for open ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: MeasurementUnit,
    pub calibrated: bool,
}

impl Measurement {
    pub fn format(&self) -> String {
        match (self.unit, self.calibrated) {
            (MeasurementUnit::SquareMeters, false) => "uncalibrated".to_string(),
            (MeasurementUnit::SquareMeters, true) => format!("{:.2} m²", self.value),
            (MeasurementUnit::Meters, _) => format!("{:.2} m", self.value),
            (MeasurementUnit::Pixels, _) => format!("{:.1} px", self.value),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Measure a shape. Every closed kind goes through one area path.
pub fn measure(object: &MapObject, calibration: Option<&Calibration>) -> Measurement {
    let ppm = calibration.map(|c| c.pixels_per_meter).filter(|r| *r > 0.0);
    let geometry = &object.geometry;

    if let Some(radius) = geometry.circle_radius() {
        let value = ppm.map_or(0.0, |r| std::f64::consts::PI * radius * radius / (r * r));
        return Measurement {
            value,
            unit: MeasurementUnit::SquareMeters,
            calibrated: ppm.is_some(),
        };
    }
    if let Some(ring) = geometry.ring() {
        return Measurement {
            value: polygon_area(&ring, ppm),
            unit: MeasurementUnit::SquareMeters,
            calibrated: ppm.is_some(),
        };
    }
    Measurement {
        value: polyline_length(&geometry.vertices(), ppm),
        unit: if ppm.is_some() {
            MeasurementUnit::Meters
        } else {
            MeasurementUnit::Pixels
        },
        calibrated: ppm.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ShapeKind, ShapeStyle};
    use uuid::Uuid;

    fn object(kind: ShapeKind, raw: &[(f64, f64)]) -> MapObject {
        let vertices = raw.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let geometry = Geometry::from_vertices(kind, vertices).unwrap();
        MapObject::new(Uuid::new_v4(), "test", geometry, ShapeStyle::default())
    }

    fn twenty_per_meter() -> Calibration {
        Calibration::new(Point::ZERO, Point::new(100.0, 0.0), 5.0).unwrap()
    }

    #[test]
    fn test_ratio() {
        let cal = twenty_per_meter();
        assert!((cal.pixels_per_meter - 20.0).abs() < 1e-12);
        assert!((cal.pixel_distance() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            Calibration::new(Point::ZERO, Point::new(1.0, 0.0), 0.0),
            Err(CalibrationError::NonPositiveDistance(0.0))
        );
        assert!(Calibration::new(Point::ZERO, Point::new(1.0, 0.0), f64::NAN).is_err());
        assert_eq!(
            Calibration::new(Point::new(3.0, 3.0), Point::new(3.0, 3.0), 1.0),
            Err(CalibrationError::ZeroLength)
        );
    }

    #[test]
    fn test_pending_confirm() {
        let pending = PendingCalibration::new(Point::ZERO, Point::new(30.0, 40.0));
        assert!((pending.pixel_distance - 50.0).abs() < 1e-12);
        let cal = pending.confirm(10.0).unwrap();
        assert!((cal.pixels_per_meter - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_line() {
        let line = object(ShapeKind::Threshold, &[(0.0, 0.0), (100.0, 0.0)]);
        let cal = Calibration::from_line(&line, 5.0).unwrap();
        assert!((cal.pixels_per_meter - 20.0).abs() < 1e-12);
        let poly = object(ShapeKind::Square, &[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(Calibration::from_line(&poly, 5.0), Err(CalibrationError::NotALine));
    }

    #[test]
    fn test_square_polygon_area() {
        let cal = twenty_per_meter();
        let poly = object(
            ShapeKind::Polygon,
            &[(200.0, 200.0), (220.0, 200.0), (220.0, 220.0), (200.0, 220.0)],
        );
        let m = measure(&poly, Some(&cal));
        assert!((m.value - 1.0).abs() < 1e-12);
        assert_eq!(m.format(), "1.00 m²");
    }

    #[test]
    fn test_primitives_share_area_path() {
        let cal = twenty_per_meter();
        let square = object(ShapeKind::Square, &[(0.0, 0.0), (20.0, 20.0)]);
        assert!((measure(&square, Some(&cal)).value - 1.0).abs() < 1e-12);

        let triangle = object(ShapeKind::Triangle, &[(0.0, 0.0), (40.0, 20.0)]);
        assert!((measure(&triangle, Some(&cal)).value - 1.0).abs() < 1e-12);

        let circle = object(ShapeKind::Circle, &[(0.0, 0.0), (20.0, 0.0)]);
        assert!((measure(&circle, Some(&cal)).value - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_lengths() {
        let cal = twenty_per_meter();
        let line = object(ShapeKind::Threshold, &[(0.0, 0.0), (100.0, 0.0)]);
        let m = measure(&line, Some(&cal));
        assert_eq!(m.unit, MeasurementUnit::Meters);
        assert_eq!(m.format(), "5.00 m");

        let path = object(ShapeKind::Freehand, &[(0.0, 0.0), (120.0, 0.0), (120.0, 120.0)]);
        let raw = measure(&path, None);
        assert_eq!(raw.unit, MeasurementUnit::Pixels);
        assert_eq!(raw.format(), "240.0 px");
    }

    #[test]
    fn test_uncalibrated_area() {
        let poly = object(ShapeKind::Square, &[(0.0, 0.0), (20.0, 20.0)]);
        let m = measure(&poly, None);
        assert_eq!(m.value, 0.0);
        assert_eq!(m.to_string(), "uncalibrated");
    }
}
