use geo::HaversineDistance;
use geo_types::{Coord, Point as GeoPoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Point {
  pub lat: f64,
  pub lng: f64,
}

impl From<Point> for GeoPoint {
  fn from(val: Point) -> Self {
    Self(Coord {
      x: val.lng,
      y: val.lat,
    })
  }
}

impl Point {
  pub fn new(lat: f64, lng: f64) -> Self {
    Self { lat, lng }
  }

  pub fn is_valid(&self) -> bool {
    self.lat.is_finite()
      && self.lng.is_finite()
      && (-90.0..=90.0).contains(&self.lat)
      && (-180.0..=180.0).contains(&self.lng)
  }

  pub fn clamp(&self) -> Self {
    Self {
      lat: self.lat.clamp(-90.0, 90.0), // don't wrap lat, just clamp
      lng: (self.lng + 180.0).rem_euclid(360.0) - 180.0, // make sure lng is wrapped to stay within -180..180
    }
  }

  /// Great-circle distance in metres.
  pub fn haversine_m(&self, other: &Point) -> f64 {
    let a: GeoPoint = (*self).into();
    let b: GeoPoint = (*other).into();
    a.haversine_distance(&b)
  }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Rect {
  pub south_west: Point,
  pub north_east: Point,
}

impl Rect {
  pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
    Self {
      south_west: Point {
        lng: min_lng,
        lat: min_lat,
      },
      north_east: Point {
        lng: max_lng,
        lat: max_lat,
      },
    }
  }

  /// Bounding box of the given points, `None` for an empty input.
  pub fn from_points<'a, I: IntoIterator<Item = &'a Point>>(points: I) -> Option<Self> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut rect = Self {
      south_west: *first,
      north_east: *first,
    };
    for p in iter {
      rect.south_west.lat = rect.south_west.lat.min(p.lat);
      rect.south_west.lng = rect.south_west.lng.min(p.lng);
      rect.north_east.lat = rect.north_east.lat.max(p.lat);
      rect.north_east.lng = rect.north_east.lng.max(p.lng);
    }
    Some(rect)
  }

  fn width(&self) -> f64 {
    (self.north_east.lng + 180.0) - (self.south_west.lng + 180.0)
  }

  fn height(&self) -> f64 {
    self.north_east.lat - self.south_west.lat
  }

  pub fn center(&self) -> Point {
    Point {
      lat: self.south_west.lat + self.height() / 2.0,
      lng: self.south_west.lng + self.width() / 2.0,
    }
  }

  pub fn scale(&self, multiplier: f64) -> Self {
    let ext = multiplier - 1.0;
    let lng_ext = self.width() * ext / 2.0;
    let lat_ext = self.height() * ext / 2.0;
    let south_west = Point {
      lat: self.south_west.lat - lat_ext,
      lng: self.south_west.lng - lng_ext,
    };
    let north_east = Point {
      lat: self.north_east.lat + lat_ext,
      lng: self.north_east.lng + lng_ext,
    };
    Self {
      south_west: south_west.clamp(),
      north_east: north_east.clamp(),
    }
  }
}

#[cfg(test)]
pub mod tests {
  use super::*;

  #[test]
  fn test_point_validity() {
    assert!(Point::new(55.75, 37.61).is_valid());
    assert!(!Point::new(f64::NAN, 37.61).is_valid());
    assert!(!Point::new(55.75, f64::INFINITY).is_valid());
    assert!(!Point::new(91.0, 0.0).is_valid());
    assert!(!Point::new(0.0, -180.5).is_valid());
  }

  #[test]
  fn test_haversine() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(0.0, 1.0);
    let d = a.haversine_m(&b);
    // one degree of longitude on the equator
    assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    assert_eq!(a.haversine_m(&a), 0.0);
  }

  #[test]
  fn test_from_points() {
    let pts = [
      Point::new(1.0, 5.0),
      Point::new(-2.0, 3.0),
      Point::new(4.0, 4.0),
    ];
    let rect = Rect::from_points(pts.iter()).unwrap();
    assert_eq!(rect, Rect::new(3.0, -2.0, 5.0, 4.0));
    assert_eq!(rect.center(), Point::new(1.0, 4.0));
    assert!(Rect::from_points(Vec::<Point>::new().iter()).is_none());
  }

  #[test]
  fn test_scale() {
    let rect = Rect::new(0.0, 0.0, 10.0, 10.0).scale(2.0);
    assert_eq!(rect.south_west, Point::new(-5.0, -5.0));
    assert_eq!(rect.north_east, Point::new(15.0, 15.0));

    let rect = Rect::new(170.0, 80.0, 179.0, 89.0).scale(2.0);
    assert_eq!(rect.north_east.lat, 90.0);
    assert!(rect.north_east.lng < 0.0);
  }
}
