pub mod exttypes;
pub mod point;
pub mod projection;
pub mod summary;

use self::{exttypes::GpsRecord, point::GpsPoint, projection::Projection};
use crate::types::{Point, Rect};
use chrono::Duration;
use geojson::{Feature, Geometry, JsonObject, Value};
use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Equirectangular plane centered on a reference latitude. Good enough for
/// the few-kilometre spans a device covers between two fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
  lng_scale: f64,
}

impl LocalFrame {
  pub fn new(ref_lat: f64) -> Self {
    Self {
      lng_scale: ref_lat.to_radians().cos(),
    }
  }

  /// Planar coordinates in metres.
  pub fn to_xy(&self, p: &Point) -> [f64; 2] {
    [
      p.lng.to_radians() * EARTH_RADIUS_M * self.lng_scale,
      p.lat.to_radians() * EARTH_RADIUS_M,
    ]
  }
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
  idx: usize,
  xy: [f64; 2],
}

impl RTreeObject for Vertex {
  type Envelope = AABB<[f64; 2]>;

  fn envelope(&self) -> Self::Envelope {
    AABB::from_point(self.xy)
  }
}

impl PointDistance for Vertex {
  fn distance_2(&self, point: &[f64; 2]) -> f64 {
    let dx = self.xy[0] - point[0];
    let dy = self.xy[1] - point[1];
    dx * dx + dy * dy
  }
}

/// An ordered, immutable GPS trace. A reload builds a new one.
#[derive(Debug, Clone)]
pub struct Route {
  points: Vec<GpsPoint>,
  frame: LocalFrame,
  plane: Vec<[f64; 2]>,
  vertices: RTree<Vertex>,
}

impl Default for Route {
  fn default() -> Self {
    Self::empty()
  }
}

impl Route {
  pub fn empty() -> Self {
    Self::new(vec![])
  }

  pub fn new(mut points: Vec<GpsPoint>) -> Self {
    // stable, so fixes sharing a timestamp keep their arrival order
    points.sort_by_key(|p| p.timestamp);

    let ref_lat = if points.is_empty() {
      0.0
    } else {
      points.iter().map(|p| p.position.lat).sum::<f64>() / points.len() as f64
    };
    let frame = LocalFrame::new(ref_lat);
    let plane: Vec<[f64; 2]> = points.iter().map(|p| frame.to_xy(&p.position)).collect();
    let vertices = RTree::bulk_load(
      plane
        .iter()
        .enumerate()
        .map(|(idx, xy)| Vertex { idx, xy: *xy })
        .collect(),
    );

    Self {
      points,
      frame,
      plane,
      vertices,
    }
  }

  /// Builds a route out of raw api records, dropping the ones that don't
  /// parse. Returns the route and the number of records dropped.
  pub fn from_records(records: Vec<GpsRecord>) -> (Self, usize) {
    let total = records.len();
    let mut points = Vec::with_capacity(total);
    for record in records {
      match GpsPoint::try_from(record) {
        Ok(point) => points.push(point),
        Err(err) => debug!("dropping record: {err}"),
      }
    }
    let dropped = total - points.len();
    (Self::new(points), dropped)
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&GpsPoint> {
    self.points.get(index)
  }

  pub fn points(&self) -> &[GpsPoint] {
    &self.points
  }

  pub fn frame(&self) -> LocalFrame {
    self.frame
  }

  pub(crate) fn plane(&self) -> &[[f64; 2]] {
    &self.plane
  }

  pub fn bounds(&self) -> Option<Rect> {
    Rect::from_points(self.points.iter().map(|p| &p.position))
  }

  pub fn duration(&self) -> Duration {
    match (self.points.first(), self.points.last()) {
      (Some(first), Some(last)) => last.timestamp - first.timestamp,
      _ => Duration::zero(),
    }
  }

  /// Total great-circle length in metres.
  pub fn length_m(&self) -> f64 {
    self
      .points
      .windows(2)
      .map(|w| w[0].position.haversine_m(&w[1].position))
      .sum()
  }

  /// Index of the vertex closest to the planar point along with the
  /// squared planar distance. Equidistant vertices resolve to the lowest index.
  pub(crate) fn nearest_vertex(&self, xy: &[f64; 2]) -> Option<(usize, f64)> {
    let mut iter = self.vertices.nearest_neighbor_iter(xy);
    let first = iter.next()?;
    let d2 = first.distance_2(xy);
    let best = iter
      .take_while(|v| v.distance_2(xy) <= d2)
      .fold(first, |best, v| if v.idx < best.idx { v } else { best });
    Some((best.idx, d2))
  }

  /// Snaps an arbitrary map position onto the route.
  pub fn project(&self, query: Point) -> Option<Projection> {
    projection::project(self, query)
  }

  pub fn to_feature(&self) -> Feature {
    let geometry = match self.points.len() {
      0 => None,
      1 => {
        let p = self.points[0].position;
        Some(Geometry::new(Value::Point(vec![p.lng, p.lat])))
      }
      _ => {
        let coords = self
          .points
          .iter()
          .map(|p| vec![p.position.lng, p.position.lat])
          .collect();
        Some(Geometry::new(Value::LineString(coords)))
      }
    };

    let mut properties = JsonObject::new();
    properties.insert("points".to_owned(), self.points.len().into());
    if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
      properties.insert("start".to_owned(), first.timestamp.to_rfc3339().into());
      properties.insert("end".to_owned(), last.timestamp.to_rfc3339().into());
    }

    Feature {
      bbox: None,
      geometry,
      id: None,
      properties: Some(properties),
      foreign_members: None,
    }
  }
}
