use super::Route;
use crate::types::Point;
use serde::Serialize;

/// Below this distance to a recorded fix the fix itself wins over the
/// interpolated point, so a marker dropped onto a fix doesn't jitter.
pub const SNAP_THRESHOLD_M: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
  pub point: Point,
  /// Snapped vertex index, or the start index of the closest segment.
  pub index: usize,
  pub distance_m: f64,
  /// Position along the segment, 0 for a snapped vertex.
  pub t: f64,
  pub snapped: bool,
}

fn dist(a: &[f64; 2], b: &[f64; 2]) -> f64 {
  ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Parametric position of the perpendicular foot of `q` on `[a, b]`,
/// clamped to the segment.
pub fn segment_t(a: &[f64; 2], b: &[f64; 2], q: &[f64; 2]) -> f64 {
  let dx = b[0] - a[0];
  let dy = b[1] - a[1];
  let len2 = dx * dx + dy * dy;
  if len2 == 0.0 {
    return 0.0;
  }
  let t = ((q[0] - a[0]) * dx + (q[1] - a[1]) * dy) / len2;
  t.clamp(0.0, 1.0)
}

fn lerp(a: &Point, b: &Point, t: f64) -> Point {
  Point {
    lat: a.lat + (b.lat - a.lat) * t,
    lng: a.lng + (b.lng - a.lng) * t,
  }
}

pub fn project(route: &Route, query: Point) -> Option<Projection> {
  let points = route.points();
  let plane = route.plane();
  let q = route.frame().to_xy(&query);

  let (vertex_idx, vertex_d2) = route.nearest_vertex(&q)?;
  let vertex_distance = vertex_d2.sqrt();

  if vertex_distance < SNAP_THRESHOLD_M || points.len() == 1 {
    return Some(Projection {
      point: points[vertex_idx].position,
      index: vertex_idx,
      distance_m: vertex_distance,
      t: 0.0,
      snapped: vertex_distance < SNAP_THRESHOLD_M,
    });
  }

  let mut best: Option<Projection> = None;
  for (i, seg) in plane.windows(2).enumerate() {
    let t = segment_t(&seg[0], &seg[1], &q);
    let foot = [
      seg[0][0] + (seg[1][0] - seg[0][0]) * t,
      seg[0][1] + (seg[1][1] - seg[0][1]) * t,
    ];
    let d = dist(&foot, &q);
    let closer = match &best {
      Some(b) => d < b.distance_m,
      None => true,
    };
    if closer {
      best = Some(Projection {
        point: lerp(&points[i].position, &points[i + 1].position, t),
        index: i,
        distance_m: d,
        t,
        snapped: false,
      });
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::route::tests::make_route;

  #[test]
  fn test_projection_on_flat_segment() {
    let route = make_route(&[(0.0, 0.0), (0.0, 10.0)]);
    let p = route.project(Point::new(5.0, 5.0)).unwrap();
    assert_eq!(p.index, 0);
    assert!(!p.snapped);
    assert!((p.t - 0.5).abs() < 1e-9);
    assert!(p.point.lat.abs() < 1e-9);
    assert!((p.point.lng - 5.0).abs() < 1e-9);
  }

  #[test]
  fn test_query_on_vertex() {
    let coords = [
      (55.7500, 37.6100),
      (55.7510, 37.6120),
      (55.7530, 37.6125),
      (55.7545, 37.6150),
      (55.7550, 37.6190),
    ];
    let route = make_route(&coords);
    for (i, (lat, lng)) in coords.iter().enumerate() {
      let p = route.project(Point::new(*lat, *lng)).unwrap();
      assert_eq!(p.index, i);
      assert_eq!(p.distance_m, 0.0);
      assert!(p.snapped);
    }
  }

  #[test]
  fn test_never_worse_than_nearest_vertex() {
    let route = make_route(&[
      (55.7500, 37.6100),
      (55.7510, 37.6120),
      (55.7530, 37.6125),
      (55.7545, 37.6150),
    ]);
    let frame = route.frame();
    let queries = [
      Point::new(55.7505, 37.6130),
      Point::new(55.7600, 37.6000),
      Point::new(55.7520, 37.6110),
      Point::new(55.7400, 37.6200),
      Point::new(55.7510, 37.6121),
    ];
    for q in queries {
      let p = route.project(q).unwrap();
      let qxy = frame.to_xy(&q);
      for v in route.points() {
        let d = dist(&frame.to_xy(&v.position), &qxy);
        assert!(p.distance_m <= d + 1e-6, "{q:?}: {} > {d}", p.distance_m);
      }
    }
  }

  #[test]
  fn test_snaps_near_vertex() {
    let route = make_route(&[(55.7500, 37.6100), (55.7600, 37.6100)]);
    // roughly 5.5m north of the first fix, right on the segment
    let p = route.project(Point::new(55.75005, 37.6100)).unwrap();
    assert!(p.snapped);
    assert_eq!(p.index, 0);
    assert_eq!(p.point, Point::new(55.7500, 37.6100));
    assert!(p.distance_m > 5.0 && p.distance_m < 6.0);

    // 111m north, interpolated
    let p = route.project(Point::new(55.7510, 37.6100)).unwrap();
    assert!(!p.snapped);
    assert_eq!(p.index, 0);
    assert!((p.t - 0.1).abs() < 1e-6);
  }

  #[test]
  fn test_single_point_route() {
    let route = make_route(&[(10.0, 20.0)]);
    let p = route.project(Point::new(11.0, 21.0)).unwrap();
    assert_eq!(p.index, 0);
    assert_eq!(p.point, Point::new(10.0, 20.0));
    assert!(!p.snapped);
  }

  #[test]
  fn test_empty_route() {
    let route = make_route(&[]);
    assert!(route.project(Point::new(0.0, 0.0)).is_none());
  }

  #[test]
  fn test_degenerate_segment() {
    let a = [3.0, 4.0];
    assert_eq!(segment_t(&a, &a, &[10.0, 10.0]), 0.0);
    assert_eq!(segment_t(&[0.0, 0.0], &[10.0, 0.0], &[-5.0, 1.0]), 0.0);
    assert_eq!(segment_t(&[0.0, 0.0], &[10.0, 0.0], &[15.0, 1.0]), 1.0);
  }
}
