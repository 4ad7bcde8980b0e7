use super::exttypes::{GpsRecord, Timestamp};
use crate::types::Point;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GpsPoint {
  pub timestamp: DateTime<Utc>,
  pub position: Point,
  pub accuracy_m: f64,
}

impl GpsPoint {
  pub fn new(timestamp: DateTime<Utc>, lat: f64, lng: f64, accuracy_m: f64) -> Self {
    Self {
      timestamp,
      position: Point { lat, lng },
      accuracy_m,
    }
  }
}

#[derive(Debug, PartialEq)]
pub struct InvalidRecord {
  pub msg: &'static str,
}

impl Display for InvalidRecord {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "invalid gps record: {}", self.msg)
  }
}
impl std::error::Error for InvalidRecord {}

fn invalid(msg: &'static str) -> InvalidRecord {
  InvalidRecord { msg }
}

fn parse_timestamp(ts: &Timestamp) -> Option<DateTime<Utc>> {
  match ts {
    Timestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
    Timestamp::Text(s) => DateTime::parse_from_rfc3339(s)
      .map(|dt| dt.with_timezone(&Utc))
      .ok(),
    Timestamp::Other(_) => None,
  }
}

impl TryFrom<GpsRecord> for GpsPoint {
  type Error = InvalidRecord;

  fn try_from(src: GpsRecord) -> Result<Self, Self::Error> {
    let timestamp = src
      .timestamp
      .as_ref()
      .and_then(parse_timestamp)
      .ok_or(invalid("timestamp"))?;
    let lat = src
      .latitude
      .and_then(|v| v.value())
      .ok_or(invalid("latitude"))?;
    let lng = src
      .longitude
      .and_then(|v| v.value())
      .ok_or(invalid("longitude"))?;
    let position = Point { lat, lng };
    if !position.is_valid() {
      return Err(invalid("coordinates out of range"));
    }

    // a missing or broken accuracy doesn't make the fix unusable
    let accuracy_m = src
      .accuracy
      .and_then(|v| v.value())
      .filter(|v| v.is_finite() && *v >= 0.0)
      .unwrap_or(0.0);

    Ok(Self {
      timestamp,
      position,
      accuracy_m,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::route::exttypes::RouteResponse;

  #[test]
  fn test_parse_records() {
    let raw = r#"{"data": [
      {"timestamp": "2024-03-01T10:00:00Z", "latitude": 55.75, "longitude": 37.61, "accuracy": 5},
      {"timestamp": "2024-03-01T10:00:05Z", "latitude": "55.76", "longitude": "37.62"},
      {"timestamp": 1709287210000, "latitude": "NaN", "longitude": 37.63, "accuracy": 4},
      {"timestamp": "yesterday", "latitude": 55.77, "longitude": 37.64},
      {"timestamp": "2024-03-01T10:00:15Z", "latitude": null, "longitude": 37.65},
      {"timestamp": "2024-03-01T10:00:20Z", "latitude": 95.0, "longitude": 37.66},
      {"timestamp": "2024-03-01T10:00:25Z", "latitude": {"bad": 1}, "longitude": 37.67}
    ]}"#;
    let resp: RouteResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(resp.data.len(), 7);

    let results: Vec<Result<GpsPoint, InvalidRecord>> =
      resp.data.into_iter().map(GpsPoint::try_from).collect();

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.position, Point::new(55.75, 37.61));
    assert_eq!(first.accuracy_m, 5.0);

    let second = results[1].as_ref().unwrap();
    assert_eq!(second.position, Point::new(55.76, 37.62));
    assert_eq!(second.accuracy_m, 0.0);

    assert_eq!(results[2], Err(invalid("coordinates out of range")));
    assert_eq!(results[3], Err(invalid("timestamp")));
    assert_eq!(results[4], Err(invalid("latitude")));
    assert_eq!(results[5], Err(invalid("coordinates out of range")));
    assert_eq!(results[6], Err(invalid("latitude")));
  }

  #[test]
  fn test_empty_response() {
    let resp: RouteResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
    assert!(resp.data.is_empty());
    let resp: RouteResponse = serde_json::from_str(r#"{}"#).unwrap();
    assert!(resp.data.is_empty());
  }
}
