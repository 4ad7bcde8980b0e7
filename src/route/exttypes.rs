use serde::Deserialize;

// Anything unparseable lands in `Other` so a single bad record doesn't
// fail the whole response.

/// Coordinates arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Number {
  Float(f64),
  Text(String),
  Other(serde_json::Value),
}

impl Number {
  pub fn value(&self) -> Option<f64> {
    match self {
      Number::Float(v) => Some(*v),
      Number::Text(s) => s.trim().parse::<f64>().ok(),
      Number::Other(_) => None,
    }
  }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Timestamp {
  Millis(i64),
  Text(String),
  Other(serde_json::Value),
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GpsRecord {
  pub timestamp: Option<Timestamp>,
  pub latitude: Option<Number>,
  pub longitude: Option<Number>,
  pub accuracy: Option<Number>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RouteResponse {
  pub data: Vec<GpsRecord>,
}
