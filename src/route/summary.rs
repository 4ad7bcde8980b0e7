use super::Route;
use crate::util::Counter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

const EXCELLENT_BELOW_M: f64 = 10.0;
const GOOD_BELOW_M: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyClass {
  Excellent,
  Good,
  Regular,
}

impl AccuracyClass {
  pub fn classify(accuracy_m: f64) -> Self {
    if accuracy_m < EXCELLENT_BELOW_M {
      AccuracyClass::Excellent
    } else if accuracy_m < GOOD_BELOW_M {
      AccuracyClass::Good
    } else {
      AccuracyClass::Regular
    }
  }
}

impl Display for AccuracyClass {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      AccuracyClass::Excellent => write!(f, "excellent"),
      AccuracyClass::Good => write!(f, "good"),
      AccuracyClass::Regular => write!(f, "regular"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccuracyBreakdown {
  pub excellent: usize,
  pub good: usize,
  pub regular: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
  pub points: usize,
  pub dropped: usize,
  pub distance_m: f64,
  pub duration_sec: i64,
  pub start: Option<DateTime<Utc>>,
  pub end: Option<DateTime<Utc>>,
  pub mean_accuracy_m: Option<f64>,
  pub best_accuracy_m: Option<f64>,
  pub worst_accuracy_m: Option<f64>,
  pub accuracy: AccuracyBreakdown,
}

impl RouteSummary {
  pub fn of(route: &Route, dropped: usize) -> Self {
    let points = route.points();
    let mut classes = Counter::new();
    let mut best: Option<f64> = None;
    let mut worst: Option<f64> = None;
    let mut total = 0.0;

    for p in points {
      classes.inc(AccuracyClass::classify(p.accuracy_m));
      total += p.accuracy_m;
      best = Some(best.map_or(p.accuracy_m, |b| b.min(p.accuracy_m)));
      worst = Some(worst.map_or(p.accuracy_m, |w| w.max(p.accuracy_m)));
    }

    let count = |c: AccuracyClass| classes.get(&c).copied().unwrap_or(0);
    let accuracy = AccuracyBreakdown {
      excellent: count(AccuracyClass::Excellent),
      good: count(AccuracyClass::Good),
      regular: count(AccuracyClass::Regular),
    };

    Self {
      points: points.len(),
      dropped,
      distance_m: route.length_m(),
      duration_sec: route.duration().num_seconds(),
      start: points.first().map(|p| p.timestamp),
      end: points.last().map(|p| p.timestamp),
      mean_accuracy_m: if points.is_empty() {
        None
      } else {
        Some(total / points.len() as f64)
      },
      best_accuracy_m: best,
      worst_accuracy_m: worst,
      accuracy,
    }
  }
}
