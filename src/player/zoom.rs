use crate::{
  config,
  route::Route,
  types::{Point, Rect},
};
use log::debug;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewChange {
  pub center: Point,
  pub zoom: u8,
  pub animation: Duration,
}

/// Initial viewport showing every fix of the route.
pub fn fit(route: &Route, padding: f64) -> Option<Rect> {
  route.bounds().map(|b| b.scale(padding))
}

/// Keeps the cursor in view without fighting the user: the first update
/// after mount is ignored, tiny moves are ignored and bursts of updates
/// collapse into one debounced change.
#[derive(Debug)]
pub struct AutoZoom {
  cfg: config::Zoom,
  mounted: bool,
  last_applied: Option<Point>,
  pending: Option<(Instant, ViewChange)>,
}

impl AutoZoom {
  pub fn new(cfg: config::Zoom) -> Self {
    Self {
      cfg,
      mounted: false,
      last_applied: None,
      pending: None,
    }
  }

  pub fn enabled(&self) -> bool {
    self.cfg.enabled
  }

  pub fn set_enabled(&mut self, enabled: bool) {
    self.cfg.enabled = enabled;
    if !enabled {
      self.pending = None;
    }
  }

  /// Forgets everything, as if freshly mounted on a new route.
  pub fn reset(&mut self) {
    self.mounted = false;
    self.last_applied = None;
    self.pending = None;
  }

  fn target_zoom(&self, dragging: bool, playing: bool) -> u8 {
    if dragging {
      self.cfg.dragging
    } else if playing {
      self.cfg.playing
    } else {
      self.cfg.default
    }
  }

  /// Schedules a view change for the new cursor position. Returns whether
  /// a change is now pending.
  pub fn update(&mut self, position: Point, dragging: bool, playing: bool, now: Instant) -> bool {
    if !self.cfg.enabled {
      return false;
    }
    if !self.mounted {
      self.mounted = true;
      return false;
    }
    if let Some(last) = &self.last_applied {
      let moved = last.haversine_m(&position);
      if moved <= self.cfg.min_displacement_m {
        return false;
      }
    }

    let change = ViewChange {
      center: position,
      zoom: self.target_zoom(dragging, playing),
      animation: self.cfg.animation,
    };
    self.pending = Some((now + self.cfg.debounce, change));
    true
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.pending.as_ref().map(|(deadline, _)| *deadline)
  }

  /// Yields the pending change once its debounce delay has elapsed.
  pub fn poll(&mut self, now: Instant) -> Option<ViewChange> {
    match self.pending {
      Some((deadline, change)) if now >= deadline => {
        self.pending = None;
        self.last_applied = Some(change.center);
        debug!(
          "auto-zoom: centering on {:.6},{:.6} at zoom {}",
          change.center.lat, change.center.lng, change.zoom
        );
        Some(change)
      }
      _ => None,
    }
  }
}
