pub mod zoom;

use crate::{
  config,
  route::{point::GpsPoint, projection::Projection, Route},
  types::Point,
};
use log::debug;
use serde::Serialize;
use std::{fmt::Display, time::Duration};

const MIN_PERIOD: Duration = Duration::from_millis(1);
const MAX_PERIOD: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
  Stopped,
  Playing,
  Paused,
}

impl Display for PlaybackState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PlaybackState::Stopped => write!(f, "stopped"),
      PlaybackState::Playing => write!(f, "playing"),
      PlaybackState::Paused => write!(f, "paused"),
    }
  }
}

/// Cursor over a route driven by an external timer.
///
/// Transport operations return whether they changed anything. All of them
/// are no-ops on routes with fewer than two points.
#[derive(Debug, Clone)]
pub struct Player {
  route: Route,
  index: usize,
  state: PlaybackState,
  speed: f64,
  reset_on_complete: bool,
  // completed without reset, the cursor still on the last fix
  finished: bool,
}

impl Player {
  pub fn new(cfg: &config::Player) -> Self {
    let speed = if cfg.speed.is_finite() && cfg.speed > 0.0 {
      cfg.speed
    } else {
      1.0
    };
    Self {
      route: Route::empty(),
      index: 0,
      state: PlaybackState::Stopped,
      speed,
      reset_on_complete: cfg.reset_on_complete,
      finished: false,
    }
  }

  pub fn route(&self) -> &Route {
    &self.route
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn state(&self) -> PlaybackState {
    self.state
  }

  pub fn is_playing(&self) -> bool {
    self.state == PlaybackState::Playing
  }

  pub fn speed(&self) -> f64 {
    self.speed
  }

  pub fn controls_enabled(&self) -> bool {
    self.route.len() >= 2
  }

  pub fn current(&self) -> Option<&GpsPoint> {
    self.route.get(self.index)
  }

  fn last_index(&self) -> usize {
    self.route.len().saturating_sub(1)
  }

  pub fn progress(&self) -> f64 {
    if self.route.len() < 2 {
      0.0
    } else {
      self.index as f64 / self.last_index() as f64 * 100.0
    }
  }

  /// Timer period for the current speed, kept within 1ms..1h.
  pub fn interval(&self) -> Duration {
    Duration::try_from_secs_f64(1.0 / self.speed)
      .unwrap_or(MAX_PERIOD)
      .clamp(MIN_PERIOD, MAX_PERIOD)
  }

  /// Replaces the route wholesale and rewinds.
  pub fn load(&mut self, route: Route) {
    debug!("player: loading route of {} points", route.len());
    self.route = route;
    self.state = PlaybackState::Stopped;
    self.index = 0;
    self.finished = false;
  }

  pub fn set_speed(&mut self, speed: f64) -> bool {
    if !speed.is_finite() || speed <= 0.0 || speed == self.speed {
      return false;
    }
    self.speed = speed;
    true
  }

  pub fn play(&mut self) -> bool {
    if !self.controls_enabled() || self.state == PlaybackState::Playing {
      return false;
    }
    if self.finished {
      self.index = 0;
      self.finished = false;
    }
    self.state = PlaybackState::Playing;
    true
  }

  pub fn pause(&mut self) -> bool {
    if !self.controls_enabled() || self.state != PlaybackState::Playing {
      return false;
    }
    self.state = PlaybackState::Paused;
    true
  }

  pub fn stop(&mut self) -> bool {
    if !self.controls_enabled() {
      return false;
    }
    let changed = self.state != PlaybackState::Stopped || self.index != 0;
    self.state = PlaybackState::Stopped;
    self.index = 0;
    self.finished = false;
    changed
  }

  /// Advances the cursor by one fix. Reaching the last fix completes
  /// the playback.
  pub fn tick(&mut self) -> bool {
    if !self.controls_enabled() || self.state != PlaybackState::Playing {
      return false;
    }
    self.index = (self.index + 1).min(self.last_index());
    if self.index == self.last_index() {
      self.complete();
    }
    true
  }

  fn complete(&mut self) {
    debug!("player: reached the end of the route");
    self.state = PlaybackState::Stopped;
    if self.reset_on_complete {
      self.index = 0;
    } else {
      self.finished = true;
    }
  }

  pub fn seek(&mut self, index: isize) -> bool {
    if !self.controls_enabled() {
      return false;
    }
    let index = index.clamp(0, self.last_index() as isize) as usize;
    let changed = index != self.index;
    self.index = index;
    self.finished = false;
    changed
  }

  pub fn next(&mut self) -> bool {
    self.seek(self.index as isize + 1)
  }

  pub fn previous(&mut self) -> bool {
    self.seek(self.index as isize - 1)
  }

  /// Snaps a dragged marker position to the route. Active playback is
  /// paused before the cursor moves.
  pub fn drag(&mut self, position: Point) -> Option<Projection> {
    if !self.controls_enabled() {
      return None;
    }
    self.pause();
    let projection = self.route.project(position)?;
    self.seek(projection.index as isize);
    Some(projection)
  }
}
