use crate::{
  config::Config,
  loader::{LoadError, RouteLoader, RouteQuery, Ticket},
  player::{
    zoom::{self, AutoZoom, ViewChange},
    PlaybackState, Player,
  },
  route::{exttypes::RouteResponse, projection::Projection, summary::RouteSummary, Route},
  tenant::TenantStore,
  types::{Point, Rect},
  util::seconds_since,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::{
  sync::{broadcast, RwLock},
  time::{interval_at, sleep_until, Instant},
};

const NOTICE_CAPACITY: usize = 16;

/// User-facing messages. Nothing here is fatal, the session stays usable.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
  NoData { device: String },
  LoadFailed { device: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
  Loaded { points: usize, dropped: usize },
  Empty,
  Failed,
  Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
  Tick(Snapshot),
  View(ViewChange),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
  pub state: PlaybackState,
  pub index: usize,
  pub len: usize,
  pub progress: f64,
  pub speed: f64,
  pub position: Option<Point>,
  pub timestamp: Option<DateTime<Utc>>,
  pub accuracy_m: Option<f64>,
}

/// Ties the loader, the player and the auto-zoom controller together for a
/// single map view.
#[derive(Debug)]
pub struct RouteSession {
  cfg: Config,
  loader: RouteLoader,
  tenant: Arc<TenantStore>,
  player: RwLock<Player>,
  zoom: RwLock<AutoZoom>,
  summary: RwLock<Option<RouteSummary>>,
  notices: broadcast::Sender<Notice>,
}

impl RouteSession {
  pub fn new(cfg: Config, tenant: Arc<TenantStore>) -> Result<Self, LoadError> {
    let loader = RouteLoader::new(&cfg)?;
    let player = Player::new(&cfg.player);
    let zoom = AutoZoom::new(cfg.zoom.clone());
    let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
    Ok(Self {
      cfg,
      loader,
      tenant,
      player: RwLock::new(player),
      zoom: RwLock::new(zoom),
      summary: RwLock::new(None),
      notices,
    })
  }

  pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
    self.notices.subscribe()
  }

  fn notify(&self, notice: Notice) {
    // nobody listening is fine
    let _ = self.notices.send(notice);
  }

  pub fn query(&self, device: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> RouteQuery {
    RouteQuery {
      device: device.to_owned(),
      from,
      to,
      company_id: self.tenant.company_id(),
    }
  }

  pub async fn load(&self, query: &RouteQuery) -> LoadOutcome {
    let ticket = self.loader.issue();
    let t = Utc::now();
    let res = self.loader.fetch(query).await;
    debug!("route request {ticket} finished in {}s", seconds_since(t));
    self.apply(ticket, &query.device, res).await
  }

  /// Applies a finished request to the session unless a newer one has been
  /// issued since.
  pub async fn apply(
    &self,
    ticket: Ticket,
    device: &str,
    res: Result<RouteResponse, LoadError>,
  ) -> LoadOutcome {
    if !self.loader.is_latest(ticket) {
      debug!("discarding stale route response {ticket} for {device}");
      return LoadOutcome::Stale;
    }

    let data = match res {
      Ok(data) => data,
      Err(err) => {
        error!("error loading route for {device}: {err}");
        self.notify(Notice::LoadFailed {
          device: device.to_owned(),
          reason: err.to_string(),
        });
        return LoadOutcome::Failed;
      }
    };

    let (route, dropped) = Route::from_records(data.data);
    if dropped > 0 {
      warn!("{dropped} malformed gps records dropped for {device}");
    }

    let summary = RouteSummary::of(&route, dropped);
    let points = route.len();
    {
      // a newer request may have been issued while waiting for the lock
      let mut player = self.player.write().await;
      if !self.loader.is_latest(ticket) {
        debug!("discarding stale route response {ticket} for {device}");
        return LoadOutcome::Stale;
      }
      player.load(route);
      self.zoom.write().await.reset();
      *self.summary.write().await = Some(summary);
    }

    if points == 0 {
      info!("no gps data for {device}");
      self.notify(Notice::NoData {
        device: device.to_owned(),
      });
      LoadOutcome::Empty
    } else {
      info!("route for {device} loaded: {points} points");
      LoadOutcome::Loaded { points, dropped }
    }
  }

  pub async fn summary(&self) -> Option<RouteSummary> {
    self.summary.read().await.clone()
  }

  pub async fn route_feature(&self) -> geojson::Feature {
    self.player.read().await.route().to_feature()
  }

  pub async fn initial_view(&self) -> Option<Rect> {
    zoom::fit(self.player.read().await.route(), self.cfg.map.fit_padding)
  }

  pub async fn controls_enabled(&self) -> bool {
    self.player.read().await.controls_enabled()
  }

  pub async fn snapshot(&self) -> Snapshot {
    let player = self.player.read().await;
    let current = player.current();
    Snapshot {
      state: player.state(),
      index: player.index(),
      len: player.route().len(),
      progress: player.progress(),
      speed: player.speed(),
      position: current.map(|p| p.position),
      timestamp: current.map(|p| p.timestamp),
      accuracy_m: current.map(|p| p.accuracy_m),
    }
  }

  async fn follow(&self, dragging: bool) {
    let (position, playing) = {
      let player = self.player.read().await;
      match player.current() {
        Some(p) => (p.position, player.is_playing()),
        None => return,
      }
    };
    self
      .zoom
      .write()
      .await
      .update(position, dragging, playing, Instant::now().into_std());
  }

  /// Pending viewport change whose debounce delay has elapsed.
  pub async fn take_view(&self) -> Option<ViewChange> {
    self.zoom.write().await.poll(Instant::now().into_std())
  }

  pub async fn play(&self) -> bool {
    let changed = self.player.write().await.play();
    if changed {
      self.follow(false).await;
    }
    changed
  }

  pub async fn pause(&self) -> bool {
    self.player.write().await.pause()
  }

  pub async fn stop(&self) -> bool {
    let changed = self.player.write().await.stop();
    if changed {
      self.follow(false).await;
    }
    changed
  }

  pub async fn seek(&self, index: isize) -> bool {
    let changed = self.player.write().await.seek(index);
    if changed {
      self.follow(false).await;
    }
    changed
  }

  pub async fn next(&self) -> bool {
    let changed = self.player.write().await.next();
    if changed {
      self.follow(false).await;
    }
    changed
  }

  pub async fn previous(&self) -> bool {
    let changed = self.player.write().await.previous();
    if changed {
      self.follow(false).await;
    }
    changed
  }

  /// Turns viewport following on or off. Returns whether it changed.
  pub async fn set_auto_zoom(&self, enabled: bool) -> bool {
    let mut zoom = self.zoom.write().await;
    if zoom.enabled() == enabled {
      return false;
    }
    zoom.set_enabled(enabled);
    true
  }

  pub async fn set_speed(&self, speed: f64) -> bool {
    self.player.write().await.set_speed(speed)
  }

  pub async fn drag(&self, position: Point) -> Option<Projection> {
    let projection = self.player.write().await.drag(position)?;
    self.follow(true).await;
    Some(projection)
  }

  /// Starts playback and drives the timer until the player leaves the
  /// playing state, either by completing the route or by an external
  /// pause/stop. Auto-zoom changes are emitted as their debounce expires.
  pub async fn play_through<F: FnMut(PlaybackEvent)>(&self, mut on_event: F) {
    if !self.play().await {
      debug!("playback not started");
      return;
    }

    let mut period = self.player.read().await.interval();
    let mut timer = interval_at(Instant::now() + period, period);
    loop {
      let deadline = self.zoom.read().await.deadline();
      let wake_at = deadline.map(Instant::from_std).unwrap_or_else(Instant::now);

      tokio::select! {
        _ = timer.tick() => {
          let (ticked, playing, next_period) = {
            let mut player = self.player.write().await;
            let ticked = player.tick();
            (ticked, player.is_playing(), player.interval())
          };
          if !ticked {
            debug!("playback interrupted");
            break;
          }
          self.follow(false).await;
          on_event(PlaybackEvent::Tick(self.snapshot().await));

          if !playing {
            info!("playback finished");
            break;
          }
          if next_period != period {
            debug!("playback speed changed, new tick period {next_period:?}");
            period = next_period;
            timer = interval_at(Instant::now() + period, period);
          }
        }
        _ = sleep_until(wake_at), if deadline.is_some() => {
          if let Some(view) = self.take_view().await {
            on_event(PlaybackEvent::View(view));
          }
        }
      }
    }
  }
}
