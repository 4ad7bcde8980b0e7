use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use log::{info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::sync::Arc;
use trackplay::{
  config::read_config,
  session::{LoadOutcome, Notice, PlaybackEvent, RouteSession},
  tenant::{TenantConfig, TenantStore},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
struct Args {
  #[arg(short)]
  config: Option<String>,
  /// Device whose route is played back
  device: String,
  /// Start of the time window, RFC 3339 (default: 24 hours before --to)
  #[arg(long)]
  from: Option<DateTime<Utc>>,
  /// End of the time window, RFC 3339 (default: now)
  #[arg(long)]
  to: Option<DateTime<Utc>>,
  #[arg(long)]
  company: Option<String>,
  /// Playback speed multiplier
  #[arg(long)]
  speed: Option<f64>,
  /// Print the route summary and exit
  #[arg(long)]
  summary_only: bool,
  /// Print the route as a GeoJSON feature
  #[arg(long)]
  geojson: bool,
  /// Don't recenter the view on the cursor during playback
  #[arg(long)]
  no_auto_zoom: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let args = Args::parse();
  let mut config = read_config(args.config.as_deref());
  if let Some(speed) = args.speed {
    config.player.speed = speed;
  }

  TermLogger::init(
    config.log.level,
    Config::default(),
    TerminalMode::Stdout,
    ColorChoice::Auto,
  )?;

  info!("starting trackplay version {}", VERSION);
  let tenant = Arc::new(TenantStore::new(TenantConfig {
    company_id: args.company.clone(),
    ..Default::default()
  }));
  let tenant_cfg = tenant.current();
  info!(
    "tenant: company {:?}, theme {:?}",
    tenant_cfg.company_id, tenant_cfg.theme
  );
  let session = RouteSession::new(config, tenant)?;
  if args.no_auto_zoom {
    session.set_auto_zoom(false).await;
  }

  let mut notices = session.subscribe_notices();
  tokio::spawn(async move {
    while let Ok(notice) = notices.recv().await {
      match notice {
        Notice::NoData { device } => warn!("no gps data found for {device}"),
        Notice::LoadFailed { device, reason } => {
          warn!("could not load the route for {device}: {reason}")
        }
      }
    }
  });

  let to = args.to.unwrap_or_else(Utc::now);
  let from = args.from.unwrap_or(to - Duration::hours(24));
  let query = session.query(&args.device, from, to);

  match session.load(&query).await {
    LoadOutcome::Loaded { .. } => {}
    LoadOutcome::Failed => return Err("route could not be loaded".into()),
    LoadOutcome::Empty | LoadOutcome::Stale => return Ok(()),
  }

  if let Some(summary) = session.summary().await {
    println!("{}", serde_json::to_string_pretty(&summary)?);
  }
  if args.geojson {
    println!("{}", serde_json::to_string(&session.route_feature().await)?);
  }
  if args.summary_only {
    return Ok(());
  }

  if let Some(view) = session.initial_view().await {
    let center = view.center();
    info!(
      "initial view {:.6},{:.6} - {:.6},{:.6}, centered on {:.6},{:.6}",
      view.south_west.lat,
      view.south_west.lng,
      view.north_east.lat,
      view.north_east.lng,
      center.lat,
      center.lng
    );
  }

  session
    .play_through(|event| match event {
      PlaybackEvent::Tick(snap) => {
        if let Some(pos) = snap.position {
          info!(
            "[{:>5.1}%] #{} {:.6},{:.6} acc {:.0}m",
            snap.progress,
            snap.index,
            pos.lat,
            pos.lng,
            snap.accuracy_m.unwrap_or_default()
          );
        }
      }
      PlaybackEvent::View(view) => info!(
        "recenter on {:.6},{:.6} zoom {}",
        view.center.lat, view.center.lng, view.zoom
      ),
    })
    .await;
  Ok(())
}
