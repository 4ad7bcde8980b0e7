use duration_str::deserialize_duration;
use log::LevelFilter;
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path, time::Duration};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Log {
  pub level: LevelFilter,
}

impl Default for Log {
  fn default() -> Self {
    Self {
      level: LevelFilter::Info,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Api {
  pub url: String,
  /// `{device}` is replaced with the requested device id
  pub route_path: String,
  #[serde(deserialize_with = "deserialize_duration")]
  pub timeout: Duration,
}

impl Default for Api {
  fn default() -> Self {
    Self {
      url: "http://localhost:3000".to_owned(),
      route_path: "/api/dashboard/devices/{device}/gps-route/raw".to_owned(),
      timeout: Duration::from_secs(10),
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Player {
  pub speed: f64,
  pub reset_on_complete: bool,
}

impl Default for Player {
  fn default() -> Self {
    Self {
      speed: 1.0,
      reset_on_complete: true,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Zoom {
  pub enabled: bool,
  pub dragging: u8,
  pub playing: u8,
  pub default: u8,
  pub min_displacement_m: f64,
  #[serde(deserialize_with = "deserialize_duration")]
  pub animation: Duration,
  #[serde(deserialize_with = "deserialize_duration")]
  pub debounce: Duration,
}

impl Default for Zoom {
  fn default() -> Self {
    Self {
      enabled: true,
      dragging: 18,
      playing: 16,
      default: 15,
      min_displacement_m: 10.0,
      animation: Duration::from_millis(500),
      debounce: Duration::from_millis(100),
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Map {
  pub fit_padding: f64,
}

impl Default for Map {
  fn default() -> Self {
    Self { fit_padding: 1.1 }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub log: Log,
  pub api: Api,
  pub player: Player,
  pub zoom: Zoom,
  pub map: Map,
}

fn load_file(path: &Path) -> Result<Config, String> {
  let mut f = File::open(path).map_err(|err| format!("error opening: {err}"))?;
  let mut config_raw = String::new();
  f.read_to_string(&mut config_raw)
    .map_err(|err| format!("error reading: {err}"))?;
  toml::from_str(&config_raw).map_err(|err| format!("error parsing: {err}"))
}

// The logger isn't set up yet when this runs, hence println.
pub fn read_config(filename: Option<&str>) -> Config {
  let mut filenames = vec!["./trackplay.toml", "/etc/trackplay.toml"];
  if let Some(filename) = filename {
    filenames.insert(0, filename);
  }

  for fname in filenames {
    let path = Path::new(fname);
    println!("Trying config file {}...", fname);
    if path.is_file() {
      match load_file(path) {
        Ok(config) => return config,
        Err(err) => {
          println!("Config file {}: {}", fname, err);
          continue;
        }
      }
    }
    println!("Config file {} does not exist", fname);
  }
  println!("No config files can be read, using default settings");
  Default::default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_full() {
    let raw = r#"
      [log]
      level = "debug"

      [api]
      url = "https://dashboard.example.com"
      route_path = "/api/dashboard/gps/{device}/gps-route/raw"
      timeout = "3s"

      [player]
      speed = 2.0
      reset_on_complete = false

      [zoom]
      enabled = false
      dragging = 17
      playing = 15
      default = 13
      min_displacement_m = 25.0
      animation = "250ms"
      debounce = "50ms"

      [map]
      fit_padding = 1.3
    "#;
    let cfg: Config = toml::from_str(raw).unwrap();
    assert_eq!(cfg.log.level, LevelFilter::Debug);
    assert_eq!(cfg.api.timeout, Duration::from_secs(3));
    assert_eq!(cfg.player.speed, 2.0);
    assert!(!cfg.player.reset_on_complete);
    assert!(!cfg.zoom.enabled);
    assert_eq!(cfg.zoom.animation, Duration::from_millis(250));
    assert_eq!(cfg.zoom.debounce, Duration::from_millis(50));
    assert_eq!(cfg.map.fit_padding, 1.3);
  }

  #[test]
  fn test_missing_sections_use_defaults() {
    let raw = r#"
      [player]
      speed = 4.0
      reset_on_complete = true
    "#;
    let cfg: Config = toml::from_str(raw).unwrap();
    assert_eq!(cfg.player.speed, 4.0);
    assert_eq!(cfg.zoom.dragging, 18);
    assert_eq!(cfg.api.timeout, Duration::from_secs(10));
  }

  #[test]
  fn test_partial_sections_keep_given_fields() {
    let raw = r#"
      [log]
      level = "warn"

      [api]
      url = "https://dash.example.com"

      [zoom]
      debounce = "250ms"
    "#;
    let cfg: Config = toml::from_str(raw).unwrap();
    assert_eq!(cfg.log.level, LevelFilter::Warn);
    assert_eq!(cfg.api.url, "https://dash.example.com");
    assert_eq!(
      cfg.api.route_path,
      "/api/dashboard/devices/{device}/gps-route/raw"
    );
    assert_eq!(cfg.api.timeout, Duration::from_secs(10));
    assert_eq!(cfg.zoom.debounce, Duration::from_millis(250));
    assert_eq!(cfg.zoom.animation, Duration::from_millis(500));
    assert!(cfg.zoom.enabled);
  }

  #[test]
  fn test_read_missing_file() {
    let cfg = read_config(Some("/nonexistent/trackplay.toml"));
    assert_eq!(cfg.player.speed, 1.0);
  }
}
