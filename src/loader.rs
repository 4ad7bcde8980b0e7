use crate::{config::Config, route::exttypes::RouteResponse};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use reqwest::{Client, StatusCode};
use std::{
  error::Error,
  fmt::Display,
  sync::atomic::{AtomicU64, Ordering},
};

#[derive(Debug)]
pub enum LoadError {
  Http(reqwest::Error),
  Status(StatusCode),
  Decode(reqwest::Error),
}

impl Display for LoadError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      LoadError::Http(err) => write!(f, "error requesting route: {err}"),
      LoadError::Status(status) => write!(f, "route api responded with {status}"),
      LoadError::Decode(err) => write!(f, "error parsing route data: {err}"),
    }
  }
}

impl Error for LoadError {}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
  pub device: String,
  pub from: DateTime<Utc>,
  pub to: DateTime<Utc>,
  pub company_id: Option<String>,
}

impl RouteQuery {
  pub fn params(&self) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("from", self.from.to_rfc3339_opts(SecondsFormat::Secs, true)),
      ("to", self.to.to_rfc3339_opts(SecondsFormat::Secs, true)),
    ];
    if let Some(company_id) = &self.company_id {
      params.push(("companyId", company_id.clone()));
    }
    params
  }
}

/// Monotonic request tag. Only the latest issued ticket may apply its
/// response.
pub type Ticket = u64;

#[derive(Debug)]
pub struct RouteLoader {
  client: Client,
  url: String,
  route_path: String,
  generation: AtomicU64,
}

impl RouteLoader {
  pub fn new(cfg: &Config) -> Result<Self, LoadError> {
    let client = Client::builder()
      .timeout(cfg.api.timeout)
      .build()
      .map_err(LoadError::Http)?;
    Ok(Self {
      client,
      url: cfg.api.url.trim_end_matches('/').to_owned(),
      route_path: cfg.api.route_path.clone(),
      generation: AtomicU64::new(0),
    })
  }

  pub fn route_url(&self, device: &str) -> String {
    format!("{}{}", self.url, self.route_path.replace("{device}", device))
  }

  pub fn issue(&self) -> Ticket {
    self.generation.fetch_add(1, Ordering::AcqRel) + 1
  }

  pub fn is_latest(&self, ticket: Ticket) -> bool {
    self.generation.load(Ordering::Acquire) == ticket
  }

  pub async fn fetch(&self, query: &RouteQuery) -> Result<RouteResponse, LoadError> {
    let url = self.route_url(&query.device);
    info!("loading route for {} from {url}", query.device);
    let response = self
      .client
      .get(&url)
      .query(&query.params())
      .send()
      .await
      .map_err(LoadError::Http)?;

    let status = response.status();
    if !status.is_success() {
      return Err(LoadError::Status(status));
    }
    let data = response
      .json::<RouteResponse>()
      .await
      .map_err(LoadError::Decode)?;
    debug!("route api returned {} records", data.data.len());
    Ok(data)
  }
}
