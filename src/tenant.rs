use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TenantConfig {
  pub company_id: Option<String>,
  pub theme: Theme,
}

/// Process-wide tenant settings. Consumers subscribe and get notified on
/// change instead of re-reading them on a timer.
#[derive(Debug)]
pub struct TenantStore {
  tx: watch::Sender<TenantConfig>,
}

impl Default for TenantStore {
  fn default() -> Self {
    Self::new(TenantConfig::default())
  }
}

impl TenantStore {
  pub fn new(initial: TenantConfig) -> Self {
    let (tx, _) = watch::channel(initial);
    Self { tx }
  }

  pub fn current(&self) -> TenantConfig {
    self.tx.borrow().clone()
  }

  pub fn company_id(&self) -> Option<String> {
    self.tx.borrow().company_id.clone()
  }

  /// Publishes the new config. Subscribers are only woken on an actual change.
  pub fn set(&self, config: TenantConfig) -> bool {
    self.tx.send_if_modified(|current| {
      if *current == config {
        false
      } else {
        info!(
          "tenant config changed: company {:?}, theme {:?}",
          config.company_id, config.theme
        );
        *current = config;
        true
      }
    })
  }

  pub fn subscribe(&self) -> watch::Receiver<TenantConfig> {
    self.tx.subscribe()
  }
}
