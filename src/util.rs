use std::{collections::HashMap, hash::Hash, ops::Deref};

use chrono::{DateTime, Utc};

pub struct Counter<T: Hash + Eq> {
  inner: HashMap<T, usize>,
}

impl<T: Hash + Eq> Counter<T> {
  pub fn new() -> Self {
    Self {
      inner: HashMap::new(),
    }
  }

  pub fn inc(&mut self, key: T) {
    let value = self.inner.entry(key).or_insert(0);
    *value += 1;
  }
}

impl<T: Hash + Eq> Deref for Counter<T> {
  type Target = HashMap<T, usize>;

  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

impl<T: Hash + Eq> Default for Counter<T> {
  fn default() -> Self {
    Self::new()
  }
}

pub fn seconds_since(t: DateTime<Utc>) -> f32 {
  let t2 = Utc::now();
  let d = (t2 - t).to_std();
  if let Ok(d) = d {
    d.as_secs_f32()
  } else {
    0.0
  }
}

#[cfg(test)]
pub mod tests {
  use super::*;

  #[test]
  fn test_counter() {
    let mut counter = Counter::new();
    counter.inc("abc");
    counter.inc("abc");
    counter.inc("def");
    assert_eq!(counter.len(), 2);
    assert_eq!(counter.get("abc").unwrap(), &2);
    assert_eq!(counter.get("def").unwrap(), &1);
    assert!(counter.get("ghi").is_none());
  }

  #[test]
  fn test_seconds_since_future() {
    let t = Utc::now() + chrono::Duration::seconds(60);
    assert_eq!(seconds_since(t), 0.0);
  }
}
