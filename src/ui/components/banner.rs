use ratatui::prelude::*;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
  Info,
  Success,
  Warning,
  Error,
}

impl BannerKind {
  pub fn color(self) -> Color {
    match self {
      BannerKind::Info => Color::Cyan,
      BannerKind::Success => Color::Green,
      BannerKind::Warning => Color::Yellow,
      BannerKind::Error => Color::Red,
    }
  }
}

/// A transient status message
#[derive(Debug, Clone)]
pub struct Banner {
  kind: BannerKind,
  text: String,
  shown_at: Instant,
}

impl Banner {
  pub fn new(kind: BannerKind, text: impl Into<String>) -> Self {
    Self::shown_at(kind, text, Instant::now())
  }

  fn shown_at(kind: BannerKind, text: impl Into<String>, shown_at: Instant) -> Self {
    Self {
      kind,
      text: text.into(),
      shown_at,
    }
  }

  pub fn kind(&self) -> BannerKind {
    self.kind
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(self.shown_at) >= ttl
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_expiry() {
    let start = Instant::now();
    let banner = Banner::shown_at(BannerKind::Success, "Phone added", start);
    let ttl = Duration::from_secs(3);

    assert!(!banner.is_expired(start, ttl));
    assert!(!banner.is_expired(start + Duration::from_secs(2), ttl));
    assert!(banner.is_expired(start + Duration::from_secs(3), ttl));
  }
}
