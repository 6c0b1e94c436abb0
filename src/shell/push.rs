//! Push notification payloads.

use serde::{Deserialize, Serialize};

use super::error::ShellError;

const DEFAULT_TITLE: &str = "Phone Inventory";
const ICON: &str = "icons/icon-192.png";
const BADGE: &str = "icons/icon-72.png";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushPayload {
  title: Option<String>,
  body: Option<String>,
}

/// A button shown on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
  pub action: &'static str,
  pub title: &'static str,
}

/// A notification ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: &'static str,
  pub badge: &'static str,
  pub actions: Vec<NotificationAction>,
}

/// Decode a `{title, body}` push payload into a notification.
pub fn decode(payload: &str) -> Result<Notification, ShellError> {
  let payload: PushPayload = if payload.trim().is_empty() {
    PushPayload::default()
  } else {
    serde_json::from_str(payload).map_err(|e| ShellError::Payload(e.to_string()))?
  };

  Ok(Notification {
    title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
    body: payload.body.unwrap_or_default(),
    icon: ICON,
    badge: BADGE,
    actions: vec![
      NotificationAction {
        action: "open",
        title: "Open app",
      },
      NotificationAction {
        action: "close",
        title: "Close",
      },
    ],
  })
}
