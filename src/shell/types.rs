//! Requests and responses seen by the shell worker.

use std::fmt;
use std::str::FromStr;
use url::Url;

/// How the page wants the response used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// Loading a whole document (page navigation)
  Navigate,
  /// Any other resource: scripts, styles, images, data
  Resource,
}

/// An outbound request from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub url: Url,
  pub mode: RequestMode,
}

impl Request {
  pub fn navigate(url: Url) -> Self {
    Self {
      url,
      mode: RequestMode::Navigate,
    }
  }

  pub fn resource(url: Url) -> Self {
    Self {
      url,
      mode: RequestMode::Resource,
    }
  }

  pub fn is_navigation(&self) -> bool {
    self.mode == RequestMode::Navigate
  }

  /// Key the response is cached under.
  pub fn cache_key(&self) -> &str {
    self.url.as_str()
  }
}

/// Where a response came from relative to the page's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
  /// Same-origin response
  Basic,
  /// Cross-origin response the page may read
  Cors,
  /// Cross-origin response the page may not read
  Opaque,
  /// Network-level error response
  Error,
}

impl ResponseType {
  pub fn as_str(self) -> &'static str {
    match self {
      ResponseType::Basic => "basic",
      ResponseType::Cors => "cors",
      ResponseType::Opaque => "opaque",
      ResponseType::Error => "error",
    }
  }
}

impl fmt::Display for ResponseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ResponseType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "basic" => Ok(ResponseType::Basic),
      "cors" => Ok(ResponseType::Cors),
      "opaque" => Ok(ResponseType::Opaque),
      "error" => Ok(ResponseType::Error),
      other => Err(format!("unknown response type '{}'", other)),
    }
  }
}

/// A response, either fresh from the network or read back from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub response_type: ResponseType,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl Response {
  /// Any 2xx status.
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Only complete same-origin responses are written to the cache at fetch time.
  pub fn is_cacheable(&self) -> bool {
    self.status == 200 && self.response_type == ResponseType::Basic
  }
}

/// Where `ShellWorker::fetch` got its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  /// Served from a cache generation
  Cache,
  /// Fetched from the network
  Network,
  /// The network failed and the cached shell document was served instead
  ShellFallback,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn response(status: u16, response_type: ResponseType) -> Response {
    Response {
      status,
      response_type,
      content_type: None,
      body: Vec::new(),
    }
  }

  #[test]
  fn test_only_basic_200_is_cacheable() {
    assert!(response(200, ResponseType::Basic).is_cacheable());
    assert!(!response(200, ResponseType::Cors).is_cacheable());
    assert!(!response(200, ResponseType::Opaque).is_cacheable());
    assert!(!response(204, ResponseType::Basic).is_cacheable());
    assert!(!response(404, ResponseType::Basic).is_cacheable());
  }

  #[test]
  fn test_response_type_round_trips_through_str() {
    for t in [
      ResponseType::Basic,
      ResponseType::Cors,
      ResponseType::Opaque,
      ResponseType::Error,
    ] {
      assert_eq!(t.as_str().parse::<ResponseType>().unwrap(), t);
    }
    assert!("weird".parse::<ResponseType>().is_err());
  }
}
