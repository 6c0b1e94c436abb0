//! Network access for the shell worker.

use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::{Origin, Url};

use super::error::ShellError;
use super::types::{Request, Response, ResponseType};

/// Something that can perform a request over the network.
pub trait Network: Send + Sync {
  fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, ShellError>> + Send;
}

/// HTTP network backed by reqwest.
///
/// Responses from the app's own origin are `Basic`, everything else `Cors`.
#[derive(Clone)]
pub struct HttpNetwork {
  client: reqwest::Client,
  origin: Origin,
}

impl HttpNetwork {
  pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ShellError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| ShellError::Network {
        url: base_url.to_string(),
        reason: format!("failed to build HTTP client: {}", e),
      })?;

    Ok(Self {
      client,
      origin: base_url.origin(),
    })
  }

  fn response_type(&self, url: &Url) -> ResponseType {
    if url.origin() == self.origin {
      ResponseType::Basic
    } else {
      ResponseType::Cors
    }
  }
}

impl Network for HttpNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response, ShellError> {
    let network_error = |e: reqwest::Error| ShellError::Network {
      url: request.url.to_string(),
      reason: e.to_string(),
    };

    debug!(url = %request.url, "Fetching from network");
    let response = self
      .client
      .get(request.url.clone())
      .send()
      .await
      .map_err(network_error)?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    // Redirects may land on another origin
    let response_type = self.response_type(response.url());
    let body = response.bytes().await.map_err(network_error)?.to_vec();

    Ok(Response {
      status,
      response_type,
      content_type,
      body,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_response_type_follows_origin() {
    let base = Url::parse("http://localhost:8080/app/").unwrap();
    let network = HttpNetwork::new(&base, Duration::from_secs(1)).unwrap();

    assert_eq!(
      network.response_type(&Url::parse("http://localhost:8080/app/app.js").unwrap()),
      ResponseType::Basic
    );
    assert_eq!(
      network.response_type(&Url::parse("https://cdnjs.cloudflare.com/x.css").unwrap()),
      ResponseType::Cors
    );
    assert_eq!(
      network.response_type(&Url::parse("http://localhost:9090/app/").unwrap()),
      ResponseType::Cors
    );
  }
}
