//! Shell worker: install, activate and fetch over named cache generations.

use futures::future::try_join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::error::ShellError;
use super::network::Network;
use super::push::{self, Notification};
use super::storage::CacheStore;
use super::types::{Request, Response, ResponseSource};
use crate::config::ShellConfig;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
  pub generation: String,
  pub cached: usize,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
  pub current: String,
  pub deleted: Vec<String>,
}

/// One cache generation as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStatus {
  pub name: String,
  pub entries: usize,
  pub current: bool,
  /// Every manifest resource made it in
  pub complete: bool,
}

/// Result of `ShellWorker::fetch`.
#[derive(Debug)]
pub struct FetchOutcome {
  pub response: Response,
  pub source: ResponseSource,
  /// Background write of the response into the cache, when one was started.
  /// Nothing depends on it finishing; it is exposed so callers may wait.
  pub refill: Option<JoinHandle<()>>,
}

impl FetchOutcome {
  fn new(response: Response, source: ResponseSource) -> Self {
    Self {
      response,
      source,
      refill: None,
    }
  }
}

/// Serves the app shell from cache first, falling back to the network.
///
/// Only the generation named by the configured version survives `activate`.
pub struct ShellWorker<C: CacheStore, N: Network> {
  cache: Arc<C>,
  network: N,
  generation: String,
  base: Url,
  manifest: Vec<Url>,
  shell_document: Url,
}

impl<C: CacheStore, N: Network> ShellWorker<C, N> {
  pub fn new(config: &ShellConfig, cache: C, network: N) -> Result<Self, ShellError> {
    let base = config.base_url()?;
    let manifest = config
      .manifest
      .iter()
      .map(|entry| resolve(&base, entry))
      .collect::<Result<Vec<_>, _>>()?;
    let shell_document = resolve(&base, &config.shell_document)?;

    Ok(Self {
      cache: Arc::new(cache),
      network,
      generation: config.generation(),
      base,
      manifest,
      shell_document,
    })
  }

  /// Name of the current cache generation.
  pub fn generation(&self) -> &str {
    &self.generation
  }

  /// Resolve a page-relative or absolute URL against the app's base.
  pub fn resolve(&self, url: &str) -> Result<Url, ShellError> {
    resolve(&self.base, url)
  }

  /// Populate the current generation with every manifest resource.
  ///
  /// All resources are fetched before anything is written; one failure
  /// fails the install and leaves the generation's contents untouched.
  pub async fn install(&self) -> Result<InstallReport, ShellError> {
    info!(generation = %self.generation, resources = self.manifest.len(), "Installing shell");
    self.cache.open(&self.generation)?;

    let fetches = self.manifest.iter().map(|url| async move {
      let install_error = |reason: String| ShellError::Install {
        generation: self.generation.clone(),
        url: url.to_string(),
        reason,
      };
      let response = self
        .network
        .fetch(&Request::resource(url.clone()))
        .await
        .map_err(|e| install_error(e.to_string()))?;
      if !response.is_ok() {
        return Err(install_error(format!("status {}", response.status)));
      }
      Ok((url.to_string(), response))
    });

    let entries = try_join_all(fetches).await.inspect_err(|e| {
      warn!(error = %e, "Shell install failed");
    })?;
    self.cache.put_all(&self.generation, &entries)?;

    info!(generation = %self.generation, cached = entries.len(), "Shell installed");
    Ok(InstallReport {
      generation: self.generation.clone(),
      cached: entries.len(),
    })
  }

  /// Delete every generation other than the current one.
  ///
  /// Refused until the current generation has installed completely, so a
  /// failed upgrade keeps serving the previous shell.
  pub fn activate(&self) -> Result<ActivateReport, ShellError> {
    if !self.cache.is_complete(&self.generation)? {
      warn!(generation = %self.generation, "Activation refused, install did not complete");
      return Err(ShellError::NotInstalled(self.generation.clone()));
    }

    let mut deleted = Vec::new();
    for name in self.cache.generations()? {
      if name != self.generation {
        self.cache.delete(&name)?;
        info!(generation = %name, "Deleted old cache generation");
        deleted.push(name);
      }
    }

    info!(generation = %self.generation, "Shell activated");
    Ok(ActivateReport {
      current: self.generation.clone(),
      deleted,
    })
  }

  /// Answer a request from the page.
  ///
  /// 1. Cached response, if any, as is.
  /// 2. Otherwise the network; complete same-origin responses are copied
  ///    into the current generation in the background.
  /// 3. When the network fails or the response is unusable, navigations
  ///    get the cached shell document. Other requests get no fallback.
  pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, ShellError> {
    let key = request.cache_key();
    match self.cache.lookup(key, &self.generation) {
      Ok(Some(cached)) => {
        debug!(url = %key, "Cache hit");
        return Ok(FetchOutcome::new(cached, ResponseSource::Cache));
      }
      Ok(None) => debug!(url = %key, "Cache miss"),
      Err(e) => warn!(url = %key, error = %e, "Cache lookup failed, treating as a miss"),
    }

    match self.network.fetch(request).await {
      Ok(response) if response.is_cacheable() => {
        let refill = self.refill(key.to_string(), response.clone());
        Ok(FetchOutcome {
          response,
          source: ResponseSource::Network,
          refill: Some(refill),
        })
      }
      Ok(response) => {
        if request.is_navigation() {
          if let Some(shell) = self.shell_fallback() {
            debug!(url = %key, status = response.status, "Unusable response, serving shell");
            return Ok(FetchOutcome::new(shell, ResponseSource::ShellFallback));
          }
        }
        debug!(url = %key, status = response.status, kind = %response.response_type, "Passing response through uncached");
        Ok(FetchOutcome::new(response, ResponseSource::Network))
      }
      Err(e) => {
        if request.is_navigation() {
          if let Some(shell) = self.shell_fallback() {
            info!(url = %key, error = %e, "Offline, serving shell");
            return Ok(FetchOutcome::new(shell, ResponseSource::ShellFallback));
          }
        }
        warn!(url = %key, error = %e, "Fetch failed with no fallback");
        Err(e)
      }
    }
  }

  /// Background sync trigger.
  pub fn sync(&self, tag: &str) {
    info!(%tag, "Background sync requested");
  }

  /// Turn a push payload into the notification to show.
  pub fn push(&self, payload: &str) -> Result<Notification, ShellError> {
    let notification = push::decode(payload)?;
    info!(title = %notification.title, "Push notification received");
    Ok(notification)
  }

  /// All generations with their sizes.
  pub fn status(&self) -> Result<Vec<GenerationStatus>, ShellError> {
    self
      .cache
      .generations()?
      .into_iter()
      .map(|name| {
        Ok(GenerationStatus {
          entries: self.cache.count(&name)?,
          current: name == self.generation,
          complete: self.cache.is_complete(&name)?,
          name,
        })
      })
      .collect()
  }

  fn shell_fallback(&self) -> Option<Response> {
    self
      .cache
      .lookup(self.shell_document.as_str(), &self.generation)
      .unwrap_or_else(|e| {
        warn!(error = %e, "Cached shell document unreadable");
        None
      })
  }

  /// Write a response into the current generation without holding up the caller.
  fn refill(&self, url: String, response: Response) -> JoinHandle<()> {
    let cache = Arc::clone(&self.cache);
    let generation = self.generation.clone();
    tokio::task::spawn_blocking(move || {
      if let Err(e) = cache.put(&generation, &url, &response) {
        warn!(%url, error = %e, "Failed to cache response");
      }
    })
  }
}

fn resolve(base: &Url, entry: &str) -> Result<Url, ShellError> {
  base.join(entry).map_err(|e| ShellError::Url {
    url: entry.to_string(),
    reason: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::Database;
  use crate::shell::storage::SqliteCacheStore;
  use crate::shell::types::ResponseType;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Mutex;

  const BASE: &str = "http://localhost:8080/";
  const STYLESHEET: &str = "https://cdn.example.com/all.min.css";

  /// Network answering from a fixed table, switchable offline.
  #[derive(Default)]
  struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
  }

  impl ScriptedNetwork {
    fn with_app() -> Self {
      let network = Self::default();
      for path in ["", "index.html", "app.js", "manifest.json"] {
        network.route(&format!("{BASE}{path}"), ok(&format!("body of /{path}")));
      }
      network.route(
        STYLESHEET,
        Response {
          response_type: ResponseType::Cors,
          ..ok("css")
        },
      );
      network
    }

    fn route(&self, url: &str, response: Response) {
      self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    fn go_offline(&self) {
      self.offline.store(true, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  impl Network for Arc<ScriptedNetwork> {
    async fn fetch(&self, request: &Request) -> Result<Response, ShellError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.offline.load(Ordering::SeqCst) {
        return Err(ShellError::Network {
          url: request.url.to_string(),
          reason: "offline".into(),
        });
      }
      let routes = self.routes.lock().unwrap();
      Ok(routes.get(request.url.as_str()).cloned().unwrap_or(Response {
        status: 404,
        response_type: ResponseType::Basic,
        content_type: None,
        body: Vec::new(),
      }))
    }
  }

  fn ok(body: &str) -> Response {
    Response {
      status: 200,
      response_type: ResponseType::Basic,
      content_type: Some("text/plain".into()),
      body: body.as_bytes().to_vec(),
    }
  }

  fn config(version: &str) -> ShellConfig {
    ShellConfig {
      base_url: BASE.into(),
      version: version.into(),
      manifest: vec![
        "./".into(),
        "./index.html".into(),
        "./app.js".into(),
        "./manifest.json".into(),
        STYLESHEET.into(),
      ],
      ..ShellConfig::default()
    }
  }

  type Worker = ShellWorker<SqliteCacheStore, Arc<ScriptedNetwork>>;

  fn worker(db: &Arc<Database>, version: &str, network: &Arc<ScriptedNetwork>) -> Worker {
    ShellWorker::new(
      &config(version),
      SqliteCacheStore::new(db.clone()),
      network.clone(),
    )
    .unwrap()
  }

  fn names(worker: &Worker) -> Vec<String> {
    worker.status().unwrap().into_iter().map(|g| g.name).collect()
  }

  #[tokio::test]
  async fn test_install_populates_generation_with_manifest() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);

    let report = v1.install().await.unwrap();
    assert_eq!(report.generation, "phonestock-v1");
    assert_eq!(report.cached, 5);

    let status = v1.status().unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].entries, 5);
    assert!(status[0].current);
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    network.route(
      &format!("{BASE}app.js"),
      Response {
        status: 500,
        ..ok("boom")
      },
    );
    let v1 = worker(&db, "v1", &network);

    let err = v1.install().await.unwrap_err();
    assert!(matches!(err, ShellError::Install { .. }));
    assert_eq!(v1.status().unwrap()[0].entries, 0);
  }

  #[tokio::test]
  async fn test_generation_swap_scenario() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());

    let v1 = worker(&db, "v1", &network);
    v1.install().await.unwrap();
    let report = v1.activate().unwrap();
    assert!(report.deleted.is_empty());
    assert_eq!(names(&v1), vec!["phonestock-v1"]);

    let v2 = worker(&db, "v2", &network);
    v2.install().await.unwrap();
    assert_eq!(names(&v2), vec!["phonestock-v1", "phonestock-v2"]);

    let report = v2.activate().unwrap();
    assert_eq!(report.deleted, vec!["phonestock-v1".to_string()]);
    assert_eq!(names(&v2), vec!["phonestock-v2"]);
  }

  #[tokio::test]
  async fn test_failed_upgrade_cannot_activate_and_keeps_old_shell() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);
    v1.install().await.unwrap();
    v1.activate().unwrap();

    network.route(
      &format!("{BASE}app.js"),
      Response {
        status: 500,
        ..ok("boom")
      },
    );
    let v2 = worker(&db, "v2", &network);
    assert!(v2.install().await.is_err());
    assert!(matches!(v2.activate(), Err(ShellError::NotInstalled(_))));

    let status = v2.status().unwrap();
    assert_eq!(names(&v2), vec!["phonestock-v1", "phonestock-v2"]);
    assert!(status[0].complete);
    assert!(!status[1].complete);

    network.go_offline();
    let page = Request::navigate(v2.resolve("inventory").unwrap());
    let outcome = v2.fetch(&page).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::ShellFallback);
    assert_eq!(outcome.response.body, b"body of /index.html");
  }

  #[tokio::test]
  async fn test_unreadable_cache_row_is_a_miss() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);
    v1.install().await.unwrap();
    db.conn()
      .unwrap()
      .execute(
        "UPDATE cache_entries SET response_type = 'bogus' WHERE url = ?",
        [format!("{BASE}app.js")],
      )
      .unwrap();
    let after_install = network.calls();

    let request = Request::resource(v1.resolve("./app.js").unwrap());
    let outcome = v1.fetch(&request).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::Network);
    assert_eq!(outcome.response.body, b"body of /app.js");
    assert_eq!(network.calls(), after_install + 1);
  }

  #[tokio::test]
  async fn test_cached_response_served_without_network() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);
    v1.install().await.unwrap();
    let after_install = network.calls();

    let request = Request::resource(v1.resolve("./app.js").unwrap());
    let outcome = v1.fetch(&request).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::Cache);
    assert_eq!(outcome.response.body, b"body of /app.js");
    assert_eq!(network.calls(), after_install);
  }

  #[tokio::test]
  async fn test_network_response_is_cached_in_background() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    network.route(&format!("{BASE}icons/icon-192.png"), ok("png"));
    let v1 = worker(&db, "v1", &network);

    let request = Request::resource(v1.resolve("icons/icon-192.png").unwrap());
    let outcome = v1.fetch(&request).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::Network);
    outcome.refill.unwrap().await.unwrap();

    let again = v1.fetch(&request).await.unwrap();
    assert_eq!(again.source, ResponseSource::Cache);
    assert_eq!(again.response.body, b"png");
    assert_eq!(network.calls(), 1);
  }

  #[tokio::test]
  async fn test_uncacheable_responses_pass_through() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);

    let css = Request::resource(Url::parse(STYLESHEET).unwrap());
    let outcome = v1.fetch(&css).await.unwrap();
    assert_eq!(outcome.response.response_type, ResponseType::Cors);
    assert!(outcome.refill.is_none());

    let missing = Request::resource(v1.resolve("nope.js").unwrap());
    let outcome = v1.fetch(&missing).await.unwrap();
    assert_eq!(outcome.response.status, 404);
    assert_eq!(outcome.source, ResponseSource::Network);
    assert_eq!(v1.status().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn test_offline_navigation_gets_shell_but_resources_do_not() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);
    v1.install().await.unwrap();
    network.go_offline();

    let page = Request::navigate(v1.resolve("inventory?filter=sold").unwrap());
    let outcome = v1.fetch(&page).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::ShellFallback);
    assert_eq!(outcome.response.body, b"body of /index.html");

    let image = Request::resource(v1.resolve("photos/1.png").unwrap());
    assert!(matches!(
      v1.fetch(&image).await,
      Err(ShellError::Network { .. })
    ));
  }

  #[tokio::test]
  async fn test_error_page_navigation_falls_back_to_shell() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    let v1 = worker(&db, "v1", &network);
    v1.install().await.unwrap();

    let page = Request::navigate(v1.resolve("missing-page").unwrap());
    let outcome = v1.fetch(&page).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::ShellFallback);
  }

  #[tokio::test]
  async fn test_offline_navigation_without_shell_fails() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::with_app());
    network.go_offline();
    let v1 = worker(&db, "v1", &network);

    let page = Request::navigate(v1.resolve("./").unwrap());
    assert!(v1.fetch(&page).await.is_err());
  }

  #[test]
  fn test_push_and_sync() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let network = Arc::new(ScriptedNetwork::default());
    let v1 = worker(&db, "v1", &network);

    v1.sync("sync-inventory");
    let n = v1.push(r#"{"title":"Hi","body":"there"}"#).unwrap();
    assert_eq!(n.title, "Hi");
  }
}
