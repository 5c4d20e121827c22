use reqwest::header::{self, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{AccessToken, Credentials};
use crate::cache::{cache_key, CacheStorage, FileStorage};
use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::zube::api_types::ApiPaginated;
use crate::zube::types::{
  Account, Card, Comment, CurrentPerson, Epic, Label, Member, NewCard, Project, Sprint, Source,
  Workspace,
};

pub(crate) fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(config.timeout)
    .build()
    .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Zube API client with transparent ETag caching.
///
/// Every call goes through one pipeline: build the URL, attach credentials,
/// make the request conditional when a cached copy exists, and serve the cached
/// copy on `304 Not Modified`. Callers can't tell a cached response from a
/// fresh one.
pub struct ZubeClient<S: CacheStorage = FileStorage> {
  http: reqwest::Client,
  base_url: Url,
  client_id: String,
  access_token: AccessToken,
  cache: S,
}

impl<S: CacheStorage> ZubeClient<S> {
  /// Create a client for already validated `credentials`.
  ///
  /// The token is not refreshed here or during calls; use
  /// `Credentials::ensure_valid` before constructing the client.
  pub fn new(credentials: &Credentials, config: &ClientConfig, cache: S) -> Result<Self> {
    Ok(Self {
      http: build_http_client(config)?,
      base_url: Url::parse(&config.base_url)?,
      client_id: credentials.client_id.clone(),
      access_token: credentials.access_token.clone(),
      cache,
    })
  }

  pub fn cache(&self) -> &S {
    &self.cache
  }

  /// Full request URL for an API path and query.
  pub fn url(&self, path: &str, query: &Query) -> Result<Url> {
    let mut url = self.base_url.join(path)?;
    url.set_query(Some(&query.encode()));
    Ok(url)
  }

  /// Perform one authenticated request and return the raw response body.
  ///
  /// GET requests are cache-aware: a stored ETag is sent as `If-None-Match`,
  /// a `304` is answered from the cache, and any response carrying an `ETag`
  /// is stored, whatever its status.
  async fn execute(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
    if self.access_token.is_empty() {
      return Err(Error::Auth(
        "Missing access token. Run `zube login` first.".into(),
      ));
    }

    let cacheable = method == Method::GET;
    let key = cache_key(url.as_str());
    let cached = if cacheable { self.cache.get(&key) } else { None };

    let mut request = self
      .http
      .request(method.clone(), url.clone())
      .header(
        header::AUTHORIZATION,
        format!("Bearer {}", self.access_token.as_str()),
      )
      .header("X-Client-ID", self.client_id.as_str())
      .header(header::USER_AGENT, USER_AGENT);

    if let Some(entry) = &cached {
      request = request.header(header::IF_NONE_MATCH, entry.etag.as_str());
    }

    if let Some(body) = body {
      request = request
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body);
    }

    debug!(%method, %url, conditional = cached.is_some(), "Sending request");

    let response = request.send().await.map_err(|source| Error::Transport {
      url: url.to_string(),
      source,
    })?;

    let status = response.status();

    if status == StatusCode::NOT_MODIFIED {
      if let Some(entry) = cached {
        debug!(%url, "Not modified, serving cached response");
        return serde_json::to_vec(&entry.data)
          .map_err(|e| Error::encode(format!("cached response for {}", url), e));
      }
    }

    let etag = response
      .headers()
      .get(header::ETAG)
      .and_then(|v: &HeaderValue| v.to_str().ok())
      .filter(|v| !v.is_empty())
      .map(String::from);

    let bytes = response.bytes().await.map_err(|source| Error::Transport {
      url: url.to_string(),
      source,
    })?;

    if let (true, Some(etag)) = (cacheable, etag) {
      // Error bodies carrying an ETag are cached too
      if let Err(e) = self.cache.save(&key, &etag, &bytes) {
        warn!("Not caching response for {}: {}", url, e);
      }
    }

    if !status.is_success() {
      return Err(Error::Api {
        url: url.to_string(),
        status,
        body: String::from_utf8_lossy(&bytes).into_owned(),
      });
    }

    Ok(bytes.to_vec())
  }

  /// GET a paginated list endpoint and return its records.
  async fn fetch_list<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<Vec<T>> {
    let url = self.url(path, query)?;
    let body = self.execute(Method::GET, url, None).await?;

    let page: ApiPaginated<T> =
      serde_json::from_slice(&body).map_err(|e| Error::decode(format!("response of {}", path), e))?;

    Ok(page.data)
  }

  /// GET an endpoint that returns a single object.
  async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = self.url(path, &Query::new())?;
    let body = self.execute(Method::GET, url, None).await?;

    serde_json::from_slice(&body).map_err(|e| Error::decode(format!("response of {}", path), e))
  }

  /// POST a JSON body and decode the single object returned.
  async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, payload: &B) -> Result<T> {
    let url = self.url(path, &Query::new())?;
    let body =
      serde_json::to_vec(payload).map_err(|e| Error::encode(format!("request to {}", path), e))?;
    let response = self.execute(Method::POST, url, Some(body)).await?;

    serde_json::from_slice(&response)
      .map_err(|e| Error::decode(format!("response of {}", path), e))
  }

  pub async fn fetch_current_person(&self) -> Result<CurrentPerson> {
    self.fetch_one("/api/current_person").await
  }

  pub async fn fetch_cards(&self, query: &Query) -> Result<Vec<Card>> {
    self.fetch_list("/api/cards", query).await
  }

  /// Full text search over cards.
  pub async fn search_cards(&self, text: &str) -> Result<Vec<Card>> {
    self.fetch_cards(&Query::new().search(text)).await
  }

  /// Cards of one project. A `project_id` filter in `query` has no effect.
  pub async fn fetch_project_cards(&self, project_id: u64, query: &Query) -> Result<Vec<Card>> {
    self
      .fetch_list(&format!("/api/projects/{}/cards", project_id), query)
      .await
  }

  pub async fn fetch_card_comments(&self, card_id: u64) -> Result<Vec<Comment>> {
    self
      .fetch_list(&format!("/api/cards/{}/comments", card_id), &Query::new())
      .await
  }

  pub async fn create_card(&self, card: &NewCard) -> Result<Card> {
    self.post("/api/cards", card).await
  }

  pub async fn fetch_projects(&self, query: &Query) -> Result<Vec<Project>> {
    self.fetch_list("/api/projects", query).await
  }

  pub async fn fetch_project_members(&self, project_id: u64) -> Result<Vec<Member>> {
    self
      .fetch_list(&format!("/api/projects/{}/members", project_id), &Query::new())
      .await
  }

  pub async fn fetch_workspaces(&self, query: &Query) -> Result<Vec<Workspace>> {
    self.fetch_list("/api/workspaces", query).await
  }

  pub async fn fetch_epics(&self, project_id: u64) -> Result<Vec<Epic>> {
    self
      .fetch_list(&format!("/api/projects/{}/epics", project_id), &Query::new())
      .await
  }

  pub async fn fetch_labels(&self, project_id: u64) -> Result<Vec<Label>> {
    self
      .fetch_list(&format!("/api/projects/{}/labels", project_id), &Query::new())
      .await
  }

  pub async fn fetch_sprints(&self, workspace_id: u64) -> Result<Vec<Sprint>> {
    self
      .fetch_list(
        &format!("/api/workspaces/{}/sprints", workspace_id),
        &Query::new(),
      )
      .await
  }

  pub async fn fetch_accounts(&self, query: &Query) -> Result<Vec<Account>> {
    self.fetch_list("/api/accounts", query).await
  }

  /// GitHub sources connected to the account
  pub async fn fetch_sources(&self) -> Result<Vec<Source>> {
    self.fetch_list("/api/sources", &Query::new()).await
  }
}
