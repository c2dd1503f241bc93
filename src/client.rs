//! Talking to the Nowledge Mem thread API.

use crate::conversation::ThreadPayload;
use crate::error::{ImportError, Result, SetupError};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:14242";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: usize = 100;
const ERROR_BODY_LIMIT: usize = 200;

/// What the importer needs from the memory service.
pub trait MemoryService {
    /// Every thread the service currently holds, across all pages.
    fn list_threads(&self) -> Result<Vec<RemoteThread>>;

    fn create_thread(&self, payload: &ThreadPayload) -> Result<CreatedThread>;
}

/// Identifying fields of a thread that already exists remotely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteThread {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

// Stored threads may carry `null` ids or titles.
fn null_as_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RemoteThread {
    /// Content fingerprint recorded when this tool created the thread.
    pub fn fingerprint(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get("fingerprint")?
            .as_str()
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedThread {
    /// Id assigned by the service, when it reports one.
    pub id: Option<String>,
}

#[derive(Deserialize)]
struct ThreadPage {
    #[serde(default)]
    threads: Vec<RemoteThread>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Deserialize, Default)]
struct Pagination {
    #[serde(default)]
    has_more: bool,
}

/// Blocking HTTP client for a local Nowledge Mem instance.
pub struct NowledgeClient {
    http: reqwest::blocking::Client,
    base_url: Url,
    threads_url: Url,
}

impl NowledgeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let invalid = |reason: String| SetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(invalid("expected an http(s) URL".into()).into());
        }
        // Keep any path prefix when joining endpoint names onto it.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let threads_url = base.join("threads").map_err(|e| invalid(e.to_string()))?;

        // The service is local; system proxies would only get in the way.
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| SetupError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base,
            threads_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_connect() {
            format!(
                "connection failed, make sure Nowledge Mem is running at {}",
                self.base_url
            )
        } else if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        }
    }
}

impl MemoryService for NowledgeClient {
    fn list_threads(&self) -> Result<Vec<RemoteThread>> {
        let mut threads = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .http
                .get(self.threads_url.clone())
                .query(&[("limit", PAGE_SIZE), ("offset", offset)])
                .send()
                .map_err(|e| ImportError::RemoteQuery(self.describe(&e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ImportError::RemoteQuery(format!(
                    "HTTP {} from {}",
                    status, self.threads_url
                )));
            }

            let page: ThreadPage = response
                .json()
                .map_err(|e| ImportError::RemoteQuery(format!("unexpected response: {e}")))?;
            let received = page.threads.len();
            debug!(offset, received, has_more = page.pagination.has_more, "fetched thread page");
            threads.extend(page.threads);

            if !page.pagination.has_more || received == 0 {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(threads)
    }

    fn create_thread(&self, payload: &ThreadPayload) -> Result<CreatedThread> {
        let submit_err = |reason: String| ImportError::Submit {
            title: payload.title.clone(),
            reason,
        };

        let response = self
            .http
            .post(self.threads_url.clone())
            .json(payload)
            .send()
            .map_err(|e| submit_err(self.describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(submit_err(format!("API error {}: {}", status.as_u16(), body)));
        }

        let body: serde_json::Value = response.json().unwrap_or_default();
        let id = body
            .pointer("/thread/id")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(CreatedThread { id })
    }
}
