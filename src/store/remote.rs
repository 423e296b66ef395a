//! Hosted leaderboard reached through a PostgREST `scores` table.
//!
//! The table is assumed to exist already; this side only inserts and reads.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::{Backend, NewScore, ScoreBackend, ScoreRecord};

const TABLE_PATH: &str = "/rest/v1/scores";

#[derive(Serialize)]
struct InsertBody<'a> {
    name: &'a str,
    score: i64,
}

#[derive(Deserialize)]
struct BestRow {
    score: Option<i64>,
}

pub struct RemoteBackend {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl RemoteBackend {
    /// Prepare a client for `base_url`. No request is made here.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> StoreResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .map_err(|e| StoreError::InvalidUrl(format!("{base_url}: {e}")))?;

        if uri.scheme_str() != Some("http") || uri.host().is_none() {
            return Err(StoreError::InvalidUrl(format!(
                "{base_url}: expected an http:// endpoint"
            )));
        }

        let client = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// Query string for the leaderboard
    fn top_query(limit: usize) -> String {
        format!("select=name,score,created_at&order=score.desc,created_at.asc&limit={limit}")
    }

    /// Query string for one player's best score
    fn best_query(name: &str) -> String {
        format!(
            "select=score&name=eq.{}&order=score.desc&limit=1",
            encode_query_value(name)
        )
    }

    async fn send(&self, method: Method, query: Option<&str>, body: Option<Vec<u8>>) -> StoreResult<Bytes> {
        let uri = match query {
            Some(query) => format!("{}{TABLE_PATH}?{query}", self.base_url),
            None => format!("{}{TABLE_PATH}", self.base_url),
        };

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .header("Prefer", "return=minimal");
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| StoreError::Request(e.to_string()))?;

        debug!(%method, %uri, "remote leaderboard request");

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?
                .to_bytes();

            if !status.is_success() {
                return Err(StoreError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Ok::<_, StoreError>(body)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout.as_millis() as u64))?
    }
}

#[async_trait]
impl ScoreBackend for RemoteBackend {
    fn kind(&self) -> Backend {
        Backend::Remote
    }

    /// The server stamps `created_at` itself
    async fn insert(&self, entry: NewScore) -> StoreResult<()> {
        let body = serde_json::to_vec(&InsertBody {
            name: &entry.name,
            score: entry.score,
        })?;
        self.send(Method::POST, None, Some(body)).await?;
        Ok(())
    }

    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<ScoreRecord>> {
        let body = self
            .send(Method::GET, Some(&Self::top_query(limit)), None)
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_best(&self, name: &str) -> StoreResult<Option<i64>> {
        let body = self
            .send(Method::GET, Some(&Self::best_query(name)), None)
            .await?;
        let rows: Vec<BestRow> = serde_json::from_slice(&body)?;
        Ok(rows.into_iter().next().and_then(|row| row.score))
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
