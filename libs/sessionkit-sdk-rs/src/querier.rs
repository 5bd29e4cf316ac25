use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::SdkConfig;
use crate::context::UserContext;
use crate::error::QuerierError;

/// API versions this SDK speaks, oldest first.
pub const SUPPORTED_API_VERSIONS: &[&str] = &["2.9", "3.0", "3.1"];

/// Status code the core uses to signal rate limiting.
const RATE_LIMIT_STATUS: u16 = 429;

/// Rate-limited requests are retried this many times on the same URL.
const MAX_RATE_LIMIT_RETRIES: u64 = 5;

pub(crate) const API_VERSION_HEADER: &str = "cdi-version";
pub(crate) const API_KEY_HEADER: &str = "api-key";
pub(crate) const RECIPE_ID_HEADER: &str = "rid";

/// Snapshot of an outbound request, handed to the network interceptor
/// before every attempt (retries included).
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Resilient multi-host HTTP client for the core.
///
/// Explicitly constructed and shareable via `Arc`; all mutable state
/// (host-rotation cursor, global cache tag, negotiated API version) lives on
/// the instance, so tests can run isolated queriers concurrently. The cursor
/// and tag are advisory: a race costs at most an uneven host pick or an
/// extra cache miss, never a wrong response.
pub struct Querier {
    config: Arc<SdkConfig>,
    client: Client,
    host_cursor: AtomicUsize,
    global_cache_tag: AtomicU64,
    api_version: RwLock<Option<String>>,
}

impl Querier {
    pub fn new(config: Arc<SdkConfig>) -> Result<Self, QuerierError> {
        config.validate()?;
        Ok(Self {
            config,
            client: Client::new(),
            host_cursor: AtomicUsize::new(0),
            global_cache_tag: AtomicU64::new(0),
            api_version: RwLock::new(None),
        })
    }

    /// Negotiated API version, querying the core on first use.
    ///
    /// Picks the largest version supported by both sides. An empty
    /// intersection is a fatal pairing error. Concurrent first callers may
    /// each negotiate; last write wins.
    pub async fn get_api_version(&self, ctx: &UserContext) -> Result<String, QuerierError> {
        if let Some(v) = self.api_version.read().await.clone() {
            return Ok(v);
        }

        let response = self
            .dispatch(Method::GET, "/apiversion", Vec::new(), None, ctx, None)
            .await?;
        let core_versions: Vec<String> = response
            .get("versions")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| {
                QuerierError::BadResponse("apiversion response missing `versions`".into())
            })?;

        let best = core_versions
            .iter()
            .filter(|v| SUPPORTED_API_VERSIONS.contains(&v.as_str()))
            .max_by(|a, b| compare_versions(a, b));

        match best {
            Some(version) => {
                debug!(version = %version, "negotiated core API version");
                *self.api_version.write().await = Some(version.clone());
                Ok(version.clone())
            }
            None => Err(QuerierError::IncompatibleCoreVersion {
                core_versions,
                sdk_versions: SUPPORTED_API_VERSIONS.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    pub async fn send_get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        ctx: &UserContext,
    ) -> Result<Value, QuerierError> {
        let version = self.get_api_version(ctx).await?;
        self.dispatch(Method::GET, path, owned_params(params), None, ctx, Some(&version))
            .await
    }

    pub async fn send_post(
        &self,
        path: &str,
        body: Value,
        ctx: &UserContext,
    ) -> Result<Value, QuerierError> {
        let version = self.get_api_version(ctx).await?;
        self.dispatch(Method::POST, path, Vec::new(), Some(body), ctx, Some(&version))
            .await
    }

    pub async fn send_put(
        &self,
        path: &str,
        body: Value,
        ctx: &UserContext,
    ) -> Result<Value, QuerierError> {
        let version = self.get_api_version(ctx).await?;
        self.dispatch(Method::PUT, path, Vec::new(), Some(body), ctx, Some(&version))
            .await
    }

    pub async fn send_patch(
        &self,
        path: &str,
        body: Value,
        ctx: &UserContext,
    ) -> Result<Value, QuerierError> {
        let version = self.get_api_version(ctx).await?;
        self.dispatch(Method::PATCH, path, Vec::new(), Some(body), ctx, Some(&version))
            .await
    }

    pub async fn send_delete(
        &self,
        path: &str,
        body: Value,
        ctx: &UserContext,
    ) -> Result<Value, QuerierError> {
        let version = self.get_api_version(ctx).await?;
        self.dispatch(Method::DELETE, path, Vec::new(), Some(body), ctx, Some(&version))
            .await
    }

    /// One logical request: host rotation, connection-failure retry (at most
    /// once per configured host), rate-limit backoff on the same URL, and
    /// the per-call GET cache.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
        ctx: &UserContext,
        api_version: Option<&str>,
    ) -> Result<Value, QuerierError> {
        let is_get = method == Method::GET;
        let headers = self.base_headers(api_version);

        let caching =
            is_get && !self.config.disable_core_call_cache && !ctx.is_detached();
        let cache_key = caching.then(|| cache_key(path, &params, &headers));

        if is_get && ctx.is_detached() {
            // No request scope bounds what a cached body may reflect.
            self.global_cache_tag.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(key) = &cache_key {
            if let Some(hit) = ctx.cache_lookup(key, self.global_cache_tag.load(Ordering::SeqCst))
            {
                debug!(path = %path, "core call served from per-request cache");
                return Ok(hit);
            }
        }
        if !is_get && !ctx.keep_cache_alive() {
            // Pessimistic invalidation: any write may have changed anything
            // a cached GET would reflect.
            self.global_cache_tag.fetch_add(1, Ordering::SeqCst);
        }

        let host_count = self.config.hosts.len();
        let mut hosts_tried = 0usize;
        let mut last_error = String::new();

        'hosts: while hosts_tried < host_count {
            let idx = self.host_cursor.fetch_add(1, Ordering::Relaxed) % host_count;
            let url = self.config.hosts[idx].url_for(path);
            let mut retries_left = MAX_RATE_LIMIT_RETRIES;

            loop {
                let mut request = OutgoingRequest {
                    url: url.clone(),
                    method: method.clone(),
                    headers: headers.clone(),
                    params: params.clone(),
                    body: body.clone(),
                };
                if let Some(hook) = &self.config.network_interceptor {
                    request = hook(request);
                }

                let response = match self.transmit(request).await {
                    Ok(response) => response,
                    Err(e) if is_connection_failure(&e) => {
                        warn!(url = %url, error = %e, "core host unreachable, rotating");
                        hosts_tried += 1;
                        last_error = e.to_string();
                        continue 'hosts;
                    }
                    Err(e) => return Err(QuerierError::Network(e)),
                };

                let status = response.status().as_u16();
                if status == RATE_LIMIT_STATUS {
                    if retries_left == 0 {
                        let body_text = response.text().await.unwrap_or_default();
                        return Err(QuerierError::RateLimited {
                            status,
                            body: body_text,
                        });
                    }
                    let attempt = MAX_RATE_LIMIT_RETRIES - retries_left;
                    retries_left -= 1;
                    let delay = Duration::from_millis(10 + 250 * attempt);
                    debug!(url = %url, delay_ms = %delay.as_millis(), "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                    continue;
                }

                if (200..300).contains(&status) {
                    let text = response.text().await.map_err(QuerierError::Network)?;
                    let parsed = parse_body(&text)?;
                    if status == 200 {
                        if let Some(key) = &cache_key {
                            ctx.cache_store(
                                key.clone(),
                                parsed.clone(),
                                self.global_cache_tag.load(Ordering::SeqCst),
                            );
                        }
                    }
                    return Ok(parsed);
                }

                let body_text = response.text().await.unwrap_or_default();
                return Err(QuerierError::CoreError {
                    status,
                    body: body_text,
                });
            }
        }

        Err(QuerierError::NoCoreAvailable {
            hosts_tried,
            last_error,
        })
    }

    async fn transmit(&self, request: OutgoingRequest) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = self.client.request(request.method, &request.url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder.send().await
    }

    fn base_headers(&self, api_version: Option<&str>) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(version) = api_version {
            headers.push((API_VERSION_HEADER.to_owned(), version.to_owned()));
        }
        if let Some(key) = &self.config.api_key {
            headers.push((API_KEY_HEADER.to_owned(), key.clone()));
        }
        if let Some(rid) = &self.config.recipe_id {
            headers.push((RECIPE_ID_HEADER.to_owned(), rid.clone()));
        }
        headers
    }
}

/// Numeric segment-wise version comparison ("2.10" > "2.9").
fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let segments = |v: &str| -> Vec<u64> {
        v.split('.').map(|s| s.parse().unwrap_or(0)).collect()
    };
    segments(a).cmp(&segments(b))
}

fn is_connection_failure(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request()
}

fn parse_body(text: &str) -> Result<Value, QuerierError> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| QuerierError::BadResponse(format!("core sent non-JSON body: {e}")))
}

fn owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Cache key: path + sorted query params + sorted relevant headers.
fn cache_key(path: &str, params: &[(String, String)], headers: &[(String, String)]) -> String {
    let mut params: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    params.sort();
    let mut headers: Vec<String> = headers.iter().map(|(k, v)| format!("{k}:{v}")).collect();
    headers.sort();
    format!("{path}?{}|{}", params.join("&"), headers.join(";"))
}
