use crate::client::cache::ResponseCache;
use crate::client::error::{AttemptError, ClientError, ClientResult};
use crate::client::payload::{EventItem, FixtureItem, LeagueItem, StandingsItem, TeamItem};
use crate::client::rate_limiter::RateLimiter;
use crate::client::{FixtureQuery, FootballDataSource};
use crate::config::config::Config;
use async_trait::async_trait;
use log::{error, info, warn};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const PROVIDER_HOST: &str = "v3.football.api-sports.io";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^attempt`, capped at `max_delay`, plus up to 10% jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let spread = (exponential.as_millis() / 10) as u64;
        let jitter = rand::thread_rng().gen_range(0..=spread);
        exponential + Duration::from_millis(jitter)
    }
}

pub struct ApiFootballClient {
    http: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    cache: Option<ResponseCache>,
    retry: RetryPolicy,
}

impl ApiFootballClient {
    pub fn new(config: &Config, limiter: Arc<RateLimiter>) -> ClientResult<Self> {
        let retry = RetryPolicy {
            max_retries: config.api_football_max_retries,
            base_delay: Duration::from_millis(config.api_football_backoff_ms),
            ..Default::default()
        };
        ApiFootballClient::with_settings(
            &config.api_football_base_url,
            &config.api_football_key,
            Duration::from_secs(config.api_football_timeout_seconds),
            limiter,
            ResponseCache::new(Duration::from_secs(config.cache_ttl_seconds)),
            retry,
        )
    }

    pub fn with_settings(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        limiter: Arc<RateLimiter>,
        cache: Option<ResponseCache>,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        if api_key.is_empty() {
            warn!("API_FOOTBALL_KEY is empty, provider calls will be rejected");
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-apisports-key",
            HeaderValue::from_str(api_key).map_err(|e| ClientError::Build(e.to_string()))?,
        );
        headers.insert("x-rapidapi-host", HeaderValue::from_static(PROVIDER_HOST));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(ApiFootballClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
            cache,
            retry,
        })
    }

    /// GET `endpoint`, served from the cache when a fresh copy exists.
    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> ClientResult<Value> {
        let key = ResponseCache::key(endpoint, params);
        if let Some(body) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(body);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire().await;
            info!("API request: GET {} params={:?}", url, params);
            let reason = match self.send_once(&url, params).await {
                Ok(body) => {
                    info!(
                        "API response: {} results",
                        body.get("results").and_then(Value::as_i64).unwrap_or(0)
                    );
                    if let Some(cache) = &self.cache {
                        cache.put(key, body.clone());
                    }
                    return Ok(body);
                }
                Err(AttemptError::Fatal(err)) => {
                    error!("API request to {} failed: {}", endpoint, err);
                    return Err(err);
                }
                Err(AttemptError::RateLimitExceeded) => {
                    self.limiter.exhaust().await;
                    "rate limit exceeded".to_string()
                }
                Err(AttemptError::Transient(reason)) => {
                    if attempt < self.retry.max_retries {
                        let delay = self.retry.delay(attempt);
                        warn!(
                            "API request to {} failed ({}), retrying in {:?}",
                            endpoint, reason, delay
                        );
                        sleep(delay).await;
                    }
                    reason
                }
            };
            if attempt >= self.retry.max_retries {
                error!(
                    "API request to {} gave up after {} attempts: {}",
                    endpoint,
                    attempt + 1,
                    reason
                );
                return Err(ClientError::ServiceUnavailable {
                    attempts: attempt + 1,
                    reason,
                });
            }
            attempt += 1;
        }
    }

    async fn send_once(&self, url: &str, params: &[(&str, String)]) -> Result<Value, AttemptError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimitExceeded);
        }
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("HTTP {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;
        if !status.is_success() {
            return Err(AttemptError::Fatal(ClientError::Rejected {
                status: status.as_u16(),
                body,
            }));
        }
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| AttemptError::Fatal(ClientError::BadResponse(e.to_string())))?;
        check_provider_errors(&value)?;
        if value.get("response").is_none() {
            return Err(AttemptError::Fatal(ClientError::BadResponse(
                "missing `response` member".to_string(),
            )));
        }
        Ok(value)
    }

    async fn typed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ClientResult<Vec<T>> {
        let body = self.get(endpoint, params).await?;
        decode_response(body).map_err(|err| {
            if let Some(cache) = &self.cache {
                cache.remove(&ResponseCache::key(endpoint, params));
            }
            err
        })
    }
}

/// API-Football answers quota problems and bad parameters with HTTP 200 and
/// a non-empty `errors` member, either `[]`/`{}` shaped.
fn check_provider_errors(body: &Value) -> Result<(), AttemptError> {
    match body.get("errors") {
        Some(Value::Object(errors)) if errors.contains_key("rateLimit") => {
            Err(AttemptError::RateLimitExceeded)
        }
        Some(Value::Object(errors)) if !errors.is_empty() => Err(AttemptError::Fatal(
            ClientError::Provider(Value::Object(errors.clone()).to_string()),
        )),
        Some(Value::Array(errors)) if !errors.is_empty() => Err(AttemptError::Fatal(
            ClientError::Provider(Value::Array(errors.clone()).to_string()),
        )),
        _ => Ok(()),
    }
}

fn decode_response<T: DeserializeOwned>(mut body: Value) -> ClientResult<Vec<T>> {
    let response = body
        .get_mut("response")
        .map(Value::take)
        .ok_or_else(|| ClientError::BadResponse("missing `response` member".to_string()))?;
    serde_json::from_value(response).map_err(|e| ClientError::BadResponse(e.to_string()))
}

#[async_trait]
impl FootballDataSource for ApiFootballClient {
    async fn leagues(&self, league_id: i64, season: Option<i32>) -> ClientResult<Vec<LeagueItem>> {
        let mut params = vec![("id", league_id.to_string())];
        if let Some(season) = season {
            params.push(("season", season.to_string()));
        }
        self.typed("/leagues", &params).await
    }

    async fn teams(&self, league_id: i64, season: i32) -> ClientResult<Vec<TeamItem>> {
        self.typed(
            "/teams",
            &[("league", league_id.to_string()), ("season", season.to_string())],
        )
        .await
    }

    async fn fixtures(&self, query: &FixtureQuery) -> ClientResult<Vec<FixtureItem>> {
        self.typed("/fixtures", &query.params()).await
    }

    async fn fixture_events(&self, fixture_id: i64) -> ClientResult<Vec<EventItem>> {
        self.typed("/fixtures/events", &[("fixture", fixture_id.to_string())])
            .await
    }

    async fn standings(&self, league_id: i64, season: i32) -> ClientResult<Vec<StandingsItem>> {
        self.typed(
            "/standings",
            &[("league", league_id.to_string()), ("season", season.to_string())],
        )
        .await
    }

    async fn raw(&self, endpoint: &str, params: Vec<(&'static str, String)>) -> ClientResult<Value> {
        self.get(endpoint, &params).await
    }
}
