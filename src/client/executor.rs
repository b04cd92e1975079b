//! Authenticated request execution with bounded retries

use crate::client::retry::{RetryDecision, RetryPolicy};
use crate::client::session::Session;
use crate::client::token::{BearerToken, TokenManager};
use crate::error::{Result, RingoError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

/// Payload attached to a request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No payload
    #[default]
    Empty,
    /// JSON body
    Json(Value),
    /// URL query parameters
    Query(Vec<(String, String)>),
}

/// Sends authenticated requests to the vendor API
#[derive(Debug)]
pub struct RequestExecutor {
    api_root: Url,
    session: Arc<Session>,
    tokens: Arc<TokenManager>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    /// Create an executor over a shared session and token manager
    pub fn new(
        api_root: Url,
        session: Arc<Session>,
        tokens: Arc<TokenManager>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api_root,
            session,
            tokens,
            policy,
        }
    }

    /// Retry policy in effect
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Issue `method endpoint` and return the decoded JSON body.
    ///
    /// A rejected token is discarded and the call retried with a fresh one;
    /// transient failures are retried up to the policy bound. A failed
    /// reauthentication or a malformed success body is surfaced at once.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> Result<Value> {
        let url = self
            .api_root
            .join(endpoint)
            .map_err(|e| RingoError::config(format!("Invalid endpoint {endpoint}: {e}")))?;

        let mut attempt = 0;
        loop {
            let token = self.tokens.ensure_token().await?;

            let error = match self.send(&method, &url, &body, &token).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if let RingoError::Timeout(_) = &error {
                error!("Request timeout for {method} {endpoint}");
            }

            match self.policy.decide(attempt, &error) {
                RetryDecision::Retry {
                    reauthenticate,
                    delay,
                } => {
                    attempt += 1;
                    if reauthenticate {
                        debug!("Token rejected, reauthenticating (attempt {attempt})");
                        self.tokens.invalidate(&token).await;
                    } else {
                        debug!("Request failed, retrying (attempt {attempt}): {error}");
                    }
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                RetryDecision::Stop if error.is_retryable() => {
                    error!(
                        "Request failed for {method} {endpoint} after {attempt} retries: {error}"
                    );
                    return Err(RingoError::RetriesExhausted {
                        method: method.to_string(),
                        endpoint: endpoint.to_string(),
                        retries: attempt,
                        source: Box::new(error),
                    });
                }
                RetryDecision::Stop => {
                    warn!("Request {method} {endpoint} failed: {error}");
                    return Err(error);
                }
            }
        }
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        body: &RequestBody,
        token: &BearerToken,
    ) -> Result<Value> {
        let client = self.session.client().await?;
        let mut request = client
            .request(method.clone(), url.clone())
            .bearer_auth(token.as_str())
            .header(CONTENT_TYPE, "application/json");

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(json) => request.json(json),
            RequestBody::Query(params) => request.query(params),
        };

        let response = request.send().await.map_err(RingoError::from_transport)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(RingoError::token_expired(format!("{method} {url} returned 401")));
        }

        let text = response.text().await.map_err(RingoError::from_transport)?;
        if !status.is_success() {
            return Err(RingoError::status(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| RingoError::parsing(format!("{method} {url} returned invalid JSON: {e}")))
    }
}
