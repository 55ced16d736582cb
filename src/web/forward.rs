//! Upstream request forwarding
//!
//! Relays buffered requests to the collector with minimal modification and
//! relays the response back unchanged. In suppressed-submission mode,
//! submission requests are answered locally and never reach the upstream.

use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, DATE, HOST, SERVER, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue, Method, Response, StatusCode, Uri};
use bytes::Bytes;
use chrono::Utc;
use reqwest::Url;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::intercept;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);
const SERVER_BANNER: &str = "SSH-AttackPod-Proxy/1.0";
const MOCK_SUCCESS_BODY: &str = r#"{"status":"success"}"#;

pub struct Forwarder {
    client: reqwest::Client,
    upstream: Url,
    suppress_submissions: bool,
    log_requests: bool,
}

impl Forwarder {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            upstream: config.upstream_url()?,
            suppress_submissions: config.do_not_submit_attacks,
            log_requests: config.log_requests,
        })
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    /// Forward one buffered request and relay the upstream's answer.
    /// Transport failures degrade to 502 for this request only.
    pub async fn forward(
        &self,
        method: Method,
        uri: &Uri,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Response<Body> {
        if self.suppress_submissions && uri.path() == intercept::ENDPOINT_ADD_ATTACK {
            if self.log_requests {
                info!("Skipping submission of attack data due to configuration and returning mockup response");
            }
            return mock_success_response();
        }

        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());

        let target = match self.upstream.join(path_and_query) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build upstream URL for {}: {}", path_and_query, e);
                return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        };

        // The handler hands over its own copy of the headers, so mutation
        // here cannot leak back. Host is dropped: the client derives it from
        // the target URL so the upstream sees its own name.
        headers.remove(HOST);

        if self.log_requests {
            info!("Forwarding request: {} {} to {}", method, uri.path(), target);
        }
        debug!("Request headers ({}): {:?}", headers.len(), headers);
        debug!("Request body ({} bytes)", body.len());

        let result = self
            .client
            .request(method, target.clone())
            .headers(headers)
            .body(body)
            .send()
            .await;

        let upstream_response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to forward request to {}: {}", target, e);
                return plain_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
            }
        };

        let status = upstream_response.status();
        let response_headers = upstream_response.headers().clone();

        if self.log_requests {
            info!("Received response: {} from {}", status.as_u16(), target);
        }
        debug!("Response headers ({}): {:?}", response_headers.len(), response_headers);

        let response_body = match upstream_response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read response body from {}: {}", target, e);
                return plain_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
            }
        };
        debug!("Response body ({} bytes)", response_body.len());

        let mut response = Response::new(Body::from(response_body));
        *response.status_mut() = status;
        for (name, value) in response_headers.iter() {
            // The body is re-framed on our side of the connection.
            if *name == TRANSFER_ENCODING || *name == CONNECTION || *name == CONTENT_LENGTH {
                continue;
            }
            response.headers_mut().append(name.clone(), value.clone());
        }

        response
    }
}

/// Canned success answer for suppressed submissions.
fn mock_success_response() -> Response<Body> {
    let mut response = Response::new(Body::from(MOCK_SUCCESS_BODY));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(SERVER, HeaderValue::from_static(SERVER_BANNER));
    if let Ok(date) = HeaderValue::from_str(
        &Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
    ) {
        headers.insert(DATE, date);
    }
    response
}

fn plain_response(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}
