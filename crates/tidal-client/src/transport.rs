//! Minimal HTTP/1 transport to the optimizer.
//!
//! One TCP connection per request; the optimizer is expected to be local
//! or close by, and every call is bounded by a timeout.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use tidal_core::TelemetrySample;

use crate::error::{ClientError, ClientResult};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Send one request and collect the full response body.
pub async fn send(
    address: &str,
    method: Method,
    path: &str,
    body: Option<Vec<u8>>,
    timeout: Duration,
) -> ClientResult<(StatusCode, Bytes)> {
    let uri = format!("http://{address}{path}");

    let exchange = async {
        let stream = tokio::net::TcpStream::connect(address)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(&uri)
            .header("host", address)
            .header("user-agent", "tidal-client/0.1");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?
            .to_bytes();
        Ok::<_, ClientError>((status, bytes))
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%uri, "request timed out");
            Err(ClientError::Timeout)
        }
    }
}

/// POST a JSON document, expecting a 2xx.
pub async fn post_json<T: Serialize>(
    address: &str,
    path: &str,
    doc: &T,
    timeout: Duration,
) -> ClientResult<()> {
    let body = serde_json::to_vec(doc).map_err(|e| ClientError::Encode(e.to_string()))?;
    let (status, _) = send(address, Method::POST, path, Some(body), timeout).await?;
    if !status.is_success() {
        return Err(ClientError::Status(status.as_u16()));
    }
    Ok(())
}

/// GET a JSON document, expecting a 2xx.
pub async fn get_json<T: DeserializeOwned>(
    address: &str,
    path: &str,
    timeout: Duration,
) -> ClientResult<T> {
    let (status, bytes) = send(address, Method::GET, path, None, timeout).await?;
    if !status.is_success() {
        return Err(ClientError::Status(status.as_u16()));
    }
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Push one sample to the optimizer's ingest endpoint.
pub async fn push_sample(address: &str, sample: &TelemetrySample) -> ClientResult<()> {
    post_json(address, "/metrics", sample, DEFAULT_TIMEOUT).await
}

/// Path of the policy document for one service.
pub fn policy_path(service_id: &str) -> String {
    format!("/api/v1/services/{}/policy", encode_segment(service_id))
}

/// Percent-encode everything outside the unreserved set.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
