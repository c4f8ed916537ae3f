//! Single-shot HTTP calls against the remote vision and language services.
//!
//! Every call is sent exactly once. A failure of any kind is returned to the
//! caller as a [`ServiceError`] carrying enough context to diagnose it
//! without re-running the call.

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed call: {context} - code {status} - details\n{body}")]
    RemoteApi {
        context: String,
        status: u16,
        body: String,
    },
    #[error("Could not decode response for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed response for {context}: {source}")]
    Malformed {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Call to {endpoint} was cancelled")]
    Cancelled { endpoint: String },
}

impl ServiceError {
    /// HTTP status of a failed remote call, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Caller-supplied deadline and cancellation for a single remote call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Send `request` once and return the full response body.
///
/// `context` identifies the input (image URI, file name, query text) and ends
/// up in the error message of a non-2xx answer.
pub async fn send(
    request: RequestBuilder,
    context: &str,
    options: &CallOptions,
) -> Result<Vec<u8>, ServiceError> {
    let request = match options.timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    };
    let (client, request) = request.build_split();
    let request = request.map_err(|source| ServiceError::Network {
        endpoint: context.to_string(),
        source: source.without_url(),
    })?;
    // reqwest errors carry the full URL, query string included.
    let endpoint = redacted(request.url());

    debug!(%endpoint, method = %request.method(), "sending request");

    let call = async {
        let response = client.execute(request).await.map_err(|source| ServiceError::Network {
            endpoint: endpoint.clone(),
            source: source.without_url(),
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|source| ServiceError::Network {
            endpoint: endpoint.clone(),
            source: source.without_url(),
        })?;
        Ok::<_, ServiceError>((status, body))
    };

    let (status, body) = match &options.cancel {
        Some(token) => {
            let outcome = token.run_until_cancelled(call).await;
            match outcome {
                Some(result) => result?,
                None => {
                    debug!(%endpoint, "request cancelled");
                    return Err(ServiceError::Cancelled { endpoint });
                }
            }
        }
        None => call.await?,
    };

    if !status.is_success() {
        warn!(%endpoint, status = status.as_u16(), "remote call failed");
        return Err(ServiceError::RemoteApi {
            context: context.to_string(),
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    debug!(%endpoint, status = status.as_u16(), bytes = body.len(), "response received");
    Ok(body.to_vec())
}

/// Parse a JSON body, separating unparseable text from well-formed JSON that
/// lacks the fields we need.
pub fn parse_json<T: DeserializeOwned>(body: &[u8], context: &str) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|source| match source.classify() {
        Category::Data => ServiceError::Malformed {
            context: context.to_string(),
            source,
        },
        Category::Io | Category::Syntax | Category::Eof => ServiceError::Decode {
            context: context.to_string(),
            source,
        },
    })
}

// Query strings may carry subscription keys.
fn redacted(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}
