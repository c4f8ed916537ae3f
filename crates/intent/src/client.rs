use reqwest::RequestBuilder;
use sightline_core::config::{LuisSettings, DEFAULT_LUIS_ENDPOINT};
use sightline_core::{remote, CallOptions, ConfigError, LuisRoute, ServiceError};
use std::future::Future;
use tracing::info;

use crate::extract::parse_response;
use crate::types::IntentResult;

/// Abstraction over an intent/entity service.
pub trait IntentBackend: Send + Sync {
    fn detect(
        &self,
        text: &str,
        call: &CallOptions,
    ) -> impl Future<Output = Result<IntentResult, ServiceError>> + Send;
}

#[derive(Debug, Clone)]
pub struct LuisClient {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
    api_key: String,
    route: LuisRoute,
}

impl LuisClient {
    pub fn new(endpoint: impl Into<String>, app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            api_key: api_key.into(),
            route: LuisRoute::Path,
        }
    }

    /// Client for the default public endpoint.
    pub fn with_app(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new(DEFAULT_LUIS_ENDPOINT, app_id, api_key)
    }

    pub fn from_settings(settings: &LuisSettings) -> Result<Self, ConfigError> {
        let app_id = settings.app_id.as_deref().ok_or(ConfigError::Missing("luis.app_id"))?;
        let api_key = settings.api_key.as_deref().ok_or(ConfigError::Missing("luis.api_key"))?;
        Ok(Self::new(&settings.endpoint, app_id, api_key).with_route(settings.route))
    }

    pub fn with_route(mut self, route: LuisRoute) -> Self {
        self.route = route;
        self
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub async fn detect_intent(&self, text: &str, call: &CallOptions) -> Result<IntentResult, ServiceError> {
        info!(chars = text.len(), route = ?self.route, "detecting intent");
        let context = format!("failed to detect entities in '{text}'");
        let body = remote::send(self.request(text), &context, call).await?;
        parse_response(&body, &context)
    }

    fn request(&self, text: &str) -> RequestBuilder {
        match self.route {
            LuisRoute::Path => {
                let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), self.app_id);
                self.http
                    .get(url)
                    .query(&[("subscription-key", self.api_key.as_str()), ("q", text)])
            }
            LuisRoute::Query => self.http.get(&self.endpoint).query(&[
                ("id", self.app_id.as_str()),
                ("subscription-key", self.api_key.as_str()),
                ("q", text),
            ]),
        }
    }
}

impl IntentBackend for LuisClient {
    async fn detect(&self, text: &str, call: &CallOptions) -> Result<IntentResult, ServiceError> {
        self.detect_intent(text, call).await
    }
}

/// Returns a preset result and remembers nothing.
pub struct MockIntent {
    pub result: IntentResult,
}

impl MockIntent {
    pub fn new(result: IntentResult) -> Self {
        Self { result }
    }
}

impl IntentBackend for MockIntent {
    async fn detect(&self, _text: &str, _call: &CallOptions) -> Result<IntentResult, ServiceError> {
        Ok(self.result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;

    const MORDOR: &str = r#"{
        "query": "ONE DOES NOT SIMPLY OCR SOME TEXT FROM AN IMAGE",
        "topScoringIntent": { "intent": "Mordor", "score": 0.9 },
        "entities": [ { "type": "Subject1", "entity": "ocr some text from an image", "score": 0.8 } ]
    }"#;

    fn check(app_id: &str, q: &HashMap<String, String>) -> (StatusCode, String) {
        if q.get("subscription-key").map(String::as_str) != Some("key") {
            return (StatusCode::UNAUTHORIZED, r#"{"statusCode":401,"message":"bad key"}"#.to_string());
        }
        if app_id != "app-1" {
            return (StatusCode::NOT_FOUND, format!("unknown app {app_id}"));
        }
        if q.get("q").map(String::as_str) != Some("ONE DOES NOT SIMPLY OCR SOME TEXT FROM AN IMAGE") {
            return (StatusCode::BAD_REQUEST, format!("unexpected query {:?}", q.get("q")));
        }
        (StatusCode::OK, MORDOR.to_string())
    }

    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/apps/{app_id}",
                get(|Path(app_id): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                    check(&app_id, &q)
                }),
            )
            .route(
                "/apps",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let app_id = q.get("id").cloned().unwrap_or_default();
                    check(&app_id, &q)
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/apps")
    }

    const TEXT: &str = "ONE DOES NOT SIMPLY OCR SOME TEXT FROM AN IMAGE";

    #[tokio::test]
    async fn app_in_path_route() {
        let endpoint = serve().await;
        let client = LuisClient::new(endpoint, "app-1", "key");
        let r = client.detect_intent(TEXT, &CallOptions::default()).await.unwrap();
        assert_eq!(r.intent, "Mordor");
        assert_eq!(r.entity("Subject1").unwrap().full_value(), "ocr some text from an image");
    }

    #[tokio::test]
    async fn app_in_query_route() {
        let endpoint = serve().await;
        let client = LuisClient::new(endpoint, "app-1", "key").with_route(LuisRoute::Query);
        let r = client.detect(TEXT, &CallOptions::default()).await.unwrap();
        assert_eq!(r.intent, "Mordor");
    }

    #[tokio::test]
    async fn trailing_slash_on_endpoint_is_tolerated() {
        let endpoint = serve().await;
        let client = LuisClient::new(format!("{endpoint}/"), "app-1", "key");
        assert!(client.detect_intent(TEXT, &CallOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn rejected_call_reports_status_body_and_text() {
        let endpoint = serve().await;
        let client = LuisClient::new(endpoint, "app-1", "nope");
        let err = client.detect_intent(TEXT, &CallOptions::default()).await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains(r#""message":"bad key""#), "{msg}");
        assert!(msg.contains(TEXT), "{msg}");
    }

    #[tokio::test]
    async fn unknown_app_is_remote_error() {
        let endpoint = serve().await;
        let client = LuisClient::new(endpoint, "app-2", "key");
        let err = client.detect_intent(TEXT, &CallOptions::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::RemoteApi { status: 404, .. }));
    }

    #[tokio::test]
    async fn unreachable_service_does_not_leak_key() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LuisClient::new(format!("http://{addr}/apps"), "app-1", "SECRETKEY123");
        let err = client.detect_intent("hello", &CallOptions::default()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Network { .. }));
        let msg = err.to_string();
        assert!(!msg.contains("SECRETKEY123"), "{msg}");
        assert!(msg.contains("/apps/app-1"), "{msg}");
    }

    #[test]
    fn from_settings_requires_credentials() {
        let mut s = LuisSettings::default();
        assert!(matches!(LuisClient::from_settings(&s), Err(ConfigError::Missing("luis.app_id"))));
        s.app_id = Some("a".into());
        assert!(matches!(LuisClient::from_settings(&s), Err(ConfigError::Missing("luis.api_key"))));
        s.api_key = Some("k".into());
        s.route = LuisRoute::Query;
        assert_eq!(LuisClient::from_settings(&s).unwrap().route, LuisRoute::Query);
    }

    #[tokio::test]
    async fn mock_returns_preset() {
        let mock = MockIntent::new(IntentResult::new("Mordor", 1.0));
        let r = mock.detect("anything", &CallOptions::default()).await.unwrap();
        assert_eq!(r.intent, "Mordor");
    }
}
