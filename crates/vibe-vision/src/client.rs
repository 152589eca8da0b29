//! Vision service HTTP client.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info_span, warn, Instrument};

use vibe_models::VisionAnalysis;

use crate::error::{VisionError, VisionResult};
use crate::metrics::record_query;
use crate::prompt::{RESPONSE_FORMAT, TRAFFIC_PROMPT};
use crate::scene::SceneVector;
use crate::types::{QueryRequest, QueryResponse};

/// Header carrying the API key.
pub const AUTH_HEADER: &str = "X-Moondream-Auth";

/// Configuration for the vision client.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Base URL of the vision service
    pub base_url: String,
    /// API key sent in `X-Moondream-Auth`
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Confidence reported for every accepted answer
    pub confidence: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.moondream.ai/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            confidence: 0.85,
        }
    }
}

impl VisionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("VISION_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("VISION_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(
                std::env::var("VISION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.timeout.as_secs()),
            ),
            confidence: std::env::var("VISION_CONFIDENCE")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|c| (0.0..=1.0).contains(c))
                .unwrap_or(defaults.confidence),
        }
    }
}

/// Client for the vision query endpoint.
#[derive(Clone)]
pub struct VisionClient {
    http: Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("vibe-vision/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionConfig::from_env())
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Classify one frame.
    ///
    /// The answer must pass [`SceneVector::parse`]; there is no partial
    /// acceptance and no retry.
    pub async fn classify(&self, image: &[u8], content_type: &str) -> VisionResult<VisionAnalysis> {
        let span = info_span!("vision_query", image_bytes = image.len(), content_type = %content_type);
        let start = Instant::now();

        let result = async {
            let answer = self.query(image, content_type).await?;
            let scene = SceneVector::parse(&answer).map_err(|e| {
                warn!(answer = %answer, "Vision answer rejected: {}", e);
                e
            })?;

            Ok::<_, VisionError>(VisionAnalysis {
                raw_values: scene.values().to_vec(),
                numerical_data: scene.to_features(),
                cloud_vision_data: scene.metrics(),
                ml_confidence: self.config.confidence,
                model_answer: Some(answer),
            })
        }
        .instrument(span)
        .await;

        let latency_ms = start.elapsed().as_millis() as f64;
        match &result {
            Ok(_) => record_query("ok", latency_ms),
            Err(e) => record_query(e.kind(), latency_ms),
        }
        result
    }

    /// Send the prompt with the image and return the raw answer text.
    pub async fn query(&self, image: &[u8], content_type: &str) -> VisionResult<String> {
        let api_key = self.config.api_key.as_deref().ok_or(VisionError::MissingApiKey)?;
        let url = format!("{}/query", self.config.base_url.trim_end_matches('/'));

        let request = QueryRequest {
            image: format!("data:{};base64,{}", content_type, BASE64.encode(image)),
            question: TRAFFIC_PROMPT.to_string(),
            response_format: RESPONSE_FORMAT.to_string(),
        };

        debug!("Sending vision query to {}", url);

        let response = self
            .http
            .post(&url)
            .header(AUTH_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::api(status.as_u16(), body));
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        let parsed: QueryResponse = serde_json::from_str(&body).map_err(|e| {
            VisionError::invalid_response(format!(
                "{} (body prefix: {})",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })?;

        Ok(parsed.answer)
    }

    fn map_transport(&self, e: reqwest::Error) -> VisionError {
        if e.is_timeout() {
            VisionError::Timeout(self.config.timeout.as_secs())
        } else {
            VisionError::Network(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = "[2,0,1,3,2,1,0,2,3,1,2,0,1,2,3,0,1,2,1,3,2,0,1,2,3]";

    fn config_for(server: &MockServer) -> VisionConfig {
        VisionConfig {
            base_url: server.uri(),
            api_key: Some("test-key".to_string()),
            timeout: Duration::from_secs(2),
            confidence: 0.85,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = VisionConfig::default();
        assert_eq!(config.base_url, "https://api.moondream.ai/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.confidence, 0.85);
    }

    #[test]
    #[serial]
    fn test_config_from_env_ignores_bad_confidence() {
        std::env::set_var("VISION_CONFIDENCE", "1.7");
        std::env::set_var("VISION_API_KEY", "  ");
        let config = VisionConfig::from_env();
        assert_eq!(config.confidence, 0.85);
        assert!(config.api_key.is_none());
        std::env::remove_var("VISION_CONFIDENCE");
        std::env::remove_var("VISION_API_KEY");
    }

    #[tokio::test]
    async fn test_classify_valid_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header(AUTH_HEADER, "test-key"))
            .and(body_partial_json(json!({"response_format": "text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": SAMPLE})))
            .expect(1)
            .mount(&server)
            .await;

        let client = VisionClient::new(config_for(&server)).unwrap();
        let analysis = client.classify(&[0xff, 0xd8, 0xff], "image/jpeg").await.unwrap();

        assert_eq!(analysis.raw_values.len(), 25);
        assert_eq!(analysis.numerical_data.values().len(), 17);
        assert_eq!(analysis.ml_confidence, 0.85);
        assert_eq!(analysis.model_answer.as_deref(), Some(SAMPLE));

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["image"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
        assert_eq!(body["question"], TRAFFIC_PROMPT);
    }

    #[tokio::test]
    async fn test_classify_rejects_short_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "[1,2,3]"})))
            .mount(&server)
            .await;

        let client = VisionClient::new(config_for(&server)).unwrap();
        let err = client.classify(b"img", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, VisionError::Parse(_)));
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = VisionClient::new(config_for(&server)).unwrap();
        let err = client.query(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, VisionError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.api_key = None;

        let client = VisionClient::new(config).unwrap();
        assert!(matches!(
            client.classify(b"img", "image/jpeg").await,
            Err(VisionError::MissingApiKey)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": SAMPLE}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.timeout = Duration::from_millis(200);
        let client = VisionClient::new(config).unwrap();
        let err = client.query(b"img", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, VisionError::Timeout(_)));
        assert!(!err.is_rejection());
    }
}
