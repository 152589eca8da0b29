//! Camera frame acquisition over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, RunResult};
use crate::ports::{CameraImage, ImageSource};

/// Fetches `GET {base}/api/cameras/{id}/image`.
///
/// One attempt per call; a slow or failing camera is reported, not retried.
#[derive(Clone)]
pub struct HttpImageSource {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpImageSource {
    pub fn new(base_url: &str, timeout: Duration) -> RunResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            PipelineError::config_error(format!("Invalid camera image base URL {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PipelineError::config_error(format!(
                "Camera image base URL cannot be a base: {}",
                base_url
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .user_agent(concat!("vibe-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> RunResult<Self> {
        Self::new(&config.camera_image_base_url, config.camera_image_timeout)
    }

    /// Image URL for a provider camera id.
    pub fn image_url(&self, external_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "cameras", external_id, "image"]);
        }
        url
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, external_id: &str) -> RunResult<CameraImage> {
        let url = self.image_url(external_id);
        debug!("Fetching camera image from {}", url);

        let response = self.http.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::image_fetch(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            } else {
                PipelineError::image_fetch(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(external_id, status = status.as_u16(), "Camera image request failed");
            return Err(PipelineError::image_fetch(format!(
                "camera service returned {}",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(PipelineError::image_fetch(format!(
                "unexpected content type '{}'",
                content_type
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::image_fetch(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            } else {
                PipelineError::image_fetch(format!("failed to read body: {}", e))
            }
        })?;
        if bytes.is_empty() {
            return Err(PipelineError::image_fetch("empty image body"));
        }

        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or(&content_type)
            .trim()
            .to_string();

        Ok(CameraImage::new(bytes.to_vec(), media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jpeg(len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[..3].copy_from_slice(&[0xff, 0xd8, 0xff]);
        bytes
    }

    #[test]
    fn test_image_url_segments() {
        let source = HttpImageSource::new("https://webcams.nyctmc.org/", Duration::from_secs(10)).unwrap();
        assert_eq!(
            source.image_url("nyc-uuid-1").as_str(),
            "https://webcams.nyctmc.org/api/cameras/nyc-uuid-1/image"
        );
        assert_eq!(
            source.image_url("a/b").as_str(),
            "https://webcams.nyctmc.org/api/cameras/a%2Fb/image"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpImageSource::new("not a url", Duration::from_secs(1)),
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cameras/nyc-uuid-1/image"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg; charset=binary")
                    .set_body_bytes(jpeg(8000)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpImageSource::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let image = source.fetch("nyc-uuid-1").await.unwrap();
        assert_eq!(image.size_bytes, 8000);
        assert_eq!(image.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_non_image_content_type_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>camera offline</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let source = HttpImageSource::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = source.fetch("nyc-uuid-1").await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageFetch { .. }));
        assert!(err.to_string().contains("text/html"));
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpImageSource::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = source.fetch("nyc-uuid-1").await.unwrap_err();
        assert_eq!(err.to_string(), "camera service returned 503");
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(jpeg(16))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let source = HttpImageSource::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let err = source.fetch("nyc-uuid-1").await.unwrap_err();
        assert!(err.processing_message().starts_with("Image fetch failed: timed out"));
    }
}
