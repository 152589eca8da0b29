//! Vision client adapter for the classifier port.

use async_trait::async_trait;

use vibe_models::VisionAnalysis;
use vibe_vision::{VisionClient, VisionError};

use crate::error::{PipelineError, RunResult};
use crate::ports::{CameraImage, SceneClassifier};

/// Classifies frames through the vision service.
#[derive(Clone)]
pub struct VisionSceneClassifier {
    client: VisionClient,
}

impl VisionSceneClassifier {
    pub fn new(client: VisionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SceneClassifier for VisionSceneClassifier {
    async fn classify(&self, image: &CameraImage) -> RunResult<VisionAnalysis> {
        self.client
            .classify(&image.bytes, &image.content_type)
            .await
            .map_err(classification_error)
    }

    fn is_enabled(&self) -> bool {
        self.client.config().api_key.is_some()
    }
}

/// Split vision failures into rejected answers and transport faults.
pub fn classification_error(e: VisionError) -> PipelineError {
    if e.is_rejection() {
        PipelineError::classification_rejected(e.to_string())
    } else {
        PipelineError::classification_failed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vibe_vision::{SceneParseError, VisionConfig};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_error_mapping() {
        let rejected = classification_error(VisionError::from(SceneParseError::WrongCount {
            expected: 25,
            actual: 24,
        }));
        assert!(rejected.processing_message().starts_with("Vision API error:"));

        let failed = classification_error(VisionError::Timeout(30));
        assert_eq!(
            failed.processing_message(),
            "Vision processing failed: Timeout after 30 seconds"
        );
    }

    #[tokio::test]
    async fn test_non_numeric_answer_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"answer": "[2,0,1,three,2,1,0,2,3,1,2,0,1,2,3,0,1,2,1,3,2,0,1,2,3]"})),
            )
            .mount(&server)
            .await;

        let client = VisionClient::new(VisionConfig {
            base_url: server.uri(),
            api_key: Some("k".to_string()),
            timeout: Duration::from_secs(2),
            confidence: 0.85,
        })
        .unwrap();
        let classifier = VisionSceneClassifier::new(client);
        assert!(classifier.is_enabled());

        let err = classifier
            .classify(&CameraImage::new(vec![1, 2, 3], "image/jpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Classification { rejected: true, .. }));
    }
}
