//! OCR Providers
//!
//! Defines the recognizer trait and the Yandex Cloud Vision implementation.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;
use image::DynamicImage;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::transport::{HttpTransport, RateLimitedTransport, TransportResponse};
use super::types::{RecognizeRequest, RecognizeResponse, TextAnnotation, IMAGE_MIME_TYPE};
use crate::config::VisionOcrOptions;
use crate::error::{OcrError, Result};

/// Recognizes text in a region image
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> Result<TextAnnotation>;
}

/// Yandex Cloud Vision `recognizeText` client
pub struct VisionRecognizer<T = RateLimitedTransport> {
    transport: T,
    endpoint: String,
    iam_token: String,
    folder_id: String,
    lang: Vec<String>,
    model: String,
    data_logging: bool,
}

impl VisionRecognizer {
    /// Recognizer over a rate limited reqwest transport
    pub fn from_options(options: &VisionOcrOptions) -> Result<Self> {
        let transport = RateLimitedTransport::from_options(options)?;
        Ok(Self::new(transport, options))
    }
}

impl<T: HttpTransport> VisionRecognizer<T> {
    pub fn new(transport: T, options: &VisionOcrOptions) -> Self {
        Self {
            transport,
            endpoint: options.endpoint.clone(),
            iam_token: options.iam_token.clone(),
            folder_id: options.folder_id.clone(),
            lang: options.lang.clone(),
            model: options.model.clone(),
            data_logging: options.data_logging,
        }
    }

    /// PNG encode then base64
    fn encode_image(image: &DynamicImage) -> Result<String> {
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(&buffer))
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", self.iam_token), "IAM token")?,
        );
        headers.insert(
            HeaderName::from_static("x-folder-id"),
            header_value(&self.folder_id, "folder id")?,
        );
        headers.insert(
            HeaderName::from_static("x-data-logging-enabled"),
            HeaderValue::from_static(if self.data_logging { "true" } else { "false" }),
        );
        headers.insert(
            HeaderName::from_static("model"),
            header_value(&self.model, "model")?,
        );
        Ok(headers)
    }

    fn build_body(&self, content: String) -> Result<serde_json::Value> {
        let request = RecognizeRequest {
            content,
            language_codes: self.lang.clone(),
            mime_type: IMAGE_MIME_TYPE,
        };
        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(response: TransportResponse) -> Result<TextAnnotation> {
        let reply = match serde_json::from_slice::<RecognizeResponse>(&response.body) {
            Ok(reply) => reply,
            Err(_) if !response.is_success() => {
                return Err(OcrError::HttpStatus {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                });
            }
            Err(e) => return Err(OcrError::InvalidJson(e)),
        };

        if let Some(error) = reply.error {
            return Err(OcrError::RemoteService(error.message));
        }

        if !response.is_success() {
            return Err(OcrError::HttpStatus {
                status: response.status,
                body: reply
                    .message
                    .unwrap_or_else(|| String::from_utf8_lossy(&response.body).into_owned()),
            });
        }

        match reply.result {
            Some(result) => Ok(result.text_annotation),
            None => Err(OcrError::MalformedResponse(
                reply
                    .message
                    .unwrap_or_else(|| "reply has neither result nor error".to_string()),
            )),
        }
    }
}

#[async_trait]
impl<T: HttpTransport> TextRecognizer for VisionRecognizer<T> {
    async fn recognize(&self, image: &DynamicImage) -> Result<TextAnnotation> {
        let content = Self::encode_image(image)?;
        let headers = self.build_headers()?;
        let body = self.build_body(content)?;

        let response = self.transport.post_json(&self.endpoint, headers, &body).await?;
        let annotation = Self::parse_response(response)?;

        tracing::debug!(
            blocks = annotation.blocks.len(),
            width = image.width(),
            height = image.height(),
            "Vision OCR recognized region"
        );

        Ok(annotation)
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| OcrError::Config(format!("{} is not a valid header value", what)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ocr::transport::MockTransport;

    fn options() -> VisionOcrOptions {
        VisionOcrOptions::new("t0k3n", "b1gfolder").with_lang(["ru", "en"])
    }

    fn region_image() -> DynamicImage {
        DynamicImage::new_rgb8(30, 15)
    }

    #[tokio::test]
    async fn test_request_wire_format() {
        let transport = Arc::new(MockTransport::ok(MockTransport::EMPTY_RESULT));
        let recognizer = VisionRecognizer::new(transport.clone(), &options());

        recognizer.recognize(&region_image()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];

        assert_eq!(request.url, crate::config::DEFAULT_ENDPOINT);
        assert_eq!(request.headers["content-type"], "application/json");
        assert_eq!(request.headers["authorization"], "Bearer t0k3n");
        assert_eq!(request.headers["x-folder-id"], "b1gfolder");
        assert_eq!(request.headers["x-data-logging-enabled"], "true");
        assert_eq!(request.headers["model"], "page");

        assert_eq!(request.body["mimeType:"], "image/png");
        assert_eq!(request.body["languageCodes"], serde_json::json!(["ru", "en"]));

        let content = request.body["content"].as_str().unwrap();
        let png = base64::engine::general_purpose::STANDARD.decode(content).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 15));
    }

    #[tokio::test]
    async fn test_service_error_is_fatal() {
        let transport = MockTransport::new(vec![(401, r#"{"error": {"message": "Unauthenticated"}}"#)]);
        let recognizer = VisionRecognizer::new(transport, &options());

        let err = recognizer.recognize(&region_image()).await.unwrap_err();
        match err {
            OcrError::RemoteService(message) => assert_eq!(message, "Unauthenticated"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_payload_with_ok_status() {
        let transport = MockTransport::ok(r#"{"error": {"message": "quota exceeded"}}"#);
        let recognizer = VisionRecognizer::new(transport, &options());

        let err = recognizer.recognize(&region_image()).await.unwrap_err();
        assert!(matches!(err, OcrError::RemoteService(ref m) if m == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_non_json_error_status() {
        let transport = MockTransport::new(vec![(502, "<html>Bad Gateway</html>")]);
        let recognizer = VisionRecognizer::new(transport, &options());

        let err = recognizer.recognize(&region_image()).await.unwrap_err();
        assert!(matches!(err, OcrError::HttpStatus { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_gateway_message_on_error_status() {
        let transport = MockTransport::new(vec![(400, r#"{"code": 3, "message": "bad image"}"#)]);
        let recognizer = VisionRecognizer::new(transport, &options());

        let err = recognizer.recognize(&region_image()).await.unwrap_err();
        assert!(matches!(err, OcrError::HttpStatus { status: 400, ref body } if body == "bad image"));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let transport = MockTransport::ok("not json");
        let recognizer = VisionRecognizer::new(transport, &options());

        let err = recognizer.recognize(&region_image()).await.unwrap_err();
        assert!(matches!(err, OcrError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_reply_without_result() {
        let transport = MockTransport::ok("{}");
        let recognizer = VisionRecognizer::new(transport, &options());

        let err = recognizer.recognize(&region_image()).await.unwrap_err();
        assert!(matches!(err, OcrError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_token_header() {
        let options = VisionOcrOptions::new("bad\ntoken", "folder");
        let recognizer = VisionRecognizer::new(MockTransport::new(vec![]), &options);
        assert!(matches!(recognizer.build_headers(), Err(OcrError::Config(_))));
    }

    #[test]
    fn test_data_logging_disabled_header() {
        let mut options = options();
        options.data_logging = false;
        let recognizer = VisionRecognizer::new(MockTransport::new(vec![]), &options);
        let headers = recognizer.build_headers().unwrap();
        assert_eq!(headers["x-data-logging-enabled"], "false");
    }
}
