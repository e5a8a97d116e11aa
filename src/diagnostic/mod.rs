pub mod messages;

use crate::error::DiagnosticError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use messages::{DiagnosticResult, HealthStatus, ProcessResponse};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, error};

const DEFAULT_DIAGNOSTIC_HOST: &str = "http://localhost:8080";
const DEFAULT_JPEG_QUALITY: u8 = 92;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the remote plant diagnostic service.
#[derive(Debug, Clone)]
pub struct DiagnosticClient {
    client: reqwest::Client,
    host: String,
    jpeg_quality: u8,
}

impl DiagnosticClient {
    pub fn new(host: String) -> Result<Self, DiagnosticError> {
        Self::with_timeout(host, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(host: String, timeout: Duration) -> Result<Self, DiagnosticError> {
        if host.is_empty() {
            return Err(DiagnosticError::Config("host must not be empty".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        })
    }

    pub fn localhost() -> Result<Self, DiagnosticError> {
        Self::new(DEFAULT_DIAGNOSTIC_HOST.to_string())
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>, DiagnosticError> {
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
        // JPEG has no alpha channel.
        image.to_rgb8().write_with_encoder(encoder)?;
        Ok(bytes)
    }

    /// Upload the photo and predicted species, returning the whole envelope.
    pub async fn process_image(
        &self,
        image: &DynamicImage,
        species_name: &str,
    ) -> Result<ProcessResponse, DiagnosticError> {
        debug!("Encoding {}x{} image as JPEG", image.width(), image.height());
        let jpeg = self.encode_jpeg(image)?;
        debug!("Encoded {} bytes", jpeg.len());

        debug!("Creating multipart form");
        let image_part = Part::bytes(jpeg)
            .file_name("upload.jpg")
            .mime_str("image/jpeg")?;
        let species_part = Part::text(species_name.to_string()).mime_str("text/plain")?;
        let form = Form::new()
            .part("image", image_part)
            .part("species_name", species_part);

        let url = format!("{}/process-image", self.host);
        debug!("Sending request to: {}", url);
        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status();
        debug!("Response status: {}", status);

        let response_text = response.text().await?;
        debug!("Response body: {}", response_text);

        if !status.is_success() {
            error!("Request failed: {}", response_text);
            return Err(DiagnosticError::Server {
                status_code: status.as_u16(),
                message: response_text,
            });
        }

        Ok(serde_json::from_str(&response_text)?)
    }

    /// Upload the photo and predicted species, returning the diagnostic.
    ///
    /// A response without a diagnostic object yields an empty
    /// [`DiagnosticResult`], which renders the generic fallback text.
    pub async fn diagnose(
        &self,
        image: &DynamicImage,
        species_name: &str,
    ) -> Result<DiagnosticResult, DiagnosticError> {
        let response = self.process_image(image, species_name).await?;
        Ok(response
            .data
            .and_then(|data| data.diagnostic)
            .unwrap_or_default())
    }

    /// Probe the service's health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, DiagnosticError> {
        let url = format!("{}/health", self.host);
        debug!("Checking health at: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(DiagnosticError::Server {
                status_code: status.as_u16(),
                message: response_text,
            });
        }

        Ok(serde_json::from_str(&response_text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tracing_test::traced_test;

    fn create_test_image() -> DynamicImage {
        DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            64,
            48,
            image::Rgba([30, 140, 50, 255]),
        ))
    }

    #[test]
    #[traced_test]
    fn test_client_creation() {
        let client = DiagnosticClient::new("http://custom.host/".to_string()).unwrap();
        assert_eq!(client.host(), "http://custom.host");
        assert_eq!(client.jpeg_quality, DEFAULT_JPEG_QUALITY);

        let client = client.with_jpeg_quality(0);
        assert_eq!(client.jpeg_quality, 1);

        assert!(matches!(
            DiagnosticClient::new(String::new()),
            Err(DiagnosticError::Config(_))
        ));
    }

    #[test]
    fn test_jpeg_encoding() {
        let client = DiagnosticClient::localhost().unwrap();
        let bytes = client.encode_jpeg(&create_test_image()).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_successful_diagnose() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/process-image")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data.*".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="image"; filename="upload.jpg""#.to_string()),
                Matcher::Regex(r#"name="species_name""#.to_string()),
                Matcher::Regex("Monstera deliciosa".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"success","message":"ok","data":{"species_name":"Monstera deliciosa",
                "diagnostic":{"validated_species":"Monstera deliciosa","visible_symptoms":[],
                "likely_causes":["low humidity"],"care_recommendations":"Mist weekly.",
                "urgency_level":"low"}}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = DiagnosticClient::new(server.url()).unwrap();
        let result = client
            .diagnose(&create_test_image(), "Monstera deliciosa")
            .await
            .unwrap();

        assert_eq!(result.validated_species.as_deref(), Some("Monstera deliciosa"));
        assert_eq!(result.care_tips(), "Mist weekly.");
        assert!(result.symptoms().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_diagnostic_defaults() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/process-image")
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"species_name":"Rose"}}"#)
            .create_async()
            .await;

        let client = DiagnosticClient::new(server.url()).unwrap();
        let result = client.diagnose(&create_test_image(), "Rose").await.unwrap();

        assert_eq!(result, DiagnosticResult::default());
        assert_eq!(result.care_tips(), messages::NO_TIPS_MESSAGE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embedded_error_is_not_transport_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/process-image")
            .with_status(200)
            .with_body(
                r#"{"status":"success","data":{"diagnostic":{"error":"Invalid JSON returned by model","raw_output":"oops"}}}"#,
            )
            .create_async()
            .await;

        let client = DiagnosticClient::new(server.url()).unwrap();
        let result = client.diagnose(&create_test_image(), "Rose").await.unwrap();

        assert_eq!(result.care_tips(), "Invalid JSON returned by model");
        assert_eq!(result.raw_output.as_deref(), Some("oops"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/process-image")
            .with_status(400)
            .with_body(r#"{"status":"error","message":"Missing species_name in form data"}"#)
            .create_async()
            .await;

        let client = DiagnosticClient::new(server.url()).unwrap();
        match client.diagnose(&create_test_image(), "Rose").await {
            Err(DiagnosticError::Server {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 400);
                assert!(message.contains("Missing species_name"));
            }
            other => panic!("Expected Server error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/process-image")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = DiagnosticClient::new(server.url()).unwrap();
        assert!(matches!(
            client.diagnose(&create_test_image(), "Rose").await,
            Err(DiagnosticError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let client = DiagnosticClient::with_timeout(
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(matches!(
            client.diagnose(&create_test_image(), "Rose").await,
            Err(DiagnosticError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"healthy","server":"Plant diagnostic server"}"#)
            .create_async()
            .await;

        let client = DiagnosticClient::new(server.url()).unwrap();
        let health = client.health().await.unwrap();

        assert!(health.is_healthy());
        assert_eq!(health.server.as_deref(), Some("Plant diagnostic server"));
        mock.assert_async().await;
    }
}
