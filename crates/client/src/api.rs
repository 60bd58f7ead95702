//! REST client for the symbol-art conversion service.
//!
//! Wraps the two HTTP endpoints the service exposes (multipart
//! conversion, health probe) using [`reqwest`], and defines the
//! [`ConversionService`] seam the workflow is written against.

use std::future::Future;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use symbolart_core::image_info::{inspect_image, ImageInfo};
use symbolart_core::settings::GenerationSettings;
use symbolart_core::source::SourceImage;

use crate::config::ServiceConfig;

/// One outbound conversion: the source image plus a settings snapshot
/// taken at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: Arc<SourceImage>,
    pub settings: GenerationSettings,
}

/// A successful conversion: the image bytes and what the headers say
/// about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the service, if any.
    pub content_type: Option<String>,
    pub info: ImageInfo,
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

/// Errors from the conversion service layer.
///
/// The `Display` form of each variant is the single human-readable
/// message surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("Could not reach the conversion service: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("{message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Server-supplied `detail`, or a status-based fallback.
        message: String,
    },

    /// A 2xx response whose body is not a readable image.
    #[error("Conversion service returned an unreadable image: {reason}")]
    MalformedBody { reason: String },

    /// A 2xx response to a non-conversion call whose body is not the
    /// expected JSON.
    #[error("Conversion service returned an unexpected response: {reason}")]
    UnexpectedBody { reason: String },
}

/// Anything that can turn a [`ConversionRequest`] into image bytes.
///
/// [`ConversionApi`] is the HTTP implementation; tests substitute a
/// scripted one.
pub trait ConversionService: Send + Sync {
    fn convert(
        &self,
        request: &ConversionRequest,
    ) -> impl Future<Output = Result<ConvertedImage, ConversionError>> + Send;
}

impl<T: ConversionService> ConversionService for Arc<T> {
    fn convert(
        &self,
        request: &ConversionRequest,
    ) -> impl Future<Output = Result<ConvertedImage, ConversionError>> + Send {
        (**self).convert(request)
    }
}

/// Structured error payload. `detail` is usually a string but may be a
/// list of validation errors.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Extract the user-facing message from a non-2xx response body.
///
/// Uses `detail` verbatim when it is a string, compact JSON when it is
/// any other value, and `Server returned <status>` when the body is not
/// JSON or has no `detail`.
pub fn service_error_message(status: u16, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);

    match detail {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            format!("Server returned {status}")
        }
        Some(other) => other.to_string(),
    }
}

/// HTTP client for one conversion service deployment.
#[derive(Debug, Clone)]
pub struct ConversionApi {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl ConversionApi {
    /// Create a client from configuration, applying the optional
    /// transport timeout.
    pub fn new(config: ServiceConfig) -> Result<Self, ConversionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Submit one image for conversion.
    ///
    /// Sends `POST {process_path}` with multipart fields `file`, `quality`
    /// and `palette`. No authentication header is attached.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConvertedImage, ConversionError> {
        let source = &request.source;
        let file_part = Part::bytes(source.bytes().to_vec())
            .file_name(source.name().to_string())
            .mime_str(source.media_type())?;

        let form = Form::new()
            .part("file", file_part)
            .text("quality", request.settings.quality.as_str())
            .text("palette", request.settings.palette.as_str());

        tracing::info!(
            file_name = %source.name(),
            bytes = source.len(),
            quality = %request.settings.quality,
            palette = %request.settings.palette,
            "Sending image to conversion service",
        );

        let response = self
            .client
            .post(self.config.process_url())
            .multipart(form)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?.to_vec();
        let info = inspect_image(&bytes).map_err(|e| ConversionError::MalformedBody {
            reason: e.to_string(),
        })?;

        tracing::info!(
            bytes = bytes.len(),
            width = info.width,
            height = info.height,
            "Conversion service returned image",
        );

        Ok(ConvertedImage {
            bytes,
            content_type,
            info,
        })
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, ConversionError> {
        let response = self.client.get(self.config.health_url()).send().await?;
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ConversionError::UnexpectedBody {
            reason: e.to_string(),
        })
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, or a
    /// [`ConversionError::Service`] carrying the parsed message.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ConversionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = service_error_message(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), %message, "Conversion service returned an error");

        Err(ConversionError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

impl ConversionService for ConversionApi {
    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConvertedImage, ConversionError> {
        ConversionApi::convert(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_used_verbatim() {
        assert_eq!(
            service_error_message(500, br#"{"detail":"bad image"}"#),
            "bad image"
        );
    }

    #[test]
    fn detail_list_is_rendered_as_json() {
        let msg = service_error_message(422, br#"{"detail":[{"msg":"field required"}]}"#);
        assert!(msg.contains("field required"), "got: {msg}");
    }

    #[test]
    fn unparsable_body_falls_back_to_status() {
        assert_eq!(
            service_error_message(500, b"<html>Internal Server Error</html>"),
            "Server returned 500"
        );
    }

    #[test]
    fn missing_or_blank_detail_falls_back_to_status() {
        assert_eq!(service_error_message(502, br#"{"error":"x"}"#), "Server returned 502");
        assert_eq!(service_error_message(400, br#"{"detail":"  "}"#), "Server returned 400");
        assert_eq!(service_error_message(400, br#"{"detail":null}"#), "Server returned 400");
        assert_eq!(service_error_message(503, b""), "Server returned 503");
    }

    #[test]
    fn service_error_displays_only_message() {
        let err = ConversionError::Service {
            status: 500,
            message: "bad image".into(),
        };
        assert_eq!(err.to_string(), "bad image");
    }

    #[test]
    fn unexpected_body_does_not_mention_images() {
        let err = ConversionError::UnexpectedBody {
            reason: "expected value at line 1 column 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "Conversion service returned an unexpected response: expected value at line 1 column 1"
        );
    }
}
