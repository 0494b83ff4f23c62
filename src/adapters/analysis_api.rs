//! HTTP client for the call analysis service.
//!
//! Endpoints (relative to the configured base URL):
//! - GET  /api/v1/analysis/{call_id}  status record
//! - POST /api/v1/analysis/analyze    queue a text transcript
//! - POST /api/v1/analysis/upload     upload call audio (multipart)

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{FetchError, StatusSource};
use crate::config::ApiSettings;
use crate::domain::{CallId, CallStatusResponse};

/// Agent id the dashboard used when none was chosen
pub const DEFAULT_AGENT_ID: &str = "agent_007";

const ANALYSIS_PATH: &str = "api/v1/analysis";

/// Analysis service client
#[derive(Debug, Clone)]
pub struct AnalysisApiClient {
    /// Service root, without trailing slash
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Body of `POST /analyze`
#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    call_id: Option<&'a str>,
    transcript: &'a str,
}

/// Acknowledgement returned by analyze and upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    pub call_id: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisApiClient {
    /// Create a client with reqwest's default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    /// Create from config, applying the per-request timeout
    pub fn from_settings(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(settings.base_url.clone(), client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an analysis API URL; `tail` is a single percent-encoded segment
    fn api_url(&self, tail: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid analysis service URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| {
                anyhow::anyhow!("Analysis service URL cannot take a path: {}", self.base_url)
            })?
            .pop_if_empty()
            .extend(ANALYSIS_PATH.split('/').chain(std::iter::once(tail)));
        Ok(url)
    }

    /// URL of one call's status record
    pub fn status_url(&self, call_id: &CallId) -> Result<Url> {
        self.api_url(call_id.as_str())
    }

    /// Queue a text transcript for analysis
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn submit_transcript(
        &self,
        transcript: &str,
        call_id: Option<&str>,
    ) -> Result<SubmitResponse> {
        if transcript.trim().is_empty() {
            anyhow::bail!("Transcript is empty");
        }

        let response = self
            .client
            .post(self.api_url("analyze")?)
            .json(&AnalyzeRequest {
                call_id,
                transcript,
            })
            .send()
            .await
            .context("Failed to submit transcript")?;

        parse_submit_response(response).await
    }

    /// Upload a call recording for transcription and analysis
    #[instrument(skip(self), fields(path = %audio_path.display()))]
    pub async fn upload_audio(&self, audio_path: &Path, agent_id: &str) -> Result<SubmitResponse> {
        let file_name = audio_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let file_bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file: {}", audio_path.display()))?;

        debug!(bytes = file_bytes.len(), "Uploading audio");

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name.clone())
            .mime_str(audio_mime(&file_name))?;

        let form = Form::new()
            .part("file", file_part)
            .text("agent_id", agent_id.to_string());

        let response = self
            .client
            .post(self.api_url("upload")?)
            .multipart(form)
            .send()
            .await
            .context("Failed to upload audio")?;

        parse_submit_response(response).await
    }
}

async fn parse_submit_response(response: reqwest::Response) -> Result<SubmitResponse> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Analysis service error ({}): {}", status, text);
    }

    response
        .json()
        .await
        .context("Failed to parse analysis service response")
}

/// Content type for an audio upload, by extension
fn audio_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl StatusSource for AnalysisApiClient {
    fn name(&self) -> &str {
        "analysis-api"
    }

    async fn fetch_status(&self, call_id: &CallId) -> Result<CallStatusResponse, FetchError> {
        let url = self
            .status_url(call_id)
            .map_err(|e| FetchError::Transport(format!("{:#}", e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url() {
        let client = AnalysisApiClient::new("http://localhost:8000/");
        let call_id = CallId::parse("call_1a2b3c4d").unwrap();
        assert_eq!(
            client.status_url(&call_id).unwrap().as_str(),
            "http://localhost:8000/api/v1/analysis/call_1a2b3c4d"
        );
        assert_eq!(
            client.api_url("upload").unwrap().as_str(),
            "http://localhost:8000/api/v1/analysis/upload"
        );
    }

    #[test]
    fn test_status_url_escapes_call_id() {
        let client = AnalysisApiClient::new("http://localhost:8000");
        let call_id = CallId::parse("call_other#frag?x=1/y").unwrap();
        let url = client.status_url(&call_id).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/analysis/call_other%23frag%3Fx=1%2Fy"
        );
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_status_url_keeps_base_path() {
        let client = AnalysisApiClient::new("https://qa.example.com/backend/");
        let call_id = CallId::parse("call_1").unwrap();
        assert_eq!(
            client.status_url(&call_id).unwrap().as_str(),
            "https://qa.example.com/backend/api/v1/analysis/call_1"
        );
    }

    #[test]
    fn test_invalid_base_url_is_reported() {
        let client = AnalysisApiClient::new("not a url");
        let call_id = CallId::parse("call_1").unwrap();
        assert!(client.status_url(&call_id).is_err());
    }

    #[test]
    fn test_audio_mime() {
        assert_eq!(audio_mime("call.WAV"), "audio/wav");
        assert_eq!(audio_mime("memo.m4a"), "audio/mp4");
        assert_eq!(audio_mime("noext"), "application/octet-stream");
    }

    #[test]
    fn test_analyze_request_omits_missing_call_id() {
        let body = serde_json::to_value(AnalyzeRequest {
            call_id: None,
            transcript: "hi",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"transcript": "hi"}));
    }

    #[tokio::test]
    async fn test_empty_transcript_rejected_before_sending() {
        let client = AnalysisApiClient::new("http://127.0.0.1:9");
        let err = client.submit_transcript("   ", None).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
