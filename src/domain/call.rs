//! Call identifiers and the analysis-status record returned by the backend.
//!
//! The backend stores one record per call and fills it in as the
//! transcription and agent pipeline progress. Every field on the wire is
//! optional; `CallStatusResponse::normalize` is the single place where the
//! loose record becomes a typed `CallAnalysisStatus`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, non-empty call identifier (e.g. `call_3f9a1c2e`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Parse a call id, trimming whitespace. Returns `None` for empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Job state reported by the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Processing,
    Completed,
    Failed,

    /// Anything the service sends that we do not recognise
    #[serde(other)]
    Unknown,
}

/// Raw status record, as served by `GET /api/v1/analysis/{call_id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallStatusResponse {
    #[serde(default)]
    pub status: Option<AnalysisState>,

    /// Agent pipeline output, only meaningful once completed
    #[serde(default)]
    pub analysis: Option<serde_json::Value>,

    #[serde(default)]
    pub transcript: Option<String>,

    /// Backend diagnostic text for failed jobs
    #[serde(default)]
    pub error: Option<String>,

    /// Indexed scores the backend stores next to the analysis
    #[serde(default)]
    pub scores: Option<CallScores>,
}

/// Score index stored on the call record (0-100 each)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallScores {
    pub qa: f64,
    pub sop: f64,
    pub sentiment: f64,
    pub risk: f64,
}

impl CallStatusResponse {
    pub fn processing() -> Self {
        Self {
            status: Some(AnalysisState::Processing),
            ..Default::default()
        }
    }

    pub fn completed(analysis: serde_json::Value, transcript: Option<&str>) -> Self {
        Self {
            status: Some(AnalysisState::Completed),
            analysis: Some(analysis),
            transcript: transcript.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn failed(error: Option<&str>) -> Self {
        Self {
            status: Some(AnalysisState::Failed),
            error: error.map(str::to_string),
            ..Default::default()
        }
    }

    /// Collapse the wire record into the three states the resolver acts on.
    ///
    /// `completed` without an analysis payload is still in flight as far as
    /// the client is concerned, so it normalizes to `Processing`.
    pub fn normalize(self) -> CallAnalysisStatus {
        match self.status {
            Some(AnalysisState::Completed) => match self.analysis {
                Some(analysis) if !analysis.is_null() => CallAnalysisStatus::Completed(
                    AnalysisReport::new(analysis, self.transcript.unwrap_or_default()),
                ),
                _ => CallAnalysisStatus::Processing,
            },
            Some(AnalysisState::Failed) => CallAnalysisStatus::Failed { error: self.error },
            Some(AnalysisState::Processing) | Some(AnalysisState::Unknown) | None => {
                CallAnalysisStatus::Processing
            }
        }
    }
}

/// Normalized status of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum CallAnalysisStatus {
    Processing,
    Completed(AnalysisReport),
    Failed { error: Option<String> },
}

/// A finished analysis, ready to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Opaque agent pipeline output (sentiment, compliance, risk, coaching)
    pub analysis: serde_json::Value,

    /// Full call transcript, empty when the backend sent none
    pub transcript: String,

    /// Headline scores read from `analysis.summary_metrics`
    pub summary: SummaryMetrics,

    /// When this client received the report
    pub received_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(analysis: serde_json::Value, transcript: String) -> Self {
        let summary = SummaryMetrics::from_analysis(&analysis);
        Self {
            analysis,
            transcript,
            summary,
            received_at: Utc::now(),
        }
    }
}

/// Headline metrics of a call analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryMetrics {
    pub qa_score: f64,
    pub sop_score: f64,
    pub sentiment_score: f64,
    pub risk_detected: bool,
}

impl SummaryMetrics {
    /// Read `summary_metrics` from an analysis payload.
    ///
    /// Missing or mistyped fields fall back to zero / false individually.
    pub fn from_analysis(analysis: &serde_json::Value) -> Self {
        let Some(metrics) = analysis.get("summary_metrics") else {
            return Self::default();
        };

        let number = |key: &str| metrics.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);

        Self {
            qa_score: number("qa_score"),
            sop_score: number("sop_score"),
            sentiment_score: number("sentiment_score"),
            risk_detected: metrics
                .get("risk_detected")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}
