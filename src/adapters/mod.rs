//! Adapter interfaces for external systems.
//!
//! The resolver talks to the analysis service through `StatusSource`, so the
//! HTTP client can be swapped for a scripted source in tests.

pub mod analysis_api;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CallId, CallStatusResponse};

// Re-export the HTTP adapter
pub use analysis_api::{AnalysisApiClient, SubmitResponse, DEFAULT_AGENT_ID};

/// Why a single status fetch did not produce a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The service has no record for this call (HTTP 404)
    #[error("call not found")]
    NotFound,

    /// Any other non-success HTTP status
    #[error("analysis service returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Connect, timeout or other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not a status record
    #[error("invalid status payload: {0}")]
    Decode(String),
}

/// Source of analysis-status records
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch the current status record for one call, once
    async fn fetch_status(&self, call_id: &CallId) -> Result<CallStatusResponse, FetchError>;
}
