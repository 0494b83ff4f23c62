//! callqa - Call QA analysis client
//!
//! Turns the call analysis service's eventually-consistent jobs (audio
//! transcription followed by the agent pipeline) into a single settled
//! outcome per call.
//!
//! # Architecture
//!
//! A resolution polls the status endpoint with a fixed interval:
//! - Completed and failed jobs settle immediately
//! - Pending jobs and transport errors draw from one attempt budget
//! - 404s draw from a smaller budget, or settle on demo data when available
//! - Cancellation stops the loop and suppresses any further update
//!
//! # Modules
//!
//! - `adapters`: External system integrations (analysis service HTTP API)
//! - `core`: Resolution logic (Resolver, PollPolicy, DemoFallback)
//! - `domain`: Data structures (CallId, status records, outcomes)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Wait for a call's analysis
//! callqa watch call_3f9a1c2e
//!
//! # Upload a recording and wait with the long budget
//! callqa upload recording.wav
//!
//! # Analyze a transcript from stdin
//! cat transcript.txt | callqa analyze
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{AnalysisApiClient, FetchError, StatusSource};
pub use crate::core::{
    AnalysisStatusResolver, DemoCatalog, DemoFallback, PollPolicy, PollProfile, ResolutionHandle,
};
pub use domain::{
    AnalysisReport, CallId, CallStatusResponse, FailureReason, ResolutionOutcome, ResolutionUpdate,
};
