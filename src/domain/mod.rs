//! Domain types for callqa.
//!
//! - Call: identifiers, the backend status record and its normalized form
//! - Outcome: terminal resolution results and progress updates

pub mod call;
pub mod outcome;

// Re-export commonly used types
pub use call::{
    AnalysisReport, AnalysisState, CallAnalysisStatus, CallId, CallScores, CallStatusResponse,
    SummaryMetrics,
};
pub use outcome::{FailureReason, ResolutionOutcome, ResolutionUpdate};
