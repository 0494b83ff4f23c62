//! Resolution outcomes and progress updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::call::AnalysisReport;

/// Terminal result of resolving one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ResolutionOutcome {
    /// The backend finished the analysis
    Resolved { report: AnalysisReport },

    /// The backend failed the job, or the call never appeared
    Failed { reason: FailureReason },

    /// The attempt budget ran out while the job was still pending
    TimedOut {
        attempts: u32,
        /// Last transport error seen, if the budget was spent on errors
        last_error: Option<String>,
    },

    /// The call was unknown to the backend but demo data exists for it
    DemoFallback { report: AnalysisReport },
}

impl ResolutionOutcome {
    /// The report to render, for `Resolved` and `DemoFallback`
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Resolved { report } | Self::DemoFallback { report } => Some(report),
            Self::Failed { .. } | Self::TimedOut { .. } => None,
        }
    }

    /// True for the outcomes that should show an error panel
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TimedOut { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolved { .. } => "resolved",
            Self::Failed { .. } => "failed",
            Self::TimedOut { .. } => "timed_out",
            Self::DemoFallback { .. } => "demo_fallback",
        }
    }
}

/// Why a resolution ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureReason {
    /// The backend marked the job failed; the text is surfaced verbatim
    BackendReported { message: String },

    /// Every attempt in the not-found budget returned 404
    NotFound { attempts: u32 },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendReported { message } => write!(f, "{}", message),
            Self::NotFound { attempts } => {
                write!(f, "call not found or unavailable after {} attempts", attempts)
            }
        }
    }
}

/// One item of a resolution's update stream
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionUpdate {
    /// About to issue request number `attempt` (1-based); still waiting
    Polling { attempt: u32 },

    /// The single terminal outcome; nothing follows it
    Settled(ResolutionOutcome),
}

impl ResolutionUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_accessor() {
        let report = AnalysisReport::new(json!({"qa_score": {}}), String::new());
        let outcome = ResolutionOutcome::DemoFallback {
            report: report.clone(),
        };
        assert_eq!(outcome.report(), Some(&report));
        assert!(!outcome.is_error());

        let timed_out = ResolutionOutcome::TimedOut {
            attempts: 20,
            last_error: None,
        };
        assert!(timed_out.report().is_none());
        assert!(timed_out.is_error());
        assert_eq!(timed_out.label(), "timed_out");
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::BackendReported {
            message: "transcription error".to_string(),
        };
        assert_eq!(reason.to_string(), "transcription error");
        assert_eq!(
            FailureReason::NotFound { attempts: 5 }.to_string(),
            "call not found or unavailable after 5 attempts"
        );
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = ResolutionOutcome::Failed {
            reason: FailureReason::NotFound { attempts: 5 },
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["reason"]["kind"], "not_found");
    }
}
