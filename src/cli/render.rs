//! Terminal rendering of resolution outcomes.

use std::fmt::Write;

use crate::domain::{AnalysisReport, ResolutionOutcome};

const TRANSCRIPT_PREVIEW_CHARS: usize = 400;

/// Render a settled outcome: report view or error panel
pub fn render_outcome(call_id: &str, outcome: &ResolutionOutcome, full_json: bool) -> String {
    match outcome {
        ResolutionOutcome::Resolved { report } => render_report(call_id, report, false, full_json),
        ResolutionOutcome::DemoFallback { report } => {
            render_report(call_id, report, true, full_json)
        }
        ResolutionOutcome::Failed { reason } => {
            render_error(call_id, "Analysis failed", &reason.to_string())
        }
        ResolutionOutcome::TimedOut {
            attempts,
            last_error,
        } => {
            let mut detail = format!(
                "Still processing after {} attempts. Please retry later.",
                attempts
            );
            if let Some(error) = last_error {
                let _ = write!(detail, "\nLast error: {}", error);
            }
            render_error(call_id, "Analysis is taking too long", &detail)
        }
    }
}

fn render_report(call_id: &str, report: &AnalysisReport, demo: bool, full_json: bool) -> String {
    let mut out = String::new();

    let title = if demo {
        format!("Call {} (sample data)", call_id)
    } else {
        format!("Call {}", call_id)
    };
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.len()));

    let summary = &report.summary;
    let _ = writeln!(out, "{:<18} {:>6.1}", "QA score", summary.qa_score);
    let _ = writeln!(out, "{:<18} {:>6.1}", "SOP compliance", summary.sop_score);
    let _ = writeln!(out, "{:<18} {:>6.1}", "Sentiment", summary.sentiment_score);
    let _ = writeln!(
        out,
        "{:<18} {:>6}",
        "Risk detected",
        if summary.risk_detected { "YES" } else { "no" }
    );
    let _ = writeln!(
        out,
        "{:<18} {}",
        "Received",
        report.received_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if full_json {
        let pretty = serde_json::to_string_pretty(&report.analysis).unwrap_or_default();
        let _ = writeln!(out, "\nAnalysis:\n{}", pretty);
    }

    if report.transcript.is_empty() {
        let _ = writeln!(out, "\n(no transcript)");
    } else {
        let _ = writeln!(out, "\nTranscript:\n{}", preview(&report.transcript, full_json));
    }

    out
}

fn render_error(call_id: &str, headline: &str, detail: &str) -> String {
    let title = format!("Call {}: {}", call_id, headline);
    format!("{}\n{}\n{}\n", title, "-".repeat(title.len()), detail)
}

/// Truncate long transcripts unless the full payload was requested
fn preview(transcript: &str, full: bool) -> String {
    if full || transcript.chars().count() <= TRANSCRIPT_PREVIEW_CHARS {
        return transcript.to_string();
    }
    let head: String = transcript.chars().take(TRANSCRIPT_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureReason;
    use serde_json::json;

    fn report() -> AnalysisReport {
        AnalysisReport::new(
            json!({"summary_metrics": {"qa_score": 82.5, "risk_detected": true}}),
            "Agent: Hello".to_string(),
        )
    }

    #[test]
    fn test_render_resolved_report() {
        let out = render_outcome(
            "call_1",
            &ResolutionOutcome::Resolved { report: report() },
            false,
        );
        assert!(out.starts_with("Call call_1\n"));
        assert!(out.contains("82.5"));
        assert!(out.contains("YES"));
        assert!(out.contains("Agent: Hello"));
        assert!(!out.contains("sample data"));
        assert!(!out.contains("Analysis:"));
    }

    #[test]
    fn test_render_demo_is_labelled() {
        let out = render_outcome(
            "call_demo",
            &ResolutionOutcome::DemoFallback { report: report() },
            true,
        );
        assert!(out.contains("(sample data)"));
        assert!(out.contains("Analysis:"));
        assert!(out.contains("summary_metrics"));
    }

    #[test]
    fn test_render_error_panels() {
        let failed = render_outcome(
            "call_1",
            &ResolutionOutcome::Failed {
                reason: FailureReason::BackendReported {
                    message: "transcription error".to_string(),
                },
            },
            false,
        );
        assert!(failed.contains("Analysis failed"));
        assert!(failed.contains("transcription error"));

        let timed_out = render_outcome(
            "call_1",
            &ResolutionOutcome::TimedOut {
                attempts: 20,
                last_error: Some("transport error: connection refused".to_string()),
            },
            false,
        );
        assert!(timed_out.contains("taking too long"));
        assert!(timed_out.contains("20 attempts"));
        assert!(timed_out.contains("connection refused"));
    }

    #[test]
    fn test_transcript_preview_truncates() {
        let long = "x".repeat(TRANSCRIPT_PREVIEW_CHARS + 10);
        let short = preview(&long, false);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), TRANSCRIPT_PREVIEW_CHARS + 3);
        assert_eq!(preview(&long, true), long);
    }
}
