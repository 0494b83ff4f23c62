//! Demo data for calls the backend does not know about.
//!
//! When the analysis service answers 404, the resolver asks a `DemoFallback`
//! for canned data. A hit ends the resolution with `DemoFallback`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisReport, CallId};

/// Pure lookup of canned analysis data by call id
pub trait DemoFallback: Send + Sync {
    fn lookup(&self, call_id: &CallId) -> Option<AnalysisReport>;
}

/// No demo data; 404s always go through the not-found budget
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDemoData;

impl DemoFallback for NoDemoData {
    fn lookup(&self, _call_id: &CallId) -> Option<AnalysisReport> {
        None
    }
}

impl<F> DemoFallback for F
where
    F: Fn(&CallId) -> Option<AnalysisReport> + Send + Sync,
{
    fn lookup(&self, call_id: &CallId) -> Option<AnalysisReport> {
        self(call_id)
    }
}

/// One canned call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoEntry {
    pub analysis: serde_json::Value,
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Demo calls keyed by call id, usually loaded from a file
///
/// File format (YAML or JSON):
/// ```yaml
/// call_demo_001:
///   transcript: "Agent: Thank you for calling..."
///   analysis:
///     summary_metrics: { qa_score: 88, sop_score: 92, sentiment_score: 74 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemoCatalog {
    entries: HashMap<String, DemoEntry>,
}

impl DemoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read demo data: {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
                .with_context(|| format!("Failed to parse demo data: {}", path.display()))
        } else {
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse demo data: {}", path.display()))
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid demo YAML")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid demo JSON")
    }

    pub fn insert(&mut self, call_id: impl Into<String>, entry: DemoEntry) {
        self.entries.insert(call_id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DemoFallback for DemoCatalog {
    fn lookup(&self, call_id: &CallId) -> Option<AnalysisReport> {
        self.entries.get(call_id.as_str()).map(|entry| {
            AnalysisReport::new(
                entry.analysis.clone(),
                entry.transcript.clone().unwrap_or_default(),
            )
        })
    }
}
