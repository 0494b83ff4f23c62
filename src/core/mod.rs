//! Core resolution logic.
//!
//! This module contains:
//! - Policy: per-call-site polling budgets
//! - Fallback: demo data for calls the backend does not know
//! - Resolver: the poll-until-settled loop and its cancellable handle

pub mod fallback;
pub mod policy;
pub mod resolver;

// Re-export commonly used types
pub use fallback::{DemoCatalog, DemoEntry, DemoFallback, NoDemoData};
pub use policy::{PollPolicy, PollProfile};
pub use resolver::{AnalysisStatusResolver, ResolutionHandle, GENERIC_FAILURE_MESSAGE};
