//! Scripted status sources shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use callqa::core::PollPolicy;
use callqa::{CallId, CallStatusResponse, FetchError, StatusSource};
use serde_json::json;
use tokio::sync::{watch, Notify};

pub type Reply = Result<CallStatusResponse, FetchError>;

pub fn processing() -> Reply {
    Ok(CallStatusResponse::processing())
}

pub fn not_found() -> Reply {
    Err(FetchError::NotFound)
}

pub fn completed(analysis: serde_json::Value, transcript: &str) -> Reply {
    Ok(CallStatusResponse::completed(analysis, Some(transcript)))
}

pub fn sample_analysis() -> serde_json::Value {
    json!({
        "summary_metrics": {
            "qa_score": 86.0,
            "sop_score": 91.5,
            "sentiment_score": 72.0,
            "risk_detected": false
        },
        "sop_compliance": {"greeting": "pass", "verification": "fail"},
        "coaching": {"notes": ["Confirm the customer's account number earlier"]}
    })
}

pub fn policy(poll_interval_ms: u64, max_attempts: u32, not_found_retry_budget: u32) -> PollPolicy {
    PollPolicy {
        poll_interval_ms,
        max_attempts,
        not_found_retry_budget,
    }
}

/// Replays a fixed script, then repeats `then` forever
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    then: Reply,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Reply>, then: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            then,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new(Vec::new(), reply)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_status(&self, _call_id: &CallId) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.then.clone())
    }
}

/// Answers `before` until request number `gate_at`, which blocks until
/// `release()` and then answers `gated`
pub struct GatedSource {
    calls: watch::Sender<usize>,
    gate_at: usize,
    gate: Notify,
    before: Reply,
    gated: Reply,
}

impl GatedSource {
    pub fn new(gate_at: usize, before: Reply, gated: Reply) -> Arc<Self> {
        let (calls, _) = watch::channel(0);
        Arc::new(Self {
            calls,
            gate_at,
            gate: Notify::new(),
            before,
            gated,
        })
    }

    /// Wait until at least `n` requests have been issued
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        rx.wait_for(|calls| *calls >= n).await.unwrap();
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

#[async_trait]
impl StatusSource for GatedSource {
    fn name(&self) -> &str {
        "gated"
    }

    async fn fetch_status(&self, _call_id: &CallId) -> Reply {
        let mut call = 0;
        self.calls.send_modify(|calls| {
            *calls += 1;
            call = *calls;
        });

        if call == self.gate_at {
            self.gate.notified().await;
            return self.gated.clone();
        }
        self.before.clone()
    }
}
