//! Scripted completion backends and planner wiring shared by the core
//! integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use creatorflow_core::clock::FixedClock;
use creatorflow_core::generate::{
    CompletionBackend, CompletionRequest, GenerationError, ScheduleGenerator,
};
use creatorflow_core::orchestrator::SchedulerOrchestrator;
use creatorflow_core::state::AppState;
use creatorflow_store::MemoryStore;
use creatorflow_test_utils::fixed_now;

/// Answers every request with the same text and records the prompts.
pub struct ScriptedBackend {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(answer: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(self.answer.clone())
    }
}

/// Always fails with the given error.
pub struct FailingBackend(pub GenerationError);

#[async_trait]
impl CompletionBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerationError> {
        Err(self.0.clone())
    }
}

/// Blocks inside `complete` until released, then answers.
pub struct GatedBackend {
    answer: String,
    entered: Notify,
    release: Notify,
}

impl GatedBackend {
    pub fn new(answer: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.into(),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    /// Wait until a request is parked inside the backend.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl CompletionBackend for GatedBackend {
    fn name(&self) -> &str {
        "gated"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerationError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.answer.clone())
    }
}

/// One generated element in the wire shape the model returns.
pub fn element(product_id: &str, title: &str, channel: &str, start: &str) -> Value {
    json!({
        "productId": product_id,
        "title": title,
        "channel": channel,
        "startTime": start,
        "duration": 45,
        "priority": "High",
        "notes": format!("Kịch bản chi tiết cho {title}")
    })
}

/// A fresh in-memory state (seeded channels) and its store.
pub fn fresh_state() -> (Arc<tokio::sync::Mutex<AppState>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let state = AppState::load(store.clone(), Arc::new(FixedClock(fixed_now())))
        .expect("state loads from an empty store");
    (Arc::new(tokio::sync::Mutex::new(state)), store)
}

pub fn orchestrator(
    backend: Arc<dyn CompletionBackend>,
    state: Arc<tokio::sync::Mutex<AppState>>,
) -> SchedulerOrchestrator {
    SchedulerOrchestrator::new(
        ScheduleGenerator::new(backend),
        state,
        Arc::new(FixedClock(fixed_now())),
    )
}
