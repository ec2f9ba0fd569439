//! In-process inference client for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use gg_domain::error::{Error, Result};
use gg_providers::{GenerateRequest, GenerateResponse, InferenceClient};

/// What the next `generate` call does.
pub enum Step {
    Reply(String),
    Fail(Error),
    /// Wait for the sender to fire (or drop), then reply.
    Gated(oneshot::Receiver<()>, String),
}

impl Step {
    pub fn reply(text: &str) -> Self {
        Step::Reply(text.into())
    }

    pub fn fail(err: Error) -> Self {
        Step::Fail(err)
    }

    pub fn gated(text: &str) -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Step::Gated(rx, text.into()))
    }
}

/// Records every request and answers from a script. Once the script runs
/// out it replies `"reply N"`, counting calls from 1.
#[derive(Default)]
pub struct MockClient {
    calls: Mutex<Vec<GenerateRequest>>,
    script: Mutex<VecDeque<Step>>,
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(steps.into()),
        })
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl InferenceClient for MockClient {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let n = {
            let mut calls = self.calls.lock();
            calls.push(req.clone());
            calls.len()
        };
        let step = self.script.lock().pop_front();
        let text = match step {
            Some(Step::Reply(text)) => text,
            Some(Step::Fail(err)) => return Err(err),
            Some(Step::Gated(gate, text)) => {
                let _ = gate.await;
                text
            }
            None => format!("reply {n}"),
        };
        Ok(GenerateResponse {
            text,
            model: req.model.clone().unwrap_or_else(|| "mock".into()),
            finish_reason: Some("stop".into()),
            usage: None,
        })
    }

    fn provider_id(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock"
    }
}
